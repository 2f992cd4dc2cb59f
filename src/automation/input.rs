//! Mouse input for driving the desktop reader.
//!
//! Clicks are simulated with SendInput (hardware-level input, moves the real
//! cursor). Calibration clicks are observed by polling the left button state
//! and the cursor position. Both are Windows-only; other platforms get an
//! error when a stage needs them.

use anyhow::Result;
use std::time::Duration;

use crate::calibration::{ClickSource, Coordinate};

/// How often the click listener samples the mouse button.
const POLL_INTERVAL: Duration = Duration::from_millis(15);

/// Something that can click at a screen position, e.g. the next-page button.
pub trait PageTurner {
    fn click_at(&mut self, point: Coordinate) -> Result<()>;
}

/// The local mouse.
#[derive(Default)]
pub struct DesktopMouse {
    /// Whether the left button was down at the previous sample.
    button_was_down: bool,
}

impl DesktopMouse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageTurner for DesktopMouse {
    fn click_at(&mut self, point: Coordinate) -> Result<()> {
        platform::send_click(point.x, point.y)
    }
}

impl ClickSource for DesktopMouse {
    fn next_click(&mut self) -> Result<Coordinate> {
        loop {
            let down = platform::left_button_down()?;
            // report on the press edge only, so a held button counts once
            if down && !self.button_was_down {
                self.button_was_down = true;
                let (x, y) = platform::cursor_position()?;
                return Ok(Coordinate { x, y });
            }
            self.button_was_down = down;
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(windows)]
mod platform {
    use anyhow::Result;
    use windows::Win32::Foundation::POINT;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE,
        MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSE_EVENT_FLAGS, MOUSEINPUT,
        VK_LBUTTON,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetCursorPos, GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN,
    };

    /// Gets the current cursor position in screen coordinates.
    pub fn cursor_position() -> Result<(i32, i32)> {
        let mut pt = POINT::default();
        unsafe {
            GetCursorPos(&mut pt)?;
        }
        Ok((pt.x, pt.y))
    }

    pub fn left_button_down() -> Result<bool> {
        let state = unsafe { GetAsyncKeyState(VK_LBUTTON.0 as i32) };
        Ok((state as u16) & 0x8000 != 0)
    }

    fn mouse_input(norm_x: i32, norm_y: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: norm_x,
                    dy: norm_y,
                    dwFlags: flags | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
                    ..Default::default()
                },
            },
        }
    }

    /// Moves the cursor to the screen position and sends a left click.
    pub fn send_click(x: i32, y: i32) -> Result<()> {
        // Normalize to 0-65535 range (required by MOUSEEVENTF_ABSOLUTE)
        let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        let norm_x = ((x as i64 * 65535) / screen_width.max(1) as i64) as i32;
        let norm_y = ((y as i64 * 65535) / screen_height.max(1) as i64) as i32;

        let size = std::mem::size_of::<INPUT>() as i32;
        unsafe {
            SendInput(&[mouse_input(norm_x, norm_y, MOUSE_EVENT_FLAGS(0))], size);
            std::thread::sleep(std::time::Duration::from_millis(100));
            SendInput(&[mouse_input(norm_x, norm_y, MOUSEEVENTF_LEFTDOWN)], size);
            std::thread::sleep(std::time::Duration::from_millis(50));
            SendInput(&[mouse_input(norm_x, norm_y, MOUSEEVENTF_LEFTUP)], size);
        }

        crate::log(&format!("Clicked at ({}, {})", x, y));
        Ok(())
    }
}

#[cfg(not(windows))]
mod platform {
    use anyhow::{bail, Result};

    pub fn cursor_position() -> Result<(i32, i32)> {
        bail!("Reading the cursor position is only supported on Windows")
    }

    pub fn left_button_down() -> Result<bool> {
        bail!("Listening for mouse clicks is only supported on Windows")
    }

    pub fn send_click(x: i32, y: i32) -> Result<()> {
        bail!(
            "Simulating a click at ({}, {}) is only supported on Windows",
            x,
            y
        )
    }
}
