//! Screen region capture using GDI.

use anyhow::Result;
use image::RgbaImage;

use crate::calibration::Region;

/// Grabs a rectangle of the screen as an RGBA image.
pub trait ScreenCapturer {
    fn capture_region(&mut self, region: Region) -> Result<RgbaImage>;
}

/// Captures from the primary desktop.
#[derive(Default)]
pub struct DesktopCapturer;

impl DesktopCapturer {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenCapturer for DesktopCapturer {
    fn capture_region(&mut self, region: Region) -> Result<RgbaImage> {
        if region.width == 0 || region.height == 0 {
            anyhow::bail!("Capture region {} is empty. Recalibrate the layout.", region);
        }
        platform::grab(region)
    }
}

#[cfg(windows)]
mod platform {
    use anyhow::{anyhow, Result};
    use image::{ImageBuffer, RgbaImage};
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
        SRCCOPY,
    };

    use crate::calibration::Region;

    /// Copies the region from the screen device context into a top-down
    /// 32-bit DIB, then converts BGRA to RGBA.
    pub fn grab(region: Region) -> Result<RgbaImage> {
        let width = region.width as i32;
        let height = region.height as i32;
        let mut buffer = vec![0u8; region.width as usize * region.height as usize * 4];

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC failed for the desktop"));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(
                mem_dc, 0, 0, width, height, screen_dc, region.left, region.top, SRCCOPY,
            );

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // negative height = top-down rows
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(buffer.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            blit?;
            if lines == 0 {
                return Err(anyhow!("GetDIBits returned no scan lines"));
            }
        }

        // BGRA -> RGBA
        for px in buffer.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }

        ImageBuffer::from_raw(region.width, region.height, buffer)
            .ok_or_else(|| anyhow!("Captured buffer does not match {}", region))
    }
}

#[cfg(not(windows))]
mod platform {
    use anyhow::{bail, Result};
    use image::RgbaImage;

    use crate::calibration::Region;

    pub fn grab(region: Region) -> Result<RgbaImage> {
        bail!(
            "Capturing screen region {} is only supported on Windows",
            region
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_region_is_rejected() {
        let mut capturer = DesktopCapturer::new();
        let err = capturer
            .capture_region(Region {
                left: 10,
                top: 10,
                width: 0,
                height: 50,
            })
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
