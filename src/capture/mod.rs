//! Screen capture for the reader window.
//!
//! This module provides:
//! - Screen region capture (`DesktopCapturer`)
//! - The page-by-page acquisition loop (`ScreenshotAcquirer`)

pub mod acquirer;
pub mod screenshot;

pub use acquirer::ScreenshotAcquirer;
pub use screenshot::{DesktopCapturer, ScreenCapturer};
