//! Desktop automation against the reader application.
//!
//! This module provides input simulation for turning pages and the click
//! listener used by calibration.

pub mod input;

pub use input::{DesktopMouse, PageTurner};
