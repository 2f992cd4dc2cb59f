//! Calibration of the reader layout.
//!
//! Records ten screen points by mouse click, derives the two column capture
//! regions and the navigation buttons, and persists them to the coordinate file.

pub mod coords;
pub mod state;
pub mod wizard;

pub use coords::{CaptureLayout, Coordinate, CoordsError, Region, RegionConfig};
pub use wizard::{run_wizard, ClickSource};
