//! Chapter segmentation.
//!
//! Splits the flat screenshot sequence into chapters using the marker files
//! the user copied into the chapter markers directory.

pub mod divide;
pub mod ranges;

pub use divide::divide_screenshots;
pub use ranges::MissingMarkerPolicy;
