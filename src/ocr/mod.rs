pub mod engine;
pub mod extract;
pub mod setup;

pub use engine::{OcrEngine, TesseractEngine};
pub use extract::TextExtractor;
