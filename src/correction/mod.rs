//! AI text correction for OCR output.

pub mod corrector;
pub mod gemini;

pub use corrector::TextCorrector;
pub use gemini::{CorrectionService, GeminiClient};
