//! Chapter text correction with a degraded fallback.

use super::gemini::CorrectionService;

/// First line of a final artifact whose correction failed.
pub const FAILURE_MARKER: &str = "### ERROR PROCESSING FILE ###";

/// Outcome for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedText {
    pub text: String,
    /// False when `text` is the original with the failure marker
    pub corrected: bool,
}

pub struct TextCorrector<'a> {
    service: &'a dyn CorrectionService,
    template: &'a str,
}

impl<'a> TextCorrector<'a> {
    /// `template` must contain `{text}`; if it does not, the chapter text is
    /// appended after it.
    pub fn new(service: &'a dyn CorrectionService, template: &'a str) -> Self {
        Self { service, template }
    }

    pub fn build_prompt(&self, chapter_text: &str) -> String {
        if self.template.contains("{text}") {
            self.template.replace("{text}", chapter_text)
        } else {
            format!("{}\n\n{}", self.template, chapter_text)
        }
    }

    /// Calls the service exactly once. Any failure yields the original text
    /// behind the failure marker.
    pub fn correct(&self, chapter_text: &str) -> CorrectedText {
        match self.service.correct(&self.build_prompt(chapter_text)) {
            Ok(text) => CorrectedText {
                text,
                corrected: true,
            },
            Err(e) => {
                crate::log(&format!("Warning: correction failed: {}", e));
                CorrectedText {
                    text: format!("{}\n\n{}", FAILURE_MARKER, chapter_text),
                    corrected: false,
                }
            }
        }
    }
}
