//! Pipeline configuration.
//!
//! Loaded from config.json at startup. Every field has a default, so a partial
//! file (or no file at all) is fine. The loaded value is passed explicitly to
//! each stage.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::segmentation::MissingMarkerPolicy;
use crate::storage::ArtifactStore;

/// Complete pipeline configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub dirs: DirConfig,
    pub capture: CaptureConfig,
    pub segmentation: SegmentationConfig,
    pub ocr: OcrConfig,
    pub correction: CorrectionConfig,
}

/// Directory layout, relative to the working directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DirConfig {
    /// Holds the coordinate file
    pub config: PathBuf,
    /// Name of the coordinate file inside `config`
    pub coords_file: String,
    /// Flat directory of numbered screenshots
    pub screenshots: PathBuf,
    /// User-populated copies of each chapter's first screenshot
    pub chapter_markers: PathBuf,
    /// One sub-directory per chapter
    pub chapters: PathBuf,
    /// One text file per chapter, straight from OCR
    pub ocr_output: PathBuf,
    /// One text file per chapter after correction
    pub final_text: PathBuf,
}

impl Default for DirConfig {
    fn default() -> Self {
        Self {
            config: PathBuf::from("config"),
            coords_file: "mouse_clicks.txt".to_string(),
            screenshots: PathBuf::from("screenshots"),
            chapter_markers: PathBuf::from("chapter_markers"),
            chapters: PathBuf::from("chapters"),
            ocr_output: PathBuf::from("ocr_output"),
            final_text: PathBuf::from("final_corrected_text"),
        }
    }
}

impl DirConfig {
    /// Path of the coordinate file, for messages.
    pub fn coords_path(&self) -> PathBuf {
        self.config.join(&self.coords_file)
    }

    /// Creates every pipeline directory that does not exist yet.
    pub fn create_all(&self, store: &dyn ArtifactStore) -> io::Result<()> {
        crate::log("Creating necessary directories...");
        for dir in [
            &self.config,
            &self.screenshots,
            &self.chapter_markers,
            &self.chapters,
            &self.ocr_output,
            &self.final_text,
        ] {
            store.ensure_dir(dir)?;
            crate::log(&format!("  - Directory '{}' is ready.", dir.display()));
        }
        Ok(())
    }
}

/// Screenshot loop timing and naming.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Wait after clicking "next page" before the next capture (milliseconds)
    pub settle_delay_ms: u64,
    /// Countdown before the first capture so the user can focus the reader (milliseconds)
    pub switch_delay_ms: u64,
    /// Screenshot file name prefix
    pub file_prefix: String,
    /// Minimum zero-padded width of the sequence number
    pub min_sequence_digits: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1500,
            switch_delay_ms: 5000,
            file_prefix: "page_".to_string(),
            min_sequence_digits: 4,
        }
    }
}

impl CaptureConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn switch_delay(&self) -> Duration {
        Duration::from_millis(self.switch_delay_ms)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// What a chapter's range ends at when the following marker is missing
    pub missing_marker_policy: MissingMarkerPolicy,
}

/// Tesseract settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. "eng" or "eng+por"
    pub language: String,
    /// Tesseract page segmentation mode
    pub page_segmentation_mode: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_segmentation_mode: 3,
        }
    }
}

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Correct the grammar, spelling, and punctuation of this OCR-extracted text. \
Organize it into coherent paragraphs and apply basic formatting. \
The output should only be the corrected text, with no additional commentary.\n\n\
\"\"\"{text}\"\"\"";

/// Text correction service settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Prompt sent for each chapter; `{text}` is replaced by the chapter text
    pub prompt_template: String,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-lite".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 120,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from `path`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        crate::log(&format!("Looking for config at: {}", path.display()));

        if !path.exists() {
            crate::log("Config file not found. Using default config.");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log(&format!("Config loaded from {}", path.display()));
                    config
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    ));
                    Self::default()
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
                Self::default()
            }
        }
    }
}
