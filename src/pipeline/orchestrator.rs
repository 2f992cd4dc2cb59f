//! Runs the pipeline stages.
//!
//! Each stage checks its inputs first. A missing input is reported with the
//! stage to run before it and yields [`StageOutcome::Skipped`]; configuration
//! problems (bad coordinate file, missing API key, no OCR engine) are errors.
//! The filesystem is the only thing stages share: every stage reads what an
//! earlier stage wrote, so any stage can be re-run on its own.

use anyhow::{Context, Result};

use super::config::{CorrectionConfig, OcrConfig, PipelineConfig};
use super::operator::Operator;
use super::stage::{Stage, StageOutcome, Step};
use crate::automation::{DesktopMouse, PageTurner};
use crate::calibration::{run_wizard, ClickSource, CoordsError, RegionConfig};
use crate::capture::{DesktopCapturer, ScreenCapturer, ScreenshotAcquirer};
use crate::correction::{CorrectionService, GeminiClient, TextCorrector};
use crate::ocr::{OcrEngine, TesseractEngine, TextExtractor};
use crate::segmentation::divide_screenshots;
use crate::storage::{list_images, list_with_extension, ArtifactStore};

/// Factory for the external collaborators, built only when a stage needs one.
pub trait Collaborators {
    fn click_source(&mut self) -> Result<Box<dyn ClickSource>>;
    fn screen_capturer(&mut self) -> Result<Box<dyn ScreenCapturer>>;
    fn page_turner(&mut self) -> Result<Box<dyn PageTurner>>;
    fn ocr_engine(&mut self, settings: &OcrConfig) -> Result<Box<dyn OcrEngine>>;
    fn correction_service(
        &mut self,
        settings: &CorrectionConfig,
    ) -> Result<Box<dyn CorrectionService>>;
}

/// Local mouse and screen, Tesseract and Gemini.
pub struct DesktopCollaborators;

impl Collaborators for DesktopCollaborators {
    fn click_source(&mut self) -> Result<Box<dyn ClickSource>> {
        Ok(Box::new(DesktopMouse::new()))
    }

    fn screen_capturer(&mut self) -> Result<Box<dyn ScreenCapturer>> {
        Ok(Box::new(DesktopCapturer::new()))
    }

    fn page_turner(&mut self) -> Result<Box<dyn PageTurner>> {
        Ok(Box::new(DesktopMouse::new()))
    }

    fn ocr_engine(&mut self, settings: &OcrConfig) -> Result<Box<dyn OcrEngine>> {
        Ok(Box::new(TesseractEngine::new(settings)?))
    }

    fn correction_service(
        &mut self,
        settings: &CorrectionConfig,
    ) -> Result<Box<dyn CorrectionService>> {
        Ok(Box::new(GeminiClient::from_env(settings)?))
    }
}

pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    store: &'a dyn ArtifactStore,
    operator: &'a mut dyn Operator,
    collaborators: &'a mut dyn Collaborators,
    page_count: Option<u32>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        store: &'a dyn ArtifactStore,
        operator: &'a mut dyn Operator,
        collaborators: &'a mut dyn Collaborators,
    ) -> Self {
        Self {
            config,
            store,
            operator,
            collaborators,
            page_count: None,
        }
    }

    /// Page count for the capture stage; when `None` the operator is asked.
    pub fn with_page_count(mut self, page_count: Option<u32>) -> Self {
        self.page_count = page_count;
        self
    }

    /// Runs the stages of `step` in order, stopping at the first skipped one.
    pub fn run(&mut self, step: Step) -> Result<Vec<(Stage, StageOutcome)>> {
        let mut outcomes = Vec::new();

        for &stage in step.stages() {
            crate::log("");
            crate::log(&format!("--- {} ---", stage.title()));

            let outcome = self
                .run_stage(stage)
                .with_context(|| format!("Stage '{}' failed", stage))?;

            let skipped = outcome.is_skipped();
            if let StageOutcome::Skipped { reason } = &outcome {
                crate::log(&format!("Skipped '{}': {}", stage, reason));
            }
            outcomes.push((stage, outcome));

            if skipped {
                if step == Step::All {
                    crate::log(&format!(
                        "Pipeline stopped. Resume with: book-scanner {}",
                        stage
                    ));
                }
                break;
            }
        }

        Ok(outcomes)
    }

    pub fn run_stage(&mut self, stage: Stage) -> Result<StageOutcome> {
        match stage {
            Stage::Configure => self.configure(),
            Stage::Capture => self.capture(),
            Stage::Divide => self.divide(),
            Stage::Ocr => self.ocr(),
            Stage::Correct => self.correct(),
        }
    }

    fn configure(&mut self) -> Result<StageOutcome> {
        let config = self.config;
        let dirs = &config.dirs;
        if self.store.file_exists(&dirs.config, &dirs.coords_file) {
            let question = format!(
                "Coordinates already exist at '{}'. Recalibrate?",
                dirs.coords_path().display()
            );
            if !self.operator.confirm(&question, false) {
                crate::log("Keeping the existing coordinates.");
                return Ok(StageOutcome::Completed { artifacts: 0 });
            }
        }

        self.calibrate()?;
        Ok(StageOutcome::Completed { artifacts: 1 })
    }

    /// Runs the click wizard and saves the result.
    fn calibrate(&mut self) -> Result<RegionConfig> {
        let config = self.config;
        let dirs = &config.dirs;
        let mut source = self.collaborators.click_source()?;
        let region_config = run_wizard(source.as_mut())?;

        region_config
            .save(self.store, &dirs.config, &dirs.coords_file)
            .with_context(|| format!("Failed to save '{}'", dirs.coords_path().display()))?;
        crate::log(&format!(
            "Coordinates saved to '{}'.",
            dirs.coords_path().display()
        ));

        Ok(region_config)
    }

    fn capture(&mut self) -> Result<StageOutcome> {
        let config = self.config;
        let dirs = &config.dirs;

        let region_config = match RegionConfig::load(self.store, &dirs.config, &dirs.coords_file) {
            Ok(loaded) => loaded,
            Err(CoordsError::MissingFile(path)) => {
                crate::log(&format!("Coordinates file not found at '{}'.", path.display()));
                if !self
                    .operator
                    .confirm("Would you like to run the mouse configuration now?", true)
                {
                    return Ok(StageOutcome::skipped(
                        "no coordinates file. Run 'configure' first.",
                    ));
                }
                self.calibrate()?
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Invalid coordinates file '{}'. Run 'configure' to recreate it",
                        dirs.coords_path().display()
                    )
                });
            }
        };

        let Some(page_count) = self.page_count.or_else(|| self.operator.ask_page_count()) else {
            return Ok(StageOutcome::skipped("screenshot capture cancelled by user."));
        };

        let layout = region_config.derive_regions();
        crate::log(&format!("Left column: {}", layout.left_column));
        crate::log(&format!("Right column: {}", layout.right_column));
        crate::log(&format!("Next page button: {}", layout.next_button));

        let mut capturer = self.collaborators.screen_capturer()?;
        let mut turner = self.collaborators.page_turner()?;

        let switch_delay = config.capture.switch_delay();
        crate::log(&format!(
            "You have {} seconds to switch to your reader window...",
            switch_delay.as_secs()
        ));
        std::thread::sleep(switch_delay);

        let written = ScreenshotAcquirer::new(
            capturer.as_mut(),
            turner.as_mut(),
            self.store,
            &config.capture,
        )
        .capture(&layout, page_count, &dirs.screenshots)?;

        crate::log(&format!(
            "Captured {} screenshots. Next step: divide screenshots by chapter.",
            written
        ));
        Ok(StageOutcome::Completed { artifacts: written })
    }

    fn divide(&mut self) -> Result<StageOutcome> {
        let config = self.config;
        let dirs = &config.dirs;

        self.store.ensure_dir(&dirs.chapter_markers)?;
        crate::log(&format!(
            "Please copy the first screenshot of each chapter into the '{}' folder.",
            dirs.chapter_markers.display()
        ));
        self.operator
            .wait_for_user("Continue once you have placed the marker files.");

        if list_images(self.store, &dirs.screenshots)?.is_empty() {
            return Ok(StageOutcome::skipped(format!(
                "no screenshots found in '{}'. Run 'capture' first.",
                dirs.screenshots.display()
            )));
        }
        if list_images(self.store, &dirs.chapter_markers)?.is_empty() {
            return Ok(StageOutcome::skipped(format!(
                "no marker files found in '{}'. Copy the first screenshot of each chapter there and run 'divide' again.",
                dirs.chapter_markers.display()
            )));
        }

        let summary = divide_screenshots(
            self.store,
            &dirs.screenshots,
            &dirs.chapter_markers,
            &dirs.chapters,
            config.segmentation.missing_marker_policy,
        )?;

        crate::log(&format!(
            "Chapter division complete: {} chapters, {} files. Next step: perform OCR.",
            summary.chapters, summary.files_copied
        ));
        Ok(StageOutcome::Completed {
            artifacts: summary.chapters,
        })
    }

    fn ocr(&mut self) -> Result<StageOutcome> {
        let config = self.config;
        let dirs = &config.dirs;

        let chapters = if self.store.dir_exists(&dirs.chapters) {
            self.store.list_dirs(&dirs.chapters)?
        } else {
            Vec::new()
        };
        if chapters.is_empty() {
            return Ok(StageOutcome::skipped(format!(
                "chapters directory '{}' is empty or does not exist. Run 'divide' first.",
                dirs.chapters.display()
            )));
        }

        let engine = self
            .collaborators
            .ocr_engine(&config.ocr)
            .context("OCR engine is not available")?;

        self.store
            .clear_files(&dirs.ocr_output)
            .with_context(|| format!("Failed to clear '{}'", dirs.ocr_output.display()))?;

        let extractor = TextExtractor::new(engine.as_ref(), self.store);
        let mut written = 0;

        for chapter in &chapters {
            let result = extractor.extract(&dirs.chapters.join(chapter))?;
            if result.is_blank() {
                crate::log(&format!(
                    "Warning: no text recognized in chapter {}.",
                    result.chapter
                ));
            }
            if result.failed > 0 {
                crate::log(&format!(
                    "Warning: {} of {} images in chapter {} could not be read.",
                    result.failed, result.images, result.chapter
                ));
            }

            let name = result.file_name();
            self.store
                .write(&dirs.ocr_output, &name, result.text.as_bytes())
                .with_context(|| format!("Failed to write {}", name))?;
            crate::log(&format!(
                "  - Saved OCR text to {}",
                dirs.ocr_output.join(&name).display()
            ));
            written += 1;
        }

        crate::log("OCR processing complete. Next step: correct text with AI.");
        Ok(StageOutcome::Completed { artifacts: written })
    }

    fn correct(&mut self) -> Result<StageOutcome> {
        let config = self.config;
        let dirs = &config.dirs;
        let settings = &config.correction;

        let service = self.collaborators.correction_service(settings)?;

        let inputs = list_with_extension(self.store, &dirs.ocr_output, "txt")?;
        if inputs.is_empty() {
            return Ok(StageOutcome::skipped(format!(
                "OCR output directory '{}' is empty. Run 'ocr' first.",
                dirs.ocr_output.display()
            )));
        }

        self.store
            .clear_files(&dirs.final_text)
            .with_context(|| format!("Failed to clear '{}'", dirs.final_text.display()))?;

        let corrector = TextCorrector::new(service.as_ref(), &settings.prompt_template);
        let mut failed = 0;

        for name in &inputs {
            crate::log(&format!("Processing: {}", name));
            let bytes = self
                .store
                .read(&dirs.ocr_output, name)
                .with_context(|| format!("Failed to read {}", name))?;
            let text = String::from_utf8_lossy(&bytes);

            let result = corrector.correct(&text);
            if !result.corrected {
                failed += 1;
            }

            self.store
                .write(&dirs.final_text, name, result.text.as_bytes())
                .with_context(|| format!("Failed to write {}", name))?;
            crate::log(&format!(
                "  - Saved corrected text to {}",
                dirs.final_text.join(name).display()
            ));
        }

        if failed > 0 {
            crate::log(&format!(
                "Warning: {} of {} chapters could not be corrected and keep their OCR text.",
                failed,
                inputs.len()
            ));
        }
        crate::log("AI correction process complete.");
        Ok(StageOutcome::Completed {
            artifacts: inputs.len(),
        })
    }
}
