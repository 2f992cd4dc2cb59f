//! Screenshot acquisition loop.
//!
//! For every page: capture the left column, capture the right column, then
//! (unless it is the last page) click "next page" and wait for the reader to
//! settle. Files are numbered sequentially so that sorting names by byte
//! order reproduces capture order.

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::automation::PageTurner;
use crate::calibration::{CaptureLayout, Region};
use crate::capture::screenshot::ScreenCapturer;
use crate::pipeline::config::CaptureConfig;
use crate::storage::ArtifactStore;

/// Extension of the files the acquirer writes.
const SCREENSHOT_EXTENSION: &str = "png";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("page count must be at least 1, got {0}")]
    InvalidPageCount(u32),
}

/// Number of digits used for sequence numbers when `total` files are written.
pub fn sequence_width(total: usize, min_digits: usize) -> usize {
    total.to_string().len().max(min_digits)
}

/// File name for sequence number `seq` (1-based).
pub fn screenshot_name(prefix: &str, seq: usize, width: usize) -> String {
    format!("{}{:0width$}.{}", prefix, seq, SCREENSHOT_EXTENSION, width = width)
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Drives the capture/advance loop.
pub struct ScreenshotAcquirer<'a> {
    capturer: &'a mut dyn ScreenCapturer,
    turner: &'a mut dyn PageTurner,
    store: &'a dyn ArtifactStore,
    prefix: &'a str,
    min_digits: usize,
    settle_delay: Duration,
}

impl<'a> ScreenshotAcquirer<'a> {
    pub fn new(
        capturer: &'a mut dyn ScreenCapturer,
        turner: &'a mut dyn PageTurner,
        store: &'a dyn ArtifactStore,
        settings: &'a CaptureConfig,
    ) -> Self {
        Self {
            capturer,
            turner,
            store,
            prefix: &settings.file_prefix,
            min_digits: settings.min_sequence_digits,
            settle_delay: settings.settle_delay(),
        }
    }

    /// Clears `output_dir`, captures `page_count` pages and returns the
    /// number of files written (two per page).
    ///
    /// A collaborator failure stops the loop; files already written stay.
    pub fn capture(
        &mut self,
        layout: &CaptureLayout,
        page_count: u32,
        output_dir: &Path,
    ) -> Result<usize> {
        if page_count == 0 {
            return Err(CaptureError::InvalidPageCount(page_count).into());
        }

        crate::log(&format!("Clearing the '{}' directory...", output_dir.display()));
        let removed = self
            .store
            .clear_files(output_dir)
            .with_context(|| format!("Failed to clear '{}'", output_dir.display()))?;
        crate::log(&format!("Directory cleared ({} files removed).", removed));

        let total_files = page_count as usize * 2;
        let width = sequence_width(total_files, self.min_digits);
        let mut seq = 1;

        for page in 0..page_count {
            crate::log(&format!("Processing page {}/{}...", page + 1, page_count));

            for region in [layout.left_column, layout.right_column] {
                let name = screenshot_name(self.prefix, seq, width);
                self.save_region(region, output_dir, &name)?;
                crate::log(&format!("  - Saved {}", name));
                seq += 1;
            }

            if page + 1 < page_count {
                self.turner
                    .click_at(layout.next_button)
                    .with_context(|| format!("Failed to turn page after page {}", page + 1))?;
                std::thread::sleep(self.settle_delay);
            }
        }

        Ok(seq - 1)
    }

    fn save_region(&mut self, region: Region, output_dir: &Path, name: &str) -> Result<()> {
        let image = self
            .capturer
            .capture_region(region)
            .with_context(|| format!("Failed to capture {} for {}", region, name))?;
        let bytes = encode_png(&image)?;
        self.store
            .write(output_dir, name, &bytes)
            .with_context(|| format!("Failed to write {}", name))?;
        Ok(())
    }
}
