//! Materializes a chapter plan as one folder of screenshots per chapter.

use anyhow::{Context, Result};
use std::path::Path;

use super::ranges::{segment, ChapterPlan, MissingMarkerPolicy};
use crate::storage::{list_images, ArtifactStore};

/// What `divide_screenshots` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionSummary {
    /// Chapter folders created (empty chapters are not materialized)
    pub chapters: usize,
    /// Screenshots copied across all chapter folders
    pub files_copied: usize,
    /// Screenshots before the first resolved marker
    pub unassigned: usize,
}

/// Segments the screenshots in `screenshots_dir` by the markers in
/// `markers_dir` and copies each chapter into `chapters_dir/NN`.
///
/// Previous chapter folders are removed first. Source screenshots are
/// never modified.
pub fn divide_screenshots(
    store: &dyn ArtifactStore,
    screenshots_dir: &Path,
    markers_dir: &Path,
    chapters_dir: &Path,
    policy: MissingMarkerPolicy,
) -> Result<DivisionSummary> {
    let all_files = list_images(store, screenshots_dir)
        .with_context(|| format!("Failed to list '{}'", screenshots_dir.display()))?;
    let markers = list_images(store, markers_dir)
        .with_context(|| format!("Failed to list '{}'", markers_dir.display()))?;

    crate::log(&format!(
        "Found {} screenshots and {} chapter markers.",
        all_files.len(),
        markers.len()
    ));

    let plan = segment(&all_files, &markers, policy)?;
    for warning in &plan.warnings {
        crate::log(&format!("Warning: {}", warning));
    }

    let unassigned = plan.unassigned_leading();
    if unassigned > 0 && !plan.chapters.is_empty() {
        crate::log(&format!(
            "Note: {} screenshot(s) before the first chapter marker are not part of any chapter.",
            unassigned
        ));
    }

    let removed = store
        .clear_dirs(chapters_dir)
        .with_context(|| format!("Failed to clear '{}'", chapters_dir.display()))?;
    if removed > 0 {
        crate::log(&format!(
            "Removed {} previous chapter folder(s) from '{}'.",
            removed,
            chapters_dir.display()
        ));
    }

    materialize(store, &plan, screenshots_dir, chapters_dir)
        .map(|(chapters, files_copied)| DivisionSummary {
            chapters,
            files_copied,
            unassigned,
        })
}

fn materialize(
    store: &dyn ArtifactStore,
    plan: &ChapterPlan,
    screenshots_dir: &Path,
    chapters_dir: &Path,
) -> Result<(usize, usize)> {
    let mut chapters = 0;
    let mut files_copied = 0;

    for chapter in &plan.chapters {
        if chapter.is_empty() {
            continue;
        }
        let chapter_dir = chapters_dir.join(chapter.dir_name());
        let files = plan.chapter_files(chapter);

        crate::log(&format!(
            "Creating chapter {}: copying {} files...",
            chapter.dir_name(),
            files.len()
        ));
        store
            .ensure_dir(&chapter_dir)
            .with_context(|| format!("Failed to create '{}'", chapter_dir.display()))?;

        for name in files {
            store
                .copy(screenshots_dir, name, &chapter_dir)
                .with_context(|| {
                    format!("Failed to copy {} into '{}'", name, chapter_dir.display())
                })?;
        }

        chapters += 1;
        files_copied += files.len();
    }

    Ok((chapters, files_copied))
}
