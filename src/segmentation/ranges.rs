//! Chapter boundary computation.
//!
//! Each marker is the file name of the screenshot that opens a chapter. The
//! screenshots are sorted by name, every marker is located in that sequence,
//! and chapter `i` runs from its marker up to (not including) the start of the
//! following chapter. The last chapter runs to the end of the sequence.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("no chapter markers were provided")]
    NoMarkers,
}

/// Where a chapter ends when the marker right after it is missing from the
/// screenshot sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMarkerPolicy {
    /// End at the next marker that does exist, or at the end of the sequence.
    #[default]
    NextResolvable,
    /// End at the end of the sequence, absorbing every later chapter.
    RunToEnd,
}

/// A half-open slice `[start, end)` of the sorted screenshot sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterRange {
    /// 1-based position of the chapter's marker among the sorted markers.
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
}

impl ChapterRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Directory name for this chapter: the ordinal zero-padded to 2 digits.
    pub fn dir_name(&self) -> String {
        format!("{:02}", self.ordinal)
    }
}

/// Non-fatal findings from segmentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentWarning {
    /// The marker does not name any screenshot; its chapter is dropped.
    MarkerNotFound { ordinal: usize, marker: String },
    /// The marker after this chapter is missing, so the chapter runs to the
    /// end of the sequence (`RunToEnd` only).
    RunsToEnd { ordinal: usize, next_marker: String },
    /// The chapter contains no screenshots.
    EmptyChapter { ordinal: usize },
}

impl fmt::Display for SegmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerNotFound { ordinal, marker } => write!(
                f,
                "Marker '{}' (chapter {:02}) not found in screenshots. Skipping.",
                marker, ordinal
            ),
            Self::RunsToEnd {
                ordinal,
                next_marker,
            } => write!(
                f,
                "Next marker '{}' not found. Chapter {:02} will run to the end.",
                next_marker, ordinal
            ),
            Self::EmptyChapter { ordinal } => {
                write!(f, "Chapter {:02} contains no screenshots.", ordinal)
            }
        }
    }
}

/// Result of segmenting a screenshot sequence.
#[derive(Clone, Debug)]
pub struct ChapterPlan {
    /// All screenshot names, sorted ascending. Ranges index into this.
    pub files: Vec<String>,
    /// One range per resolved marker, in marker order.
    pub chapters: Vec<ChapterRange>,
    pub warnings: Vec<SegmentWarning>,
}

impl ChapterPlan {
    /// The screenshot names belonging to `chapter`.
    pub fn chapter_files(&self, chapter: &ChapterRange) -> &[String] {
        &self.files[chapter.start..chapter.end]
    }

    /// Number of screenshots before the first chapter (front matter that
    /// belongs to no chapter).
    pub fn unassigned_leading(&self) -> usize {
        self.chapters
            .first()
            .map(|c| c.start)
            .unwrap_or(self.files.len())
    }
}

/// Computes chapter ranges over `all_files` from `markers`.
///
/// Both inputs are sorted here; callers may pass them in any order.
pub fn segment(
    all_files: &[String],
    markers: &[String],
    policy: MissingMarkerPolicy,
) -> Result<ChapterPlan, SegmentError> {
    if markers.is_empty() {
        return Err(SegmentError::NoMarkers);
    }

    let mut files = all_files.to_vec();
    files.sort();
    let mut markers = markers.to_vec();
    markers.sort();

    // file names are unique, so binary search finds the one exact match
    let positions: Vec<Option<usize>> = markers
        .iter()
        .map(|m| files.binary_search(m).ok())
        .collect();

    let mut chapters = Vec::new();
    let mut warnings = Vec::new();

    for (i, marker) in markers.iter().enumerate() {
        let ordinal = i + 1;

        let Some(start) = positions[i] else {
            warnings.push(SegmentWarning::MarkerNotFound {
                ordinal,
                marker: marker.clone(),
            });
            continue;
        };

        let end = match policy {
            MissingMarkerPolicy::NextResolvable => positions[i + 1..]
                .iter()
                .flatten()
                .next()
                .copied()
                .unwrap_or(files.len()),
            MissingMarkerPolicy::RunToEnd => match positions.get(i + 1) {
                Some(Some(next)) => *next,
                Some(None) => {
                    warnings.push(SegmentWarning::RunsToEnd {
                        ordinal,
                        next_marker: markers[i + 1].clone(),
                    });
                    files.len()
                }
                None => files.len(),
            },
        };

        let range = ChapterRange {
            ordinal,
            start,
            end: end.max(start),
        };
        if range.is_empty() {
            warnings.push(SegmentWarning::EmptyChapter { ordinal });
        }
        chapters.push(range);
    }

    Ok(ChapterPlan {
        files,
        chapters,
        warnings,
    })
}
