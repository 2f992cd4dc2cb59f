//! Per-chapter text extraction.
//!
//! Every image of a chapter folder is read in name order and contributes one
//! newline-terminated segment to the chapter text, even when OCR fails for it.

use anyhow::{Context, Result};
use std::path::Path;

use super::engine::OcrEngine;
use crate::storage::{list_images, ArtifactStore};

/// Text extracted from one chapter folder.
#[derive(Debug, Clone)]
pub struct ChapterText {
    /// Chapter folder name, e.g. "01"
    pub chapter: String,
    pub text: String,
    /// Images read (including failed ones)
    pub images: usize,
    /// Images whose segment is empty because reading or OCR failed
    pub failed: usize,
}

impl ChapterText {
    /// Name of the text artifact for this chapter.
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.chapter)
    }

    /// True if no image produced any text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub struct TextExtractor<'a> {
    engine: &'a dyn OcrEngine,
    store: &'a dyn ArtifactStore,
}

impl<'a> TextExtractor<'a> {
    pub fn new(engine: &'a dyn OcrEngine, store: &'a dyn ArtifactStore) -> Self {
        Self { engine, store }
    }

    /// Runs OCR over every image in `chapter_dir`.
    ///
    /// Only listing the folder can fail; per-image errors are logged and
    /// yield an empty segment.
    pub fn extract(&self, chapter_dir: &Path) -> Result<ChapterText> {
        let chapter = chapter_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let images = list_images(self.store, chapter_dir)
            .with_context(|| format!("Failed to list '{}'", chapter_dir.display()))?;

        crate::log(&format!(
            "Processing chapter {} ({} images)...",
            chapter,
            images.len()
        ));

        let mut text = String::new();
        let mut failed = 0;

        for name in &images {
            match self.read_image(chapter_dir, name) {
                Ok(segment) => text.push_str(&segment),
                Err(e) => {
                    crate::log(&format!("Warning: OCR failed for {}: {:#}", name, e));
                    failed += 1;
                }
            }
            text.push('\n');
        }

        Ok(ChapterText {
            chapter,
            text,
            images: images.len(),
            failed,
        })
    }

    fn read_image(&self, chapter_dir: &Path, name: &str) -> Result<String> {
        let bytes = self.store.read(chapter_dir, name)?;
        let detections = self.engine.read_text(name, &bytes)?;
        let words: Vec<&str> = detections.iter().map(|d| d.text.as_str()).collect();
        Ok(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::{BoundingBox, Detection};
    use crate::storage::memory::MemoryStore;
    use anyhow::anyhow;
    use std::cell::RefCell;

    /// Treats image bytes as "line|line|..." and fails on "ERR".
    struct FakeEngine {
        calls: RefCell<Vec<String>>,
    }

    impl FakeEngine {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl OcrEngine for FakeEngine {
        fn read_text(&self, name: &str, image: &[u8]) -> Result<Vec<Detection>> {
            self.calls.borrow_mut().push(name.to_string());
            let content = String::from_utf8_lossy(image);
            if content == "ERR" {
                return Err(anyhow!("engine rejected image"));
            }
            Ok(content
                .split('|')
                .filter(|s| !s.is_empty())
                .map(|s| Detection {
                    region: BoundingBox {
                        left: 0,
                        top: 0,
                        width: 1,
                        height: 1,
                    },
                    text: s.to_string(),
                    confidence: 0.9,
                })
                .collect())
        }
    }

    #[test]
    fn test_images_are_read_in_name_order() {
        let store = MemoryStore::new();
        let dir = Path::new("chapters/01");
        store.write(dir, "page_0002.png", b"world").unwrap();
        store.write(dir, "page_0001.png", b"Hello|there").unwrap();
        let engine = FakeEngine::new();

        let result = TextExtractor::new(&engine, &store).extract(dir).unwrap();

        assert_eq!(result.chapter, "01");
        assert_eq!(result.file_name(), "01.txt");
        assert_eq!(result.text, "Hello there\nworld\n");
        assert_eq!(result.images, 2);
        assert_eq!(result.failed, 0);
        assert_eq!(
            *engine.calls.borrow(),
            vec!["page_0001.png", "page_0002.png"]
        );
    }

    #[test]
    fn test_failed_image_keeps_its_segment() {
        let store = MemoryStore::new();
        let dir = Path::new("chapters/02");
        store.write(dir, "a.png", b"one").unwrap();
        store.write(dir, "b.png", b"ERR").unwrap();
        store.write(dir, "c.png", b"three").unwrap();
        let engine = FakeEngine::new();

        let result = TextExtractor::new(&engine, &store).extract(dir).unwrap();

        assert_eq!(result.text, "one\n\nthree\n");
        assert_eq!(result.text.matches('\n').count(), 3);
        assert_eq!(result.failed, 1);
    }

    #[test]
    fn test_non_images_are_skipped() {
        let store = MemoryStore::new();
        let dir = Path::new("chapters/01");
        store.write(dir, "page.JPG", b"text").unwrap();
        store.write(dir, "notes.txt", b"ignored").unwrap();
        let engine = FakeEngine::new();

        let result = TextExtractor::new(&engine, &store).extract(dir).unwrap();

        assert_eq!(result.text, "text\n");
        assert_eq!(*engine.calls.borrow(), vec!["page.JPG"]);
    }

    #[test]
    fn test_image_without_text_is_blank() {
        let store = MemoryStore::new();
        let dir = Path::new("chapters/03");
        store.write(dir, "page.png", b"").unwrap();
        let engine = FakeEngine::new();

        let result = TextExtractor::new(&engine, &store).extract(dir).unwrap();

        assert_eq!(result.text, "\n");
        assert!(result.is_blank());
    }
}
