use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::ensure_tesseract;
use crate::pipeline::config::OcrConfig;

/// Pixel rectangle of a detection inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box covering both.
    fn union(self, other: BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = (self.left + self.width).max(other.left + other.width);
        let bottom = (self.top + self.height).max(other.top + other.height);
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// One recognized line of text.
#[derive(Debug, Clone)]
pub struct Detection {
    pub region: BoundingBox,
    pub text: String,
    /// Average word confidence, 0.0 to 1.0
    pub confidence: f32,
}

/// Turns an encoded image into text detections, in reading order.
pub trait OcrEngine {
    /// `name` is the image's file name; its extension tells the engine the
    /// encoding of `image`.
    fn read_text(&self, name: &str, image: &[u8]) -> Result<Vec<Detection>>;
}

/// Runs the Tesseract command line tool.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
    psm: u8,
}

impl TesseractEngine {
    /// Locates Tesseract and the language data, downloading the data if needed.
    pub fn new(settings: &OcrConfig) -> Result<Self> {
        let paths = ensure_tesseract(&settings.language)?;
        Ok(Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            language: settings.language.clone(),
            psm: settings.page_segmentation_mode,
        })
    }
}

impl OcrEngine for TesseractEngine {
    fn read_text(&self, name: &str, image: &[u8]) -> Result<Vec<Detection>> {
        let suffix = match name.rsplit_once('.') {
            Some((_, ext)) => format!(".{}", ext.to_ascii_lowercase()),
            None => ".png".to_string(),
        };

        // Tesseract reads from a path, so stage the bytes in a temp file
        let mut temp_input = NamedTempFile::with_suffix(&suffix)?;
        temp_input.write_all(image)?;
        temp_input.flush()?;

        let mut command = Command::new(&self.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed on {}: {}", name, stderr.trim()));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        Ok(parse_tsv_output(&tsv))
    }
}

/// Groups TSV word rows into line-level detections.
///
/// Lines are keyed by (block, paragraph, line) so that two lines with the
/// same line number in different paragraphs stay separate.
pub fn parse_tsv_output(tsv: &str) -> Vec<Detection> {
    struct Line {
        key: (i32, i32, i32),
        words: Vec<String>,
        region: BoundingBox,
        conf_sum: f32,
    }

    fn finish(line: Line) -> Detection {
        let count = line.words.len() as f32;
        Detection {
            region: line.region,
            text: line.words.join(" "),
            confidence: (line.conf_sum / count / 100.0).clamp(0.0, 1.0),
        }
    }

    let mut detections = Vec::new();
    let mut current: Option<Line> = None;

    // Skip header
    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        let text = fields[11].trim();

        // Level 5 = word
        if level != 5 || text.is_empty() {
            continue;
        }

        let field = |i: usize| fields[i].parse::<i32>().unwrap_or(-1);
        let key = (field(2), field(3), field(4));
        let region = BoundingBox {
            left: fields[6].parse().unwrap_or(0),
            top: fields[7].parse().unwrap_or(0),
            width: fields[8].parse().unwrap_or(0),
            height: fields[9].parse().unwrap_or(0),
        };
        let conf: f32 = fields[10].parse::<f32>().unwrap_or(0.0).max(0.0);

        match current.as_mut() {
            Some(line) if line.key == key => {
                line.words.push(text.to_string());
                line.region = line.region.union(region);
                line.conf_sum += conf;
            }
            _ => {
                if let Some(done) = current.take() {
                    detections.push(finish(done));
                }
                current = Some(Line {
                    key,
                    words: vec![text.to_string()],
                    region,
                    conf_sum: conf,
                });
            }
        }
    }

    if let Some(done) = current {
        detections.push(finish(done));
    }

    detections
}
