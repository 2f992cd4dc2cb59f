//! Calibrated screen points and the capture regions derived from them.
//!
//! The coordinate file holds one `x,y` pair per line, exactly ten lines, in
//! the order the calibration wizard asks for them:
//! left column corners (4), right column corners (4), previous page button,
//! next page button.

use regex::Regex;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

use crate::storage::ArtifactStore;

/// Number of points a complete calibration records.
pub const POINT_COUNT: usize = 10;

const COORD_PATTERN: &str = r"^\s*(-?\d+)\s*,\s*(-?\d+)\s*$";

static COORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COORD_PATTERN).expect("coordinate pattern is valid"));

/// Errors from loading or saving the coordinate file.
#[derive(Debug, Error)]
pub enum CoordsError {
    #[error("coordinates file not found at '{0}'")]
    MissingFile(PathBuf),

    #[error("line {line} of the coordinates file is not an 'x,y' pair: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("expected 10 coordinates, but found {found}")]
    WrongCount { found: usize },

    #[error("coordinates file I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A point in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A screen rectangle: top-left corner plus size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Smallest rectangle containing every point. The width and height are
    /// the max-minus-min span of the x and y components.
    pub fn bounding(points: &[Coordinate]) -> Self {
        let Some(first) = points.first() else {
            return Self {
                left: 0,
                top: 0,
                width: 0,
                height: 0,
            };
        };

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        Self {
            left: min_x,
            top: min_y,
            width: max_x.abs_diff(min_x),
            height: max_y.abs_diff(min_y),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Everything the capture stage needs, derived from a [`RegionConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureLayout {
    pub left_column: Region,
    pub right_column: Region,
    pub previous_button: Coordinate,
    pub next_button: Coordinate,
}

/// The ten calibrated points of a two-column reader layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionConfig {
    points: [Coordinate; POINT_COUNT],
}

impl RegionConfig {
    /// Builds a config from exactly [`POINT_COUNT`] points.
    pub fn from_points(points: Vec<Coordinate>) -> Result<Self, CoordsError> {
        let found = points.len();
        let points: [Coordinate; POINT_COUNT] = points
            .try_into()
            .map_err(|_| CoordsError::WrongCount { found })?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Coordinate; POINT_COUNT] {
        &self.points
    }

    /// Parses the line-oriented coordinate format. Blank lines are ignored.
    pub fn parse(contents: &str) -> Result<Self, CoordsError> {
        let mut points = Vec::with_capacity(POINT_COUNT);

        for (idx, raw) in contents.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let malformed = || CoordsError::MalformedLine {
                line: idx + 1,
                text: raw.to_string(),
            };
            let caps = COORD_REGEX.captures(raw).ok_or_else(malformed)?;
            let x: i32 = caps[1].parse().map_err(|_| malformed())?;
            let y: i32 = caps[2].parse().map_err(|_| malformed())?;
            points.push(Coordinate { x, y });
        }

        Self::from_points(points)
    }

    /// Renders the config in the coordinate file format.
    pub fn to_contents(&self) -> String {
        self.points
            .iter()
            .map(|p| format!("{},{}\n", p.x, p.y))
            .collect()
    }

    /// Loads the coordinate file `name` from `dir`.
    pub fn load(store: &dyn ArtifactStore, dir: &Path, name: &str) -> Result<Self, CoordsError> {
        if !store.file_exists(dir, name) {
            return Err(CoordsError::MissingFile(dir.join(name)));
        }
        let bytes = store.read(dir, name)?;
        let contents = String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Self::parse(&contents)
    }

    /// Writes the coordinate file, replacing any previous calibration.
    pub fn save(&self, store: &dyn ArtifactStore, dir: &Path, name: &str) -> Result<(), CoordsError> {
        store.write(dir, name, self.to_contents().as_bytes())?;
        Ok(())
    }

    /// Derives the two column regions and the two navigation buttons.
    pub fn derive_regions(&self) -> CaptureLayout {
        CaptureLayout {
            left_column: Region::bounding(&self.points[0..4]),
            right_column: Region::bounding(&self.points[4..8]),
            previous_button: self.points[8],
            next_button: self.points[9],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    const SAMPLE: &str = "100,200\n400,205\n102,900\n398,895\n\
                          500,200\n800,200\n500,900\n800,900\n\
                          50,1000\n850,1000\n";

    #[test]
    fn test_parse_and_derive_regions() {
        let config = RegionConfig::parse(SAMPLE).unwrap();
        let layout = config.derive_regions();

        assert_eq!(
            layout.left_column,
            Region {
                left: 100,
                top: 200,
                width: 300,
                height: 700
            }
        );
        assert_eq!(
            layout.right_column,
            Region {
                left: 500,
                top: 200,
                width: 300,
                height: 700
            }
        );
        assert_eq!(layout.previous_button, Coordinate::new(50, 1000));
        assert_eq!(layout.next_button, Coordinate::new(850, 1000));
    }

    #[test]
    fn test_region_span_matches_points_in_any_order() {
        // corners clicked in an unusual order, including negative x
        let points = [
            Coordinate::new(-40, 30),
            Coordinate::new(-300, 700),
            Coordinate::new(-45, 710),
            Coordinate::new(-290, 25),
        ];
        let region = Region::bounding(&points);

        assert_eq!(region.left, -300);
        assert_eq!(region.top, 25);
        assert_eq!(region.width, 260);
        assert_eq!(region.height, 685);
    }

    #[test]
    fn test_degenerate_region_has_zero_size() {
        let p = Coordinate::new(10, 10);
        let region = Region::bounding(&[p, p, p, p]);
        assert_eq!((region.width, region.height), (0, 0));
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_blank_lines() {
        let contents = SAMPLE.replace("100,200", " 100 , 200 ") + "\n\n";
        let config = RegionConfig::parse(&contents).unwrap();
        assert_eq!(config.points()[0], Coordinate::new(100, 200));
    }

    #[test]
    fn test_parse_too_few_lines_is_wrong_count() {
        let err = RegionConfig::parse("1,2\n3,4\n5,6\n").unwrap_err();
        assert!(matches!(err, CoordsError::WrongCount { found: 3 }));
    }

    #[test]
    fn test_parse_too_many_lines_is_wrong_count() {
        let contents = format!("{}1,1\n", SAMPLE);
        let err = RegionConfig::parse(&contents).unwrap_err();
        assert!(matches!(err, CoordsError::WrongCount { found: 11 }));
    }

    #[test]
    fn test_parse_malformed_line_reports_line_number() {
        let contents = SAMPLE.replace("500,200", "500;200");
        let err = RegionConfig::parse(&contents).unwrap_err();
        match err {
            CoordsError::MalformedLine { line, text } => {
                assert_eq!(line, 5);
                assert_eq!(text, "500;200");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_overflowing_numbers() {
        let contents = SAMPLE.replace("100,200", "99999999999,200");
        assert!(matches!(
            RegionConfig::parse(&contents),
            Err(CoordsError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let store = MemoryStore::new();
        let err = RegionConfig::load(&store, Path::new("config"), "mouse_clicks.txt").unwrap_err();
        assert!(matches!(err, CoordsError::MissingFile(_)));
    }

    #[test]
    fn test_save_then_load_keeps_points() {
        let store = MemoryStore::new();
        let dir = Path::new("config");
        let config = RegionConfig::parse(SAMPLE).unwrap();

        config.save(&store, dir, "mouse_clicks.txt").unwrap();
        let contents = String::from_utf8(store.read(dir, "mouse_clicks.txt").unwrap()).unwrap();

        assert_eq!(contents.lines().count(), POINT_COUNT);
        assert_eq!(
            RegionConfig::load(&store, dir, "mouse_clicks.txt").unwrap(),
            config
        );
    }
}
