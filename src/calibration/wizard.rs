//! Calibration wizard implementation.
//!
//! Guides the user through ten clicks with console prompts. The wizard is a
//! finite loop: it blocks on the click source once per step and stops as soon
//! as the last point is recorded.

use anyhow::{Context, Result};

use crate::calibration::coords::{Coordinate, RegionConfig};
use crate::calibration::state::CalibrationStep;
use crate::log;

/// Source of mouse clicks in screen coordinates.
pub trait ClickSource {
    /// Blocks until the next click and returns where it happened.
    fn next_click(&mut self) -> Result<Coordinate>;
}

/// Runs the ten-click calibration and returns the recorded layout.
///
/// Nothing is persisted here; the caller saves the returned config.
pub fn run_wizard(source: &mut dyn ClickSource) -> Result<RegionConfig> {
    let total = CalibrationStep::total_steps();

    log("");
    log(&format!("--- Two-Column Layout Setup ({} Clicks) ---", total));
    log(&format!(
        "Click each point below in turn. {} mouse clicks define the reading area.",
        total
    ));
    log("");

    let mut points = Vec::with_capacity(total);
    let mut step = CalibrationStep::LeftTopLeft;

    while step != CalibrationStep::Complete {
        log(&format!("{}. {}", step.step_number(), step.description()));

        let click = source
            .next_click()
            .with_context(|| format!("Failed to record click {}/{}", step.step_number(), total))?;
        log(&format!(
            "> Click {}/{} registered at {}.",
            step.step_number(),
            total,
            click
        ));

        points.push(click);
        step = step.next();
    }

    log("All coordinates captured.");
    Ok(RegionConfig::from_points(points)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct ScriptedClicks {
        clicks: Vec<Coordinate>,
        served: usize,
    }

    impl ClickSource for ScriptedClicks {
        fn next_click(&mut self) -> Result<Coordinate> {
            let click = self
                .clicks
                .get(self.served)
                .copied()
                .ok_or_else(|| anyhow!("listener closed"))?;
            self.served += 1;
            Ok(click)
        }
    }

    fn clicks(n: i32) -> Vec<Coordinate> {
        (0..n).map(|i| Coordinate::new(i * 10, i * 20)).collect()
    }

    #[test]
    fn test_wizard_stops_after_ten_clicks() {
        let mut source = ScriptedClicks {
            clicks: clicks(12),
            served: 0,
        };

        let config = run_wizard(&mut source).unwrap();

        assert_eq!(source.served, 10);
        assert_eq!(config.points()[0], Coordinate::new(0, 0));
        assert_eq!(config.points()[9], Coordinate::new(90, 180));
    }

    #[test]
    fn test_wizard_fails_when_source_runs_dry() {
        let mut source = ScriptedClicks {
            clicks: clicks(4),
            served: 0,
        };

        let err = run_wizard(&mut source).unwrap_err();
        assert!(format!("{:#}", err).contains("click 5/10"));
    }
}
