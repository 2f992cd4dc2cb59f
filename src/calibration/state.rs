//! Calibration step tracking.
//!
//! The wizard walks through ten steps, one per recorded click, in the order
//! the coordinate file stores them.

/// Steps in the calibration wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationStep {
    LeftTopLeft,
    LeftTopRight,
    LeftBottomLeft,
    LeftBottomRight,
    RightTopLeft,
    RightTopRight,
    RightBottomLeft,
    RightBottomRight,
    PreviousButton,
    NextButton,
    /// All points recorded.
    Complete,
}

impl CalibrationStep {
    /// Returns a human-readable instruction for the current step.
    pub fn description(&self) -> &'static str {
        match self {
            Self::LeftTopLeft => "LEFT column, TOP-LEFT corner:",
            Self::LeftTopRight => "LEFT column, TOP-RIGHT corner:",
            Self::LeftBottomLeft => "LEFT column, BOTTOM-LEFT corner:",
            Self::LeftBottomRight => "LEFT column, BOTTOM-RIGHT corner:",
            Self::RightTopLeft => "RIGHT column, TOP-LEFT corner:",
            Self::RightTopRight => "RIGHT column, TOP-RIGHT corner:",
            Self::RightBottomLeft => "RIGHT column, BOTTOM-LEFT corner:",
            Self::RightBottomRight => "RIGHT column, BOTTOM-RIGHT corner:",
            Self::PreviousButton => "PREVIOUS page button:",
            Self::NextButton => "NEXT page button:",
            Self::Complete => "Complete",
        }
    }

    /// Returns the step number (1-based) for display.
    pub fn step_number(&self) -> usize {
        match self {
            Self::LeftTopLeft => 1,
            Self::LeftTopRight => 2,
            Self::LeftBottomLeft => 3,
            Self::LeftBottomRight => 4,
            Self::RightTopLeft => 5,
            Self::RightTopRight => 6,
            Self::RightBottomLeft => 7,
            Self::RightBottomRight => 8,
            Self::PreviousButton => 9,
            Self::NextButton => 10,
            Self::Complete => 11,
        }
    }

    /// Total number of clicks the wizard records.
    pub fn total_steps() -> usize {
        10
    }

    /// The step that follows this one.
    pub fn next(&self) -> Self {
        match self {
            Self::LeftTopLeft => Self::LeftTopRight,
            Self::LeftTopRight => Self::LeftBottomLeft,
            Self::LeftBottomLeft => Self::LeftBottomRight,
            Self::LeftBottomRight => Self::RightTopLeft,
            Self::RightTopLeft => Self::RightTopRight,
            Self::RightTopRight => Self::RightBottomLeft,
            Self::RightBottomLeft => Self::RightBottomRight,
            Self::RightBottomRight => Self::PreviousButton,
            Self::PreviousButton => Self::NextButton,
            Self::NextButton | Self::Complete => Self::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::coords::POINT_COUNT;

    #[test]
    fn test_walk_visits_every_step_once() {
        let mut step = CalibrationStep::LeftTopLeft;
        let mut visited = 0;
        while step != CalibrationStep::Complete {
            visited += 1;
            assert_eq!(step.step_number(), visited);
            step = step.next();
        }
        assert_eq!(visited, CalibrationStep::total_steps());
        assert_eq!(visited, POINT_COUNT);
    }

    #[test]
    fn test_complete_is_terminal() {
        assert_eq!(CalibrationStep::Complete.next(), CalibrationStep::Complete);
    }
}
