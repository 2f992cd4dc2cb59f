use clap::ValueEnum;
use std::fmt;

/// What the user asked to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Step {
    /// Run every stage in order
    All,
    /// Record the reader layout with ten mouse clicks
    Configure,
    /// Capture every page into the screenshots directory
    Capture,
    /// Split screenshots into chapter folders using the markers
    Divide,
    /// Extract text from every chapter
    Ocr,
    /// Correct every chapter's text with the AI service
    Correct,
}

impl Step {
    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Step::All => "all",
            Step::Configure => "configure",
            Step::Capture => "capture",
            Step::Divide => "divide",
            Step::Ocr => "ocr",
            Step::Correct => "correct",
        }
    }

    /// The stages this step runs, in order.
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Step::All => &Stage::ALL,
            Step::Configure => &[Stage::Configure],
            Step::Capture => &[Stage::Capture],
            Step::Divide => &[Stage::Divide],
            Step::Ocr => &[Stage::Ocr],
            Step::Correct => &[Stage::Correct],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Capture,
    Divide,
    Ocr,
    Correct,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Configure,
        Stage::Capture,
        Stage::Divide,
        Stage::Ocr,
        Stage::Correct,
    ];

    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Capture => "capture",
            Stage::Divide => "divide",
            Stage::Ocr => "ocr",
            Stage::Correct => "correct",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Configure => "CONFIGURE LAYOUT",
            Stage::Capture => "CAPTURE SCREENSHOTS",
            Stage::Divide => "DIVIDE CHAPTERS",
            Stage::Ocr => "EXTRACT TEXT (OCR)",
            Stage::Correct => "CORRECT TEXT (AI)",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a stage ended when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage ran; `artifacts` counts what it wrote
    Completed { artifacts: usize },
    /// A precondition was not met; nothing was changed
    Skipped { reason: String },
}

impl StageOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StageOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_runs_every_stage_in_order() {
        assert_eq!(
            Step::All.stages(),
            &[
                Stage::Configure,
                Stage::Capture,
                Stage::Divide,
                Stage::Ocr,
                Stage::Correct
            ]
        );
        assert_eq!(Step::Ocr.stages(), &[Stage::Ocr]);
    }

    #[test]
    fn test_step_names_parse_from_command_line() {
        assert_eq!(Step::from_str("divide", true).unwrap(), Step::Divide);
        assert_eq!(Step::from_str("all", true).unwrap(), Step::All);
        assert!(Step::from_str("publish", true).is_err());
    }

    #[test]
    fn test_step_display_matches_command_line_value() {
        for step in Step::value_variants() {
            let name = step.to_string();
            assert_eq!(Step::from_str(&name, false).unwrap(), *step);
        }
        assert_eq!(Step::All.to_string(), "all");
    }

    #[test]
    fn test_stage_display_uses_command_name() {
        assert_eq!(Stage::Correct.to_string(), "correct");
    }
}
