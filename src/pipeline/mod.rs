//! Stage orchestration.
//!
//! This module provides:
//! - Configuration loading (`PipelineConfig`)
//! - Stage and step definitions for the command line
//! - The operator prompts between stages
//! - The orchestrator that runs stages against the artifact store

pub mod config;
pub mod operator;
pub mod orchestrator;
pub mod stage;

pub use config::PipelineConfig;
pub use operator::ConsoleOperator;
pub use orchestrator::{DesktopCollaborators, Pipeline};
pub use stage::{StageOutcome, Step};
