//! Book Scanner
//!
//! Turns a book open in a desktop reader into corrected text: calibrates the
//! reader layout, screenshots every page, splits the screenshots into
//! chapters, runs OCR on each chapter and sends the text through an AI
//! correction pass.

mod automation;
mod calibration;
mod capture;
mod correction;
mod ocr;
mod paths;
mod pipeline;
mod segmentation;
mod storage;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use pipeline::{ConsoleOperator, DesktopCollaborators, Pipeline, PipelineConfig, StageOutcome, Step};
use storage::FsStore;

/// Book page capture, chapter division, OCR and AI correction.
#[derive(Parser, Debug)]
#[command(name = "book-scanner", version, about)]
struct Cli {
    /// The step to execute
    #[arg(value_enum)]
    step: Step,

    /// Configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Number of pages to capture (asked interactively when omitted)
    #[arg(long)]
    pages: Option<u32>,

    /// Do not prompt; questions take their default answer
    #[arg(long, short = 'y')]
    yes: bool,
}

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths::get_log_file())
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths::get_log_file())
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    let cli = Cli::parse();

    if let Err(e) = paths::ensure_log_dir() {
        eprintln!("Warning: cannot create log directory: {}", e);
    }

    log(&format!("Executing step: {}", cli.step));

    let config = PipelineConfig::load(&cli.config);
    let working_dir = std::env::current_dir().context("Cannot determine the working directory")?;
    let store = FsStore::new(working_dir);
    config
        .dirs
        .create_all(&store)
        .context("Failed to create pipeline directories")?;

    let mut operator = ConsoleOperator::new(cli.yes);
    let mut collaborators = DesktopCollaborators;

    let result = Pipeline::new(&config, &store, &mut operator, &mut collaborators)
        .with_page_count(cli.pages)
        .run(cli.step);

    match result {
        Ok(outcomes) => {
            let finished = outcomes.iter().all(|(_, o)| !o.is_skipped());
            for (stage, outcome) in &outcomes {
                if let StageOutcome::Completed { artifacts } = outcome {
                    log(&format!("  {}: done ({} artifacts)", stage, artifacts));
                }
            }
            if cli.step == Step::All && finished {
                log("Full pipeline finished successfully!");
            }
            log("Script finished.");
            Ok(())
        }
        Err(e) => {
            log(&format!("Error: {:#}", e));
            std::process::exit(1);
        }
    }
}
