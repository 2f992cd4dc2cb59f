//! The person at the keyboard.
//!
//! Stages that need a decision or a manual action go through [`Operator`] so
//! the orchestrator can be driven by a script in tests.

use std::io::{self, BufRead, Write};

pub trait Operator {
    /// Asks how many pages to capture. `None` means the user cancelled.
    fn ask_page_count(&mut self) -> Option<u32>;

    /// Asks a yes/no question; `default` is used for an empty answer.
    fn confirm(&mut self, question: &str, default: bool) -> bool;

    /// Shows `message` and blocks until the user is ready.
    fn wait_for_user(&mut self, message: &str);
}

/// Interactive operator on stdin/stdout.
///
/// With `assume_yes`, questions take their default answer and waits return
/// immediately. The page count must then come from the command line.
pub struct ConsoleOperator {
    assume_yes: bool,
}

impl ConsoleOperator {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn prompt(&self, text: &str) -> Option<String> {
        print!("{}", text);
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// Parses a yes/no answer. Empty input yields `default`; anything
/// unrecognized yields `None`.
fn parse_answer(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Parses a page count. Zero and non-numbers are rejected.
fn parse_page_count(answer: &str) -> Option<u32> {
    answer.trim().parse().ok().filter(|&n| n > 0)
}

impl Operator for ConsoleOperator {
    fn ask_page_count(&mut self) -> Option<u32> {
        if self.assume_yes {
            crate::log("No page count given (use --pages with --yes).");
            return None;
        }
        loop {
            let answer = self.prompt("How many pages do you want to capture? (empty to cancel): ")?;
            if answer.is_empty() {
                return None;
            }
            match parse_page_count(&answer) {
                Some(count) => return Some(count),
                None => println!("Please enter a whole number of at least 1."),
            }
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> bool {
        if self.assume_yes {
            crate::log(&format!("{} -> {}", question, if default { "yes" } else { "no" }));
            return default;
        }
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Some(answer) = self.prompt(&format!("{} {} ", question, hint)) else {
                return default;
            };
            match parse_answer(&answer, default) {
                Some(value) => return value,
                None => println!("Please answer 'y' or 'n'."),
            }
        }
    }

    fn wait_for_user(&mut self, message: &str) {
        crate::log(message);
        if self.assume_yes {
            return;
        }
        let _ = self.prompt("Press Enter to continue...");
    }
}
