//! Observability sinks for task events
//!
//! Reporters only watch; nothing they do feeds back into scheduling.

use super::outcome::Outcome;
use colored::Colorize;
use std::collections::HashSet;
use std::sync::Mutex;

/// Identity of the task an event is about
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub label: String,
    /// Distance from the root task (root = 0)
    pub depth: usize,
    pub optional: bool,
}

/// Receives task lifecycle events
pub trait Reporter: Send + Sync {
    fn task_started(&self, _task: &TaskInfo) {}

    /// Progress message for a running task (e.g. first line of a tool's output)
    fn task_message(&self, _task: &TaskInfo, _message: &str) {}

    /// A warning reported by the task itself
    fn task_warned(&self, _task: &TaskInfo, _reason: &str) {}

    fn task_finished(&self, _task: &TaskInfo, _outcome: &Outcome) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Prints task progress to the terminal
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Errors already printed; a failure propagating up the tree is shown once
    shown_errors: Mutex<HashSet<String>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn first_sighting(&self, error: &str) -> bool {
        match self.shown_errors.lock() {
            Ok(mut shown) => shown.insert(error.to_string()),
            Err(_) => true,
        }
    }

    fn indent(task: &TaskInfo) -> String {
        "  ".repeat(task.depth + 1)
    }
}

impl Reporter for ConsoleReporter {
    fn task_message(&self, task: &TaskInfo, message: &str) {
        if message.trim().is_empty() {
            return;
        }
        eprintln!(
            "{}{} {}",
            Self::indent(task),
            format!("{}:", task.label).dimmed(),
            message.dimmed()
        );
    }

    fn task_warned(&self, task: &TaskInfo, reason: &str) {
        eprintln!(
            "{}{} {}",
            Self::indent(task),
            format!("{}:", task.label).yellow(),
            reason
        );
    }

    fn task_finished(&self, task: &TaskInfo, outcome: &Outcome) {
        let indent = Self::indent(task);
        match outcome {
            Outcome::Ok => eprintln!("{}{} {}", indent, "✓".green(), task.label),
            Outcome::Warn(_) => eprintln!("{}{} {}", indent, "!".yellow(), task.label.yellow()),
            Outcome::Fail(error) => {
                eprintln!("{}{} {}", indent, "✗".red(), task.label.red());
                if self.first_sighting(error) {
                    for line in error.lines() {
                        eprintln!("{}  {}", indent, line.red());
                    }
                }
            }
        }
    }
}
