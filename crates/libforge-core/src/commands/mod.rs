//! Command implementations behind the `libforge` subcommands

pub mod build;
pub mod init;
pub mod lint;

use crate::tasks::{TaskReport, TaskRun};
use anyhow::Result;

/// Turn a finished task tree into the command result.
///
/// With `werror`, warnings raised by required steps fail the command.
pub(crate) fn finish(run: TaskRun<()>, werror: bool, command: &str) -> Result<TaskReport> {
    let TaskRun { result, report } = run;
    result?;

    if werror {
        let warnings = report.strict_warnings();
        if !warnings.is_empty() {
            anyhow::bail!(
                "{} failed due to warnings:\n{}",
                command,
                warnings
                    .iter()
                    .map(|w| format!("  * {}", w))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }
    }

    Ok(report)
}
