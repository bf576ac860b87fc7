//! Hierarchical task orchestration
//!
//! This module provides:
//! - `Orchestrator`: runs a root task and returns its result plus a `TaskReport`
//! - `TaskScope`: handle given to each task body to schedule children and report progress
//! - `Outcome`: `Ok | Warn | Fail` with the merge rule used for aggregation
//! - `Reporter`: observability hooks (console or silent)

mod error;
mod outcome;
mod report;
mod reporter;
mod scope;

pub use error::{find_error, TaskError};
pub use outcome::{Outcome, TaskState};
pub use report::TaskReport;
pub use reporter::{ConsoleReporter, Reporter, SilentReporter, TaskInfo};
pub use scope::{Orchestrator, TaskHandle, TaskRun, TaskScope};
