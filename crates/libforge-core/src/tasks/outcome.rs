//! Task status and the merge rule used to aggregate it up the tree

use std::fmt;

/// Terminal result of a task node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Completed, with the reasons it warned (own warnings and descendants')
    Warn(Vec<String>),
    /// Failed; the error message
    Fail(String),
}

impl Outcome {
    /// Combine two outcomes: `Fail` wins, `Warn` reasons accumulate, `Ok` is neutral.
    pub fn merge(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Outcome::Fail(e), _) | (_, Outcome::Fail(e)) => Outcome::Fail(e),
            (Outcome::Warn(mut a), Outcome::Warn(b)) => {
                a.extend(b);
                Outcome::Warn(a)
            }
            (Outcome::Warn(w), Outcome::Ok) | (Outcome::Ok, Outcome::Warn(w)) => Outcome::Warn(w),
            (Outcome::Ok, Outcome::Ok) => Outcome::Ok,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    pub fn is_warn(&self) -> bool {
        matches!(self, Outcome::Warn(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok => write!(f, "ok"),
            Outcome::Warn(_) => write!(f, "warn"),
            Outcome::Fail(_) => write!(f, "fail"),
        }
    }
}

/// Lifecycle of a task node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Done(Outcome),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done(_))
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            TaskState::Done(outcome) => Some(outcome),
            _ => None,
        }
    }
}
