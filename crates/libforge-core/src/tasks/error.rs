use std::sync::Arc;
use thiserror::Error;

/// Failure of a task, shared by every awaiter of its handle
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("{error:#}")]
    Failed {
        label: String,
        error: Arc<anyhow::Error>,
    },

    #[error("task '{label}' panicked")]
    Panicked { label: String },
}

impl TaskError {
    /// Wrap a task's error, reusing it when it already is a propagated `TaskError`
    pub(crate) fn from_anyhow(label: &str, error: anyhow::Error) -> Self {
        if error.chain().count() == 1 {
            if let Some(task_error) = error.downcast_ref::<TaskError>() {
                return task_error.clone();
            }
        }
        TaskError::Failed {
            label: label.to_string(),
            error: Arc::new(error),
        }
    }

    /// Label of the task where the failure originated
    pub fn label(&self) -> &str {
        match self {
            TaskError::Failed { label, .. } | TaskError::Panicked { label } => label,
        }
    }

    /// The underlying error, if the task did not panic
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            TaskError::Failed { error, .. } => Some(error.as_ref()),
            TaskError::Panicked { .. } => None,
        }
    }

    /// Find an error of type `E` anywhere in the underlying error chain
    pub fn find<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let error = self.error()?;
        error.chain().find_map(|cause| {
            cause
                .downcast_ref::<E>()
                .or_else(|| cause.downcast_ref::<TaskError>().and_then(|t| t.find::<E>()))
        })
    }
}

/// Look for an error of type `E` in an `anyhow` chain, looking through task failures
pub fn find_error<E>(error: &anyhow::Error) -> Option<&E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    error.chain().find_map(|cause| {
        cause
            .downcast_ref::<E>()
            .or_else(|| cause.downcast_ref::<TaskError>().and_then(|t| t.find::<E>()))
    })
}
