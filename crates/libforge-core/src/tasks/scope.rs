//! Task tree execution
//!
//! Every task body receives its own [`TaskScope`]. Tasks scheduled through that
//! scope become children of the task, start running immediately, and are joined
//! before the task is allowed to finish, whether or not the body awaited them.

use super::error::TaskError;
use super::outcome::{Outcome, TaskState};
use super::report::TaskReport;
use super::reporter::{ConsoleReporter, Reporter, SilentReporter, TaskInfo};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TaskId(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub(crate) info: TaskInfo,
    pub(crate) children: Vec<TaskId>,
    pub(crate) state: TaskState,
    pub(crate) warnings: Vec<String>,
    pub(crate) message: Option<String>,
    pub(crate) error: Option<TaskError>,
}

/// State shared by every scope of one run
struct TaskTree {
    nodes: Mutex<Vec<NodeRecord>>,
    reporter: Arc<dyn Reporter>,
}

impl TaskTree {
    fn nodes(&self) -> MutexGuard<'_, Vec<NodeRecord>> {
        // A panic while holding the lock can only come from a reporter; the
        // table itself stays consistent.
        self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn add_node(&self, parent: Option<TaskId>, label: String, optional: bool) -> TaskId {
        let mut nodes = self.nodes();
        let depth = parent.map(|p| nodes[p.0].info.depth + 1).unwrap_or(0);
        let id = TaskId(nodes.len());
        nodes.push(NodeRecord {
            info: TaskInfo {
                label,
                depth,
                optional,
            },
            children: Vec::new(),
            state: TaskState::Pending,
            warnings: Vec::new(),
            message: None,
            error: None,
        });
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        id
    }

    fn info(&self, id: TaskId) -> TaskInfo {
        self.nodes()[id.0].info.clone()
    }

    fn set_running(&self, id: TaskId) {
        let info = {
            let mut nodes = self.nodes();
            nodes[id.0].state = TaskState::Running;
            nodes[id.0].info.clone()
        };
        self.reporter.task_started(&info);
    }

    /// Merged outcome of the direct children plus the first unhandled child failure
    fn children_outcome(&self, id: TaskId) -> (Outcome, Option<TaskError>) {
        let nodes = self.nodes();
        let mut outcome = Outcome::Ok;
        let mut failure = None;
        for child in &nodes[id.0].children {
            let record = &nodes[child.0];
            if let TaskState::Done(child_outcome) = &record.state {
                if child_outcome.is_fail() && failure.is_none() {
                    failure = record.error.clone();
                }
                outcome = outcome.merge(child_outcome.clone());
            }
        }
        (outcome, failure)
    }

    fn finish(&self, id: TaskId, outcome: Outcome, error: Option<TaskError>) {
        let info = {
            let mut nodes = self.nodes();
            let record = &mut nodes[id.0];
            debug_assert!(!record.state.is_terminal(), "task finished twice");
            record.state = TaskState::Done(outcome.clone());
            record.error = error;
            record.info.clone()
        };
        self.reporter.task_finished(&info, &outcome);
    }
}

type Settled = Shared<BoxFuture<'static, ()>>;

/// Handle passed to every task body; schedules child tasks and reports progress
#[derive(Clone)]
pub struct TaskScope {
    tree: Arc<TaskTree>,
    id: TaskId,
    /// Children scheduled through this scope that have not been joined yet
    pending: Arc<Mutex<Vec<Settled>>>,
}

/// Awaitable result of a scheduled task
///
/// Cloning the handle does not re-run the task; every clone observes the same result.
pub struct TaskHandle<T> {
    result: Shared<BoxFuture<'static, Result<T, TaskError>>>,
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            result: self.result.clone(),
        }
    }
}

impl<T: Clone> TaskHandle<T> {
    /// Wait for the task to reach a terminal state and return its result
    pub async fn join(&self) -> Result<T, TaskError> {
        self.result.clone().await
    }
}

impl TaskScope {
    fn new(tree: Arc<TaskTree>, id: TaskId) -> Self {
        Self {
            tree,
            id,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Label of the task this scope belongs to
    pub fn label(&self) -> String {
        self.tree.info(self.id).label
    }

    /// Schedule a child task. A failure fails this task too, even if the handle is never awaited.
    pub fn run<T, F, Fut>(&self, label: impl Into<String>, work: F) -> TaskHandle<T>
    where
        F: FnOnce(TaskScope) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        TaskHandle {
            result: self.spawn(label.into(), false, work),
        }
    }

    /// Schedule an optional child task: a failure only warns and the handle resolves to `None`.
    pub fn run_optional<T, F, Fut>(&self, label: impl Into<String>, work: F) -> TaskHandle<Option<T>>
    where
        F: FnOnce(TaskScope) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        let result = self.spawn(label.into(), true, work);
        TaskHandle {
            result: result.map(|r| Ok(r.ok())).boxed().shared(),
        }
    }

    /// Record a warning on this task; it makes the task (and its ancestors) `warn`.
    pub fn warn(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let info = {
            let mut nodes = self.tree.nodes();
            nodes[self.id.0].warnings.push(reason.clone());
            nodes[self.id.0].info.clone()
        };
        self.tree.reporter.task_warned(&info, &reason);
    }

    /// Update the progress message shown for this task
    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        let info = {
            let mut nodes = self.tree.nodes();
            nodes[self.id.0].message = Some(message.clone());
            nodes[self.id.0].info.clone()
        };
        self.tree.reporter.task_message(&info, &message);
    }

    fn spawn<T, F, Fut>(
        &self,
        label: String,
        optional: bool,
        work: F,
    ) -> Shared<BoxFuture<'static, Result<T, TaskError>>>
    where
        F: FnOnce(TaskScope) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        let id = self.tree.add_node(Some(self.id), label.clone(), optional);
        let child = TaskScope::new(self.tree.clone(), id);
        let body = work(child.clone());
        let join = tokio::spawn(child.drive(body));

        let result = async move {
            match join.await {
                Ok(result) => result,
                // drive() catches panics itself; only runtime shutdown lands here
                Err(_) => Err(TaskError::Panicked { label }),
            }
        }
        .boxed()
        .shared();

        let settled = result.clone().map(|_| ()).boxed().shared();
        self.lock_pending().push(settled);
        result
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<Settled>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait for every child scheduled through this scope, including ones scheduled
    /// while waiting.
    async fn join_children(&self) {
        loop {
            let batch: Vec<Settled> = std::mem::take(&mut *self.lock_pending());
            if batch.is_empty() {
                break;
            }
            futures::future::join_all(batch).await;
        }
    }

    /// Run a task body to its terminal state: body, then children, then status.
    async fn drive<T, Fut>(self, body: Fut) -> Result<T, TaskError>
    where
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.tree.set_running(self.id);
        let info = self.tree.info(self.id);

        let result = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(TaskError::from_anyhow(&info.label, error)),
            Err(_) => Err(TaskError::Panicked {
                label: info.label.clone(),
            }),
        };

        self.join_children().await;

        let (children, child_failure) = self.tree.children_outcome(self.id);
        let warnings = self.tree.nodes()[self.id.0].warnings.clone();
        let own = match &result {
            Ok(_) if warnings.is_empty() => Outcome::Ok,
            Ok(_) => Outcome::Warn(warnings),
            Err(error) => Outcome::Fail(error.to_string()),
        };

        // A child failure nobody awaited still fails this task.
        let result = match (result, child_failure) {
            (Ok(_), Some(error)) => Err(error),
            (result, _) => result,
        };

        let outcome = match own.merge(children) {
            Outcome::Fail(error) if info.optional => Outcome::Warn(vec![error]),
            outcome => outcome,
        };

        self.tree.finish(self.id, outcome, result.as_ref().err().cloned());
        result
    }

    fn report(&self) -> TaskReport {
        let nodes = self.tree.nodes();
        TaskReport::from_nodes(&nodes, self.id.0)
    }
}

/// Outcome of a whole task tree
#[derive(Debug)]
pub struct TaskRun<T> {
    pub result: Result<T, TaskError>,
    pub report: TaskReport,
}

impl<T> TaskRun<T> {
    pub fn into_result(self) -> Result<T, TaskError> {
        self.result
    }
}

/// Entry point: runs a root task and everything it schedules
#[derive(Clone)]
pub struct Orchestrator {
    reporter: Arc<dyn Reporter>,
}

impl Orchestrator {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Orchestrator printing progress to the terminal
    pub fn console() -> Self {
        Self::new(Arc::new(ConsoleReporter::new()))
    }

    /// Orchestrator without any output
    pub fn silent() -> Self {
        Self::new(Arc::new(SilentReporter))
    }

    /// Run `work` as the root task; returns once the whole tree is terminal.
    pub async fn run<T, F, Fut>(&self, label: impl Into<String>, work: F) -> TaskRun<T>
    where
        F: FnOnce(TaskScope) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let tree = Arc::new(TaskTree {
            nodes: Mutex::new(Vec::new()),
            reporter: self.reporter.clone(),
        });
        let id = tree.add_node(None, label.into(), false);
        let scope = TaskScope::new(tree, id);

        let body = work(scope.clone());
        let result = scope.clone().drive(body).await;
        TaskRun {
            result,
            report: scope.report(),
        }
    }
}
