//! Snapshot of a finished task tree

use super::outcome::{Outcome, TaskState};
use super::scope::NodeRecord;

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub label: String,
    pub optional: bool,
    pub state: TaskState,
    /// Warnings the task reported itself (not inherited from children)
    pub warnings: Vec<String>,
    /// Last progress message
    pub message: Option<String>,
    pub children: Vec<TaskReport>,
}

impl TaskReport {
    pub(crate) fn from_nodes(nodes: &[NodeRecord], index: usize) -> Self {
        let node = &nodes[index];
        Self {
            label: node.info.label.clone(),
            optional: node.info.optional,
            state: node.state.clone(),
            warnings: node.warnings.clone(),
            message: node.message.clone(),
            children: node
                .children
                .iter()
                .map(|child| Self::from_nodes(nodes, child.0))
                .collect(),
        }
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.state.outcome()
    }

    /// Depth-first search for a task by label (this task included)
    pub fn find(&self, label: &str) -> Option<&TaskReport> {
        if self.label == label {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(label))
    }

    /// Warnings raised by required steps: tasks that are neither optional nor below an
    /// optional task. Failures downgraded by optional steps are not included.
    pub fn strict_warnings(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.collect_strict_warnings(&mut found);
        found
    }

    fn collect_strict_warnings(&self, found: &mut Vec<String>) {
        if self.optional {
            return;
        }
        found.extend(
            self.warnings
                .iter()
                .map(|w| format!("{}: {}", self.label, w)),
        );
        for child in &self.children {
            child.collect_strict_warnings(found);
        }
    }
}
