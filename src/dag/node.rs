// src/dag/node.rs

//! Task node record and per-run task state.

use std::collections::BTreeSet;

use crate::engine::TaskId;

/// Lifecycle of a task within a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Not dispatched yet; may still be waiting on dependencies.
    Pending,
    /// Handed to the work executor; completion not yet observed.
    Running,
    /// The work executor reported success.
    Completed,
    /// The task failed, was blocked by a failed dependency, or the run was
    /// aborted before it could finish.
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// One unit of schedulable work.
///
/// `dependencies` are declared by the caller when the task is added;
/// `dependents` are computed by [`DependencyGraph::build`](super::DependencyGraph::build)
/// and never touched afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    id: TaskId,
    dependencies: BTreeSet<TaskId>,
    dependents: BTreeSet<TaskId>,
}

impl TaskNode {
    pub(crate) fn new(id: TaskId, dependencies: BTreeSet<TaskId>) -> Self {
        Self {
            id,
            dependencies,
            dependents: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tasks that must complete before this one may start.
    pub fn dependencies(&self) -> &BTreeSet<TaskId> {
        &self.dependencies
    }

    /// Tasks that list this one as a dependency.
    pub fn dependents(&self) -> &BTreeSet<TaskId> {
        &self.dependents
    }

    pub(crate) fn add_dependent(&mut self, id: TaskId) {
        self.dependents.insert(id);
    }
}
