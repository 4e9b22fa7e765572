// src/dag/state_manager.rs

//! Per-run state management for tasks.
//!
//! The [`DependencyGraph`] stays immutable while a run is in progress; the
//! mutable side of the run (task states and how many prerequisites each task
//! is still waiting on) lives here.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::dag::node::TaskState;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::DependencyGraph;
use crate::engine::{FailureCause, TaskId};

#[derive(Debug, Clone)]
struct TaskProgress {
    state: TaskState,
    /// Dependencies that have not reached `Completed` yet.
    remaining: usize,
    failure: Option<FailureCause>,
}

/// Tracks state transitions of every task in one run.
#[derive(Debug)]
pub struct StateManager<'g> {
    graph: &'g DependencyGraph,
    tasks: HashMap<TaskId, TaskProgress>,
}

impl<'g> StateManager<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        let tasks = graph
            .nodes()
            .map(|node| {
                (
                    node.id().to_string(),
                    TaskProgress {
                        state: TaskState::Pending,
                        remaining: node.dependencies().len(),
                        failure: None,
                    },
                )
            })
            .collect();

        Self { graph, tasks }
    }

    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.tasks.get(task).map(|p| p.state)
    }

    pub fn failure_of(&self, task: &str) -> Option<&FailureCause> {
        self.tasks.get(task).and_then(|p| p.failure.as_ref())
    }

    /// Whether every dependency of `task` has completed in this run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        self.tasks.get(task).map(|p| p.remaining == 0)
    }

    /// Tasks that are ready before anything has run.
    pub fn initially_ready(&self) -> Vec<TaskId> {
        self.graph
            .initial_frontier()
            .into_iter()
            .map(|node| node.id().to_string())
            .collect()
    }

    /// Pending -> Running.
    ///
    /// Refuses (and returns `false`) unless the task is Pending and all of its
    /// dependencies have completed, so a task can never be dispatched twice.
    pub fn mark_running(&mut self, task: &str) -> bool {
        match self.tasks.get_mut(task) {
            Some(p) if p.state == TaskState::Pending && p.remaining == 0 => {
                p.state = TaskState::Running;
                true
            }
            Some(p) => {
                warn!(
                    task = %task,
                    state = ?p.state,
                    remaining = p.remaining,
                    "refusing to dispatch task"
                );
                false
            }
            None => {
                warn!(task = %task, "dispatch requested for unknown task");
                false
            }
        }
    }

    /// Running -> Completed, releasing dependents whose last outstanding
    /// dependency this was.
    pub fn mark_completed(&mut self, task: &str) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        match self.tasks.get_mut(task) {
            Some(p) if p.state == TaskState::Running => p.state = TaskState::Completed,
            Some(p) => {
                warn!(task = %task, state = ?p.state, "completion for task that is not running; ignoring");
                return step;
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return step;
            }
        }

        let graph = self.graph;
        for dependent in graph.dependents_of(task) {
            let Some(p) = self.tasks.get_mut(dependent.id()) else {
                continue;
            };
            if p.state != TaskState::Pending {
                continue;
            }

            p.remaining = p.remaining.saturating_sub(1);
            debug!(
                task = %dependent.id(),
                after = %task,
                remaining = p.remaining,
                "dependency completed"
            );
            if p.remaining == 0 {
                step.newly_ready.push(dependent.id().to_string());
            }
        }

        step
    }

    /// Mark `task` as failed and fail every transitive dependent that has not
    /// been dispatched.
    ///
    /// The returned step lists `task` first, followed by the dependents that
    /// were failed on its behalf.
    pub fn mark_failed(&mut self, task: &str, cause: FailureCause) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        match self.tasks.get_mut(task) {
            Some(p) if !p.state.is_terminal() => {
                p.state = TaskState::Failed;
                p.failure = Some(cause);
            }
            Some(p) => {
                warn!(task = %task, state = ?p.state, "failure for task that already finished; ignoring");
                return step;
            }
            None => {
                warn!(task = %task, "failure for unknown task; ignoring");
                return step;
            }
        }
        step.newly_failed.push(task.to_string());

        let graph = self.graph;
        let mut stack: Vec<&str> = graph
            .dependents_of(task)
            .into_iter()
            .map(|node| node.id())
            .collect();

        while let Some(name) = stack.pop() {
            let Some(p) = self.tasks.get_mut(name) else {
                continue;
            };
            // A dependent of a failed task can never have been dispatched.
            if p.state != TaskState::Pending {
                continue;
            }

            p.state = TaskState::Failed;
            p.failure = Some(FailureCause::UpstreamFailed(task.to_string()));
            debug!(task = %name, upstream = %task, "failing dependent of failed task");
            step.newly_failed.push(name.to_string());
            stack.extend(graph.dependents_of(name).into_iter().map(|node| node.id()));
        }

        step
    }

    /// Fail every task that has not reached a terminal state.
    pub fn fail_unfinished(&mut self, reason: &str) -> Vec<TaskId> {
        let mut failed: Vec<TaskId> = self
            .tasks
            .iter_mut()
            .filter(|(_, p)| !p.state.is_terminal())
            .map(|(name, p)| {
                p.state = TaskState::Failed;
                p.failure = Some(FailureCause::Aborted(reason.to_string()));
                name.clone()
            })
            .collect();
        failed.sort();
        failed
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.values().all(|p| p.state.is_terminal())
    }

    /// Final per-task states, plus the failure cause of every failed task.
    pub fn into_states(self) -> BTreeMap<TaskId, (TaskState, Option<FailureCause>)> {
        self.tasks
            .into_iter()
            .map(|(name, p)| (name, (p.state, p.failure)))
            .collect()
    }
}
