// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes "start" and "task finished" inputs and produces:
//! - the tasks the async shell should hand to the work executor next
//! - the [`RunEvent`]s to publish, in order
//!
//! It owns the outstanding set (dispatched tasks whose completion has not been
//! observed yet) and the ready queue (tasks whose dependencies are done but
//! that are held back by `max_parallel`). It has no channels, no Tokio types
//! and performs no IO, so it can be stepped by hand in tests.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dag::{DependencyGraph, StateManager, TaskNode};
use crate::engine::{FailureCause, RunEvent, RunOptions, RunReport, TaskId, TaskOutcome};
use crate::errors::{Result, RundagError, TaskExecutionError};

/// Decision returned by the core after a single input.
#[derive(Debug, Clone)]
pub struct CoreStep<'g> {
    /// Tasks to hand to the work executor now.
    pub dispatch: Vec<&'g TaskNode>,
    /// Events to publish, in order.
    pub events: Vec<RunEvent>,
}

impl CoreStep<'_> {
    fn empty() -> Self {
        Self {
            dispatch: Vec::new(),
            events: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct CoreRuntime<'g> {
    graph: &'g DependencyGraph,
    state: StateManager<'g>,
    ready: VecDeque<TaskId>,
    outstanding: HashSet<TaskId>,
    max_parallel: Option<usize>,
    started: bool,
}

impl<'g> CoreRuntime<'g> {
    /// Create the core for one run over a built graph.
    pub fn new(graph: &'g DependencyGraph, options: RunOptions) -> Result<Self> {
        if !graph.is_built() {
            return Err(RundagError::NotBuilt);
        }
        if options.max_parallel == Some(0) {
            return Err(RundagError::ConfigError(
                "max_parallel must be >= 1 (got 0)".to_string(),
            ));
        }

        Ok(Self {
            graph,
            state: StateManager::new(graph),
            ready: VecDeque::new(),
            outstanding: HashSet::new(),
            max_parallel: options.max_parallel,
            started: false,
        })
    }

    /// Seed the run with the initial frontier.
    pub fn start(&mut self) -> CoreStep<'g> {
        let mut step = CoreStep::empty();
        if self.started {
            warn!("core runtime already started; ignoring start request");
            return step;
        }
        self.started = true;

        let frontier = self.state.initially_ready();
        info!(tasks = self.graph.len(), ?frontier, "starting run");
        self.ready.extend(frontier);
        self.fill(&mut step);
        step
    }

    /// Record the outcome of a dispatched task.
    ///
    /// Completions for tasks that are not outstanding (unknown, or already
    /// observed) are ignored.
    pub fn on_completion(&mut self, task: &str, outcome: TaskOutcome) -> CoreStep<'g> {
        let mut step = CoreStep::empty();

        if !self.outstanding.remove(task) {
            warn!(task = %task, "completion for task that is not outstanding; ignoring");
            return step;
        }

        match outcome {
            TaskOutcome::Success => {
                let transition = self.state.mark_completed(task);
                debug!(task = %task, released = ?transition.newly_ready, "task completed");
                step.events.push(RunEvent::Completed {
                    task: task.to_string(),
                });
                self.ready.extend(transition.newly_ready);
            }
            TaskOutcome::Failed(reason) => {
                warn!(task = %task, %reason, "task failed; failing its dependents");
                let cause = FailureCause::Execution(TaskExecutionError {
                    task: task.to_string(),
                    reason,
                });
                let transition = self.state.mark_failed(task, cause);
                self.push_failures(&mut step, transition.newly_failed);
            }
        }

        self.fill(&mut step);
        step
    }

    /// Stop the run: nothing more is dispatched and every unfinished task is
    /// failed with `reason`.
    pub fn abort(&mut self, reason: &str) -> CoreStep<'g> {
        let mut step = CoreStep::empty();

        warn!(
            %reason,
            outstanding = self.outstanding.len(),
            queued = self.ready.len(),
            "aborting run"
        );
        self.ready.clear();
        self.outstanding.clear();

        let failed = self.state.fail_unfinished(reason);
        self.push_failures(&mut step, failed);
        step
    }

    /// Whether any dispatched task still has to report back.
    pub fn has_outstanding(&self) -> bool {
        !self.outstanding.is_empty()
    }

    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn queued_len(&self) -> usize {
        self.ready.len()
    }

    pub fn state(&self) -> &StateManager<'g> {
        &self.state
    }

    /// Consume the core and summarise the run.
    pub fn into_report(self, elapsed: Duration) -> RunReport {
        RunReport::from_states(self.state.into_states(), elapsed)
    }

    /// Dispatch queued tasks until the queue is empty or `max_parallel` is hit.
    fn fill(&mut self, step: &mut CoreStep<'g>) {
        let graph = self.graph;
        while self.has_capacity() {
            let Some(task) = self.ready.pop_front() else {
                break;
            };
            if !self.state.mark_running(&task) {
                continue;
            }
            let Some(node) = graph.node(&task) else {
                continue;
            };

            debug!(task = %task, "dependencies satisfied; dispatching");
            self.outstanding.insert(task.clone());
            step.events.push(RunEvent::Dispatched { task });
            step.dispatch.push(node);
        }
    }

    fn has_capacity(&self) -> bool {
        self.max_parallel
            .is_none_or(|limit| self.outstanding.len() < limit)
    }

    fn push_failures(&self, step: &mut CoreStep<'g>, failed: Vec<TaskId>) {
        for task in failed {
            if let Some(cause) = self.state.failure_of(&task).cloned() {
                step.events.push(RunEvent::Failed { task, cause });
            }
        }
    }
}
