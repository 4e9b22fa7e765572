// src/engine/report.rs

//! Aggregate outcome of a run.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::dag::TaskState;
use crate::engine::{FailureCause, TaskId};
use crate::errors::{Result, RundagError, TaskExecutionError};

/// Final state of every task after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub completed: BTreeSet<TaskId>,
    pub failed: BTreeMap<TaskId, FailureCause>,
    /// Tasks that were never dispatched and never failed.
    ///
    /// Always empty for a run over an acyclic graph that was not aborted.
    pub never_ran: BTreeSet<TaskId>,
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn from_states(
        states: BTreeMap<TaskId, (TaskState, Option<FailureCause>)>,
        elapsed: Duration,
    ) -> Self {
        let mut report = RunReport {
            completed: BTreeSet::new(),
            failed: BTreeMap::new(),
            never_ran: BTreeSet::new(),
            elapsed,
        };

        for (task, (state, failure)) in states {
            match (state, failure) {
                (TaskState::Completed, _) => {
                    report.completed.insert(task);
                }
                (TaskState::Failed, Some(cause)) => {
                    report.failed.insert(task, cause);
                }
                (TaskState::Failed, None) => {
                    report
                        .failed
                        .insert(task, FailureCause::Aborted("no cause recorded".to_string()));
                }
                (TaskState::Pending | TaskState::Running, _) => {
                    report.never_ran.insert(task);
                }
            }
        }

        report
    }

    /// True when every task completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.never_ran.is_empty()
    }

    /// Final state of `task`, or `None` if it is not part of the run.
    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        if self.completed.contains(task) {
            Some(TaskState::Completed)
        } else if self.failed.contains_key(task) {
            Some(TaskState::Failed)
        } else if self.never_ran.contains(task) {
            Some(TaskState::Pending)
        } else {
            None
        }
    }

    pub fn failed_ids(&self) -> Vec<TaskId> {
        self.failed.keys().cloned().collect()
    }

    /// Failures reported by the work executor itself (root causes).
    pub fn execution_errors(&self) -> Vec<&TaskExecutionError> {
        self.failed
            .values()
            .filter_map(|cause| match cause {
                FailureCause::Execution(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    /// Turn a partial failure into an error listing every task that did not
    /// complete.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let failed = self
            .failed
            .keys()
            .chain(self.never_ran.iter())
            .cloned()
            .collect();
        Err(RundagError::RunFailed { failed })
    }
}
