// src/dag/scheduler_step.rs

//! Result type for a single state transition of a run.

use crate::engine::TaskId;

/// What changed as a result of one completion or failure.
///
/// Useful for tests that drive the state manager by hand and make
/// assertions about which tasks were released or failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks whose last outstanding dependency just completed.
    pub newly_ready: Vec<TaskId>,
    /// Tasks newly marked as failed (the failing task first, then any
    /// dependents failed on its behalf).
    pub newly_failed: Vec<TaskId>,
}
