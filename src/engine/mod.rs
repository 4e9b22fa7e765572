// src/engine/mod.rs

//! Execution engine for rundag.
//!
//! The pure core state machine lives in [`core`]: it decides which tasks to
//! dispatch and which events to publish, without Tokio, channels or IO. The
//! async shell in [`runtime`] spawns work, collects completions over a single
//! channel and feeds them into the core.

use std::fmt;
use std::time::Duration;

use crate::errors::TaskExecutionError;

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Outcome of one unit of work, as reported by a work executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Why a task ended up `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The work executor reported a failure for this task.
    Execution(TaskExecutionError),
    /// A (transitive) dependency failed; the task was never dispatched.
    UpstreamFailed(TaskId),
    /// The run was stopped (deadline or shutdown) before the task finished.
    Aborted(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Execution(err) => write!(f, "{}", err.reason),
            FailureCause::UpstreamFailed(task) => write!(f, "dependency '{task}' failed"),
            FailureCause::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Upper bound on concurrently running tasks; `None` means unbounded.
    pub max_parallel: Option<usize>,
    /// Abort the run once this much time has passed since it started.
    pub timeout: Option<Duration>,
}

/// Events published while a run is in progress, in the order the
/// coordinator observes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The task was handed to the work executor.
    Dispatched { task: TaskId },
    /// The task's work finished successfully.
    Completed { task: TaskId },
    /// The task failed, or will never run.
    Failed { task: TaskId, cause: FailureCause },
}

impl RunEvent {
    pub fn task(&self) -> &str {
        match self {
            RunEvent::Dispatched { task }
            | RunEvent::Completed { task }
            | RunEvent::Failed { task, .. } => task,
        }
    }
}

pub mod core;
pub mod events;
pub mod report;
pub mod runtime;

pub use self::core::{CoreRuntime, CoreStep};
pub use events::{ChannelSink, EventSink, TracingSink};
pub use report::RunReport;
pub use runtime::Scheduler;
