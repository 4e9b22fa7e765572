// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;

use crate::engine::TaskId;

#[derive(Error, Debug)]
pub enum RundagError {
    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("Cycle detected in task graph involving task '{0}'")]
    CycleDetected(TaskId),

    #[error("Dependency graph has already been built")]
    AlreadyBuilt,

    #[error("Dependency graph must be built before it can be run")]
    NotBuilt,

    #[error("Run finished with {} failed task(s): {}", .failed.len(), .failed.join(", "))]
    RunFailed { failed: Vec<TaskId> },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A unit of work reported failure.
///
/// This is not a run-level error: the scheduler records it against the task
/// in the [`RunReport`](crate::engine::RunReport) and keeps draining the
/// independent branches of the graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{task}' failed: {reason}")]
pub struct TaskExecutionError {
    pub task: TaskId,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, RundagError>;
