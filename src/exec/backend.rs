// src/exec/backend.rs

//! Pluggable work executor abstraction.
//!
//! The scheduler talks to a `WorkExecutor` instead of knowing what a task
//! actually does. Each call returns a self-contained future that the
//! scheduler spawns onto the Tokio runtime; whatever the future resolves to
//! is reported back to the coordinator as that task's completion.
//!
//! - [`SimulatedExecutor`](super::SimulatedExecutor) sleeps for a configured
//!   delay, which is handy for dry runs and demos.
//! - [`ShellExecutor`](super::ShellExecutor) runs a shell command per task.
//! - Tests can provide their own implementation that records dispatches and
//!   decides outcomes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dag::TaskNode;
use crate::engine::TaskOutcome;

/// Future returned by [`WorkExecutor::execute`].
///
/// It must not borrow the executor or the node: it is spawned and may outlive
/// the call that created it.
pub type WorkFuture = Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'static>>;

/// Trait abstracting how a single task's work is performed.
pub trait WorkExecutor: Send + Sync {
    /// Start the work for `task`.
    ///
    /// Called exactly once per task and only after all of the task's
    /// dependencies completed.
    fn execute(&self, task: &TaskNode) -> WorkFuture;
}

impl<E: WorkExecutor + ?Sized> WorkExecutor for Arc<E> {
    fn execute(&self, task: &TaskNode) -> WorkFuture {
        (**self).execute(task)
    }
}

impl<E: WorkExecutor + ?Sized> WorkExecutor for Box<E> {
    fn execute(&self, task: &TaskNode) -> WorkFuture {
        (**self).execute(task)
    }
}
