// src/exec/mod.rs

//! Work execution layer.
//!
//! - [`backend`] provides the `WorkExecutor` trait the scheduler dispatches
//!   through.
//! - [`simulated`] waits for a configured delay per task.
//! - [`task_runner`] runs each task's shell command with
//!   `tokio::process::Command`.

pub mod backend;
pub mod simulated;
pub mod task_runner;

pub use backend::{WorkExecutor, WorkFuture};
pub use simulated::SimulatedExecutor;
pub use task_runner::ShellExecutor;
