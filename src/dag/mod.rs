// src/dag/mod.rs

//! Task graph representation and per-run task state.
//!
//! - [`node`] holds the [`TaskNode`] record and the [`TaskState`] lifecycle.
//! - [`graph`] owns all nodes and validates / builds the dependents index.
//! - [`state_manager`] tracks state transitions and remaining-dependency
//!   counts for one run.
//! - [`scheduler_step`] defines the result type of a single transition.

pub mod graph;
pub mod node;
pub mod scheduler_step;
pub mod state_manager;

pub use graph::DependencyGraph;
pub use node::{TaskNode, TaskState};
pub use scheduler_step::SchedulerStep;
pub use state_manager::StateManager;
