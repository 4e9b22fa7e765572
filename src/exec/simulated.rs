// src/exec/simulated.rs

//! Work executor that only waits.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, info};

use crate::dag::TaskNode;
use crate::engine::{TaskId, TaskOutcome};
use crate::exec::backend::{WorkExecutor, WorkFuture};

/// Default simulated work time per task.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(5000);

/// Sleeps for a per-task delay, then reports success (or a scripted failure).
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    default_delay: Duration,
    delays: HashMap<TaskId, Duration>,
    failing: HashSet<TaskId>,
}

impl SimulatedExecutor {
    pub fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            delays: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// Override the delay for one task.
    pub fn with_delay(mut self, task: impl Into<TaskId>, delay: Duration) -> Self {
        self.delays.insert(task.into(), delay);
        self
    }

    /// Make `task` report failure once its delay has elapsed.
    pub fn with_failure(mut self, task: impl Into<TaskId>) -> Self {
        self.failing.insert(task.into());
        self
    }

    pub fn delay_for(&self, task: &str) -> Duration {
        self.delays.get(task).copied().unwrap_or(self.default_delay)
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl WorkExecutor for SimulatedExecutor {
    fn execute(&self, task: &TaskNode) -> WorkFuture {
        let name = task.id().to_string();
        let delay = self.delay_for(&name);
        let fail = self.failing.contains(&name);

        Box::pin(async move {
            debug!(task = %name, ?delay, "simulating work");
            tokio::time::sleep(delay).await;

            if fail {
                info!(task = %name, "simulated work failed");
                TaskOutcome::Failed("simulated failure".to_string())
            } else {
                info!(task = %name, "simulated work finished");
                TaskOutcome::Success
            }
        })
    }
}
