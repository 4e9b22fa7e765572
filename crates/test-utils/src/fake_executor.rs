use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rundag::dag::TaskNode;
use rundag::engine::TaskOutcome;
use rundag::exec::{WorkExecutor, WorkFuture};

/// What the fake executor saw, in wall-clock order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecRecord {
    Started(String),
    Finished(String),
}

/// A fake executor that:
/// - records when each task's work starts and finishes
/// - tracks the highest number of tasks running at once
/// - sleeps for a per-task delay (yields once if none is set)
/// - fails or panics for the tasks it is told to.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    records: Arc<Mutex<Vec<ExecRecord>>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, task: &str, delay: Duration) -> Self {
        self.delays.insert(task.to_string(), delay);
        self
    }

    pub fn with_failure(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    pub fn with_panic(mut self, task: &str) -> Self {
        self.panicking.insert(task.to_string());
        self
    }

    pub fn records(&self) -> Vec<ExecRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Task ids in the order their work started.
    pub fn started(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                ExecRecord::Started(t) => Some(t),
                ExecRecord::Finished(_) => None,
            })
            .collect()
    }

    pub fn position(&self, record: &ExecRecord) -> Option<usize> {
        self.records().iter().position(|r| r == record)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

impl WorkExecutor for ScriptedExecutor {
    fn execute(&self, task: &TaskNode) -> WorkFuture {
        let name = task.id().to_string();
        let delay = self.delays.get(&name).copied();
        let fail = self.failing.contains(&name);
        let panic = self.panicking.contains(&name);
        let records = Arc::clone(&self.records);
        let running = Arc::clone(&self.running);
        let max_running = Arc::clone(&self.max_running);

        Box::pin(async move {
            records.lock().unwrap().push(ExecRecord::Started(name.clone()));
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            max_running.fetch_max(now, Ordering::SeqCst);

            match delay {
                Some(d) => tokio::time::sleep(d).await,
                None => tokio::task::yield_now().await,
            }

            running.fetch_sub(1, Ordering::SeqCst);
            records.lock().unwrap().push(ExecRecord::Finished(name.clone()));

            if panic {
                panic!("scripted panic in task {name}");
            }
            if fail {
                TaskOutcome::Failed(format!("scripted failure of {name}"))
            } else {
                TaskOutcome::Success
            }
        })
    }
}
