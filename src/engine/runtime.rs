// src/engine/runtime.rs

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::dag::DependencyGraph;
use crate::errors::{Result, RundagError};
use crate::exec::WorkExecutor;

use super::core::{CoreRuntime, CoreStep};
use super::events::{EventSink, TracingSink};
use super::{RunOptions, RunReport, TaskId, TaskOutcome};

/// Completion message sent by every dispatched task, exactly once.
#[derive(Debug)]
struct Completion {
    task: TaskId,
    outcome: TaskOutcome,
}

/// Runs a built [`DependencyGraph`] to completion.
///
/// This is the async IO shell around [`CoreRuntime`], which owns all the
/// scheduling decisions. The shell only spawns work, waits for the next
/// completion and forwards events to the sink.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    options: RunOptions,
}

impl Scheduler {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Run every task of `graph`, logging events through [`TracingSink`].
    pub async fn run<E>(&self, graph: &DependencyGraph, executor: &E) -> Result<RunReport>
    where
        E: WorkExecutor + ?Sized,
    {
        self.run_with(graph, executor, &mut TracingSink, std::future::pending())
            .await
    }

    /// Run every task of `graph`, publishing events to `sink`.
    ///
    /// If `shutdown` resolves before the run finishes, in-flight work is
    /// aborted and every unfinished task is reported as failed.
    pub async fn run_with<E, S, F>(
        &self,
        graph: &DependencyGraph,
        executor: &E,
        sink: &mut S,
        shutdown: F,
    ) -> Result<RunReport>
    where
        E: WorkExecutor + ?Sized,
        S: EventSink + ?Sized,
        F: Future<Output = ()>,
    {
        // Structural problems surface here, before anything is dispatched.
        let mut core = CoreRuntime::new(graph, self.options)?;

        let started = Instant::now();
        // A timeout too large to represent as an instant never fires.
        let deadline = self.options.timeout.and_then(|t| started.checked_add(t));

        let (tx, mut rx) = mpsc::channel::<Completion>(graph.len().max(1));
        let mut in_flight: HashMap<TaskId, AbortHandle> = HashMap::new();

        let step = core.start();
        dispatch(step, executor, sink, &tx, &mut in_flight);

        let deadline_reached = wait_for_deadline(deadline);
        tokio::pin!(deadline_reached);
        tokio::pin!(shutdown);

        while core.has_outstanding() {
            tokio::select! {
                maybe = rx.recv() => {
                    let Some(done) = maybe else {
                        // We hold a sender, so this cannot happen while work is outstanding.
                        error!("completion channel closed with work outstanding");
                        return Err(RundagError::Other(anyhow::anyhow!(
                            "completion channel closed unexpectedly"
                        )));
                    };

                    in_flight.remove(&done.task);
                    debug!(task = %done.task, outcome = ?done.outcome, "completion observed");
                    let step = core.on_completion(&done.task, done.outcome);
                    dispatch(step, executor, sink, &tx, &mut in_flight);
                }
                _ = &mut deadline_reached => {
                    let reason = format!(
                        "timeout of {:?} exceeded",
                        self.options.timeout.unwrap_or_default()
                    );
                    abort_in_flight(&mut in_flight);
                    publish(&core.abort(&reason), sink);
                }
                _ = &mut shutdown => {
                    abort_in_flight(&mut in_flight);
                    publish(&core.abort("shutdown requested"), sink);
                }
            }
        }

        let report = core.into_report(started.elapsed());
        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            never_ran = report.never_ran.len(),
            elapsed = ?report.elapsed,
            "run finished"
        );
        Ok(report)
    }
}

/// Publish the step's events, then spawn the work it asks for.
///
/// Each task body runs in its own Tokio task. A second, lightweight task waits
/// on it and sends exactly one [`Completion`], turning a panic or abort into a
/// failed outcome so the coordinator never waits on a completion that will
/// not arrive.
fn dispatch<E, S>(
    step: CoreStep<'_>,
    executor: &E,
    sink: &mut S,
    tx: &mpsc::Sender<Completion>,
    in_flight: &mut HashMap<TaskId, AbortHandle>,
) where
    E: WorkExecutor + ?Sized,
    S: EventSink + ?Sized,
{
    publish(&step, sink);

    for node in step.dispatch {
        let task = node.id().to_string();
        let work = tokio::spawn(executor.execute(node));
        in_flight.insert(task.clone(), work.abort_handle());

        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = match work.await {
                Ok(outcome) => outcome,
                Err(err) if err.is_panic() => TaskOutcome::Failed("task panicked".to_string()),
                Err(err) => TaskOutcome::Failed(format!("task did not finish: {err}")),
            };
            // The coordinator is gone once the run has been aborted.
            let _ = tx.send(Completion { task, outcome }).await;
        });
    }
}

fn publish<S: EventSink + ?Sized>(step: &CoreStep<'_>, sink: &mut S) {
    for event in &step.events {
        sink.on_event(event);
    }
}

fn abort_in_flight(in_flight: &mut HashMap<TaskId, AbortHandle>) {
    for (task, handle) in in_flight.drain() {
        debug!(task = %task, "aborting in-flight work");
        handle.abort();
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
