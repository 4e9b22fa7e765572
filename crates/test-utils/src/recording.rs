use std::collections::HashSet;

use rundag::dag::DependencyGraph;
use rundag::engine::{RunEvent, RunOptions, RunReport, Scheduler};
use rundag::exec::WorkExecutor;

/// Run `graph` to completion and return the report plus every event the
/// coordinator published, in order.
pub async fn run_recorded<E>(
    graph: &DependencyGraph,
    executor: &E,
    options: RunOptions,
) -> (RunReport, Vec<RunEvent>)
where
    E: WorkExecutor + ?Sized,
{
    let mut events = Vec::new();
    let report = Scheduler::new(options)
        .run_with(
            graph,
            executor,
            &mut |event: &RunEvent| events.push(event.clone()),
            std::future::pending(),
        )
        .await
        .expect("run failed with a structural error");
    (report, events)
}

pub fn dispatched(events: &[RunEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Dispatched { task } => Some(task.clone()),
            _ => None,
        })
        .collect()
}

pub fn index_of(events: &[RunEvent], wanted: &RunEvent) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("event {wanted:?} not found in {events:?}"))
}

/// Every dispatch must come after a `Completed` event for each of the task's
/// dependencies, and no task may be dispatched twice.
pub fn assert_dispatch_respects_dependencies(graph: &DependencyGraph, events: &[RunEvent]) {
    let mut completed: HashSet<&str> = HashSet::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for event in events {
        match event {
            RunEvent::Completed { task } => {
                completed.insert(task);
            }
            RunEvent::Dispatched { task } => {
                assert!(seen.insert(task), "task {task} dispatched twice");
                let node = graph.node(task).expect("dispatched unknown task");
                for dep in node.dependencies() {
                    assert!(
                        completed.contains(dep.as_str()),
                        "task {task} dispatched before its dependency {dep} completed"
                    );
                }
            }
            RunEvent::Failed { .. } => {}
        }
    }
}
