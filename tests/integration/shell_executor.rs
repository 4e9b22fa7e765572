// tests/integration/shell_executor.rs

#![cfg(unix)]

use std::collections::BTreeMap;

use rundag::engine::{FailureCause, RunOptions, Scheduler};
use rundag::exec::ShellExecutor;
use rundag::types::ExecutorKind;
use rundag_test_utils::builders::{built_graph, ConfigFileBuilder, TaskConfigBuilder};
use rundag_test_utils::recording::{assert_dispatch_respects_dependencies, run_recorded};
use rundag_test_utils::{init_tracing, with_timeout};

fn commands(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(task, cmd)| (task.to_string(), cmd.to_string()))
        .collect()
}

#[tokio::test]
async fn exit_status_maps_to_outcome() {
    init_tracing();

    let graph = built_graph(&[("ok", &[]), ("bad", &[]), ("after_bad", &["bad"])]);
    let executor = ShellExecutor::new(commands(&[
        ("ok", "true"),
        ("bad", "exit 3"),
        ("after_bad", "true"),
    ]));

    let (report, _) = with_timeout(run_recorded(&graph, &executor, RunOptions::default())).await;

    assert!(report.completed.contains("ok"));
    match report.failed.get("bad") {
        Some(FailureCause::Execution(err)) => assert!(err.reason.contains('3'), "{}", err.reason),
        other => panic!("expected execution failure, got {other:?}"),
    }
    assert_eq!(
        report.failed.get("after_bad"),
        Some(&FailureCause::UpstreamFailed("bad".to_string()))
    );
}

#[tokio::test]
async fn commands_run_in_dependency_order_inside_working_dir() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .with_executor(ExecutorKind::Shell)
        .with_task("first", TaskConfigBuilder::new().cmd("echo first >> log.txt").build())
        .with_task(
            "second",
            TaskConfigBuilder::new()
                .after("first")
                .cmd("echo second >> log.txt")
                .build(),
        )
        .with_task(
            "third",
            TaskConfigBuilder::new()
                .after("second")
                .cmd("echo third >> log.txt")
                .build(),
        )
        .build();
    let graph = cfg.graph().unwrap();
    let executor = cfg.shell_executor().with_working_dir(dir.path());

    let (report, events) =
        with_timeout(run_recorded(&graph, &executor, RunOptions::default())).await;

    assert!(report.is_success(), "report: {report:?}");
    assert_dispatch_respects_dependencies(&graph, &events);
    let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
    assert_eq!(log.lines().collect::<Vec<_>>(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn task_without_command_fails() {
    init_tracing();

    let graph = built_graph(&[("orphan", &[])]);
    let executor = ShellExecutor::new(BTreeMap::new());

    let report = with_timeout(Scheduler::default().run(&graph, &executor))
        .await
        .unwrap();

    assert!(matches!(
        report.failed.get("orphan"),
        Some(FailureCause::Execution(_))
    ));
}
