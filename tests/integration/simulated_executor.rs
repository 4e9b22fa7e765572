// tests/integration/simulated_executor.rs

use std::time::{Duration, Instant};

use rundag::engine::{FailureCause, RunOptions};
use rundag::exec::SimulatedExecutor;
use rundag_test_utils::builders::{built_graph, ConfigFileBuilder, TaskConfigBuilder};
use rundag_test_utils::recording::run_recorded;
use rundag_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn independent_tasks_overlap() {
    init_tracing();

    let graph = built_graph(&[("a", &[]), ("b", &[]), ("c", &[]), ("d", &["a", "b", "c"])]);
    let executor = SimulatedExecutor::new(Duration::from_millis(200));

    let started = Instant::now();
    let (report, _) = with_timeout(run_recorded(&graph, &executor, RunOptions::default())).await;
    let elapsed = started.elapsed();

    assert!(report.is_success());
    // Two levels of 200ms each; sequential execution would take 800ms.
    assert!(elapsed >= Duration::from_millis(400), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(700), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn scripted_failure_from_config() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_delay_ms(10)
        .with_task("compile", TaskConfigBuilder::new().fail(true).build())
        .with_task("link", TaskConfigBuilder::new().after("compile").build())
        .with_task("docs", TaskConfigBuilder::new().delay_ms(1).build())
        .build();
    let graph = cfg.graph().unwrap();

    let (report, _) = with_timeout(run_recorded(
        &graph,
        &cfg.simulated_executor(),
        cfg.run_options(),
    ))
    .await;

    assert!(report.completed.contains("docs"));
    assert!(matches!(
        report.failed.get("compile"),
        Some(FailureCause::Execution(_))
    ));
    assert_eq!(
        report.failed.get("link"),
        Some(&FailureCause::UpstreamFailed("compile".to_string()))
    );
}
