// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::DependencyGraph;
use crate::engine::{FailureCause, RunReport, Scheduler, TracingSink};
use crate::exec::WorkExecutor;
use crate::types::ExecutorKind;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task file loading and validation
/// - dependency graph build
/// - work executor selection
/// - the scheduler, with Ctrl-C as the shutdown signal
///
/// Returns `Ok(true)` when every task completed.
pub async fn run(args: CliArgs) -> Result<bool> {
    let cfg = load_and_validate(&args.config)?;
    let graph = cfg.graph()?;

    if args.dry_run {
        print_dry_run(&cfg, &graph)?;
        return Ok(true);
    }

    let mut options = cfg.run_options();
    options.max_parallel = args.max_parallel.or(options.max_parallel);
    options.timeout = args.timeout.or(options.timeout);
    let kind = args.executor.unwrap_or(cfg.executor_kind());
    let executor = build_executor(&cfg, kind, &config_root_dir(&args.config))?;

    info!(
        tasks = graph.len(),
        executor = ?kind,
        max_parallel = ?options.max_parallel,
        timeout = ?options.timeout,
        "starting rundag"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received; shutting down");
    };

    let scheduler = Scheduler::new(options);
    let report = scheduler
        .run_with(&graph, executor.as_ref(), &mut TracingSink, shutdown)
        .await?;

    print_summary(&report);
    Ok(report.is_success())
}

fn build_executor(
    cfg: &ConfigFile,
    kind: ExecutorKind,
    root_dir: &Path,
) -> Result<Box<dyn WorkExecutor>> {
    match kind {
        ExecutorKind::Simulated => Ok(Box::new(cfg.simulated_executor())),
        ExecutorKind::Shell => {
            // A `--executor shell` override skips the config-time check.
            let missing = cfg
                .tasks()
                .iter()
                .find_map(|(name, t)| t.cmd.is_none().then_some(name));
            if let Some(name) = missing {
                anyhow::bail!("task '{name}' has no `cmd`, which the shell executor requires");
            }
            Ok(Box::new(cfg.shell_executor().with_working_dir(root_dir)))
        }
    }
}

/// Commands run relative to the directory holding the task file.
///
/// A bare filename like "Rundag.toml" (parent = "") falls back to the current
/// working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: settings, tasks with their dependencies, and one valid
/// execution order.
fn print_dry_run(cfg: &ConfigFile, graph: &DependencyGraph) -> Result<()> {
    println!("rundag dry-run");
    println!("  config.executor = {:?}", cfg.executor_kind());
    println!("  config.delay_ms = {}", cfg.config().delay_ms);
    if let Some(n) = cfg.config().max_parallel {
        println!("  config.max_parallel = {n}");
    }
    if let Some(t) = cfg.timeout() {
        println!("  config.timeout = {t:?}");
    }
    println!();

    println!("tasks ({}):", graph.len());
    for node in graph.nodes() {
        println!("  - {}", node.id());
        if !node.dependencies().is_empty() {
            println!("      after: {:?}", node.dependencies());
        }
        if let Some(cmd) = cfg.tasks().get(node.id()).and_then(|t| t.cmd.as_deref()) {
            println!("      cmd: {cmd}");
        }
    }
    println!();

    let order = graph.topological_order()?;
    println!("order: {}", order.join(" -> "));

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "{} completed, {} failed in {:.2?}",
        report.completed.len(),
        report.failed.len(),
        report.elapsed
    );
    for (task, cause) in &report.failed {
        match cause {
            FailureCause::Execution(err) => println!("  FAILED  {task}: {}", err.reason),
            FailureCause::UpstreamFailed(_) => println!("  SKIPPED {task}: {cause}"),
            FailureCause::Aborted(_) => println!("  ABORTED {task}: {cause}"),
        }
    }
    for task in &report.never_ran {
        println!("  NOT RUN {task}");
    }
}
