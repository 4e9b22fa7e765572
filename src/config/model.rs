// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::DependencyGraph;
use crate::engine::{RunOptions, TaskId};
use crate::errors::Result;
use crate::exec::simulated::DEFAULT_DELAY;
use crate::exec::{ShellExecutor, SimulatedExecutor};
use crate::types::ExecutorKind;

/// Task file exactly as read from TOML, before validation.
///
/// ```toml
/// [config]
/// executor = "shell"
/// max_parallel = 2
/// timeout = "30s"
///
/// [task.build]
/// cmd = "cargo build"
///
/// [task.test]
/// cmd = "cargo test"
/// after = ["build"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Global run settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<id>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"simulated"` (default) or `"shell"`.
    #[serde(default)]
    pub executor: ExecutorKind,

    /// Simulated work time per task, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Maximum number of tasks running at once; unbounded if absent.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Abort the whole run after this long (e.g. `"30s"`).
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY.as_millis() as u64
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            executor: ExecutorKind::default(),
            delay_ms: default_delay_ms(),
            max_parallel: None,
            timeout: None,
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Tasks that must complete before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// Command run by the shell executor. Required when `executor = "shell"`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Per-task override of `[config].delay_ms` for the simulated executor.
    #[serde(default)]
    pub delay_ms: Option<u64>,

    /// Simulated executor only: report this task as failed.
    #[serde(default)]
    pub fail: bool,
}

/// A validated task file.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`, which
/// checks the global settings, the commands and the task graph itself.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    tasks: BTreeMap<String, TaskConfig>,
    timeout: Option<Duration>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        tasks: BTreeMap<String, TaskConfig>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            config,
            tasks,
            timeout,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.tasks
    }

    pub fn executor_kind(&self) -> ExecutorKind {
        self.config.executor
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            max_parallel: self.config.max_parallel,
            timeout: self.timeout,
        }
    }

    /// Build the dependency graph described by the `after` lists.
    pub fn graph(&self) -> Result<DependencyGraph> {
        build_graph(&self.tasks)
    }

    /// Commands for the shell executor, keyed by task id.
    pub fn commands(&self) -> BTreeMap<TaskId, String> {
        self.tasks
            .iter()
            .filter_map(|(name, task)| task.cmd.clone().map(|cmd| (name.clone(), cmd)))
            .collect()
    }

    pub fn shell_executor(&self) -> ShellExecutor {
        ShellExecutor::new(self.commands())
    }

    pub fn simulated_executor(&self) -> SimulatedExecutor {
        let default_delay = Duration::from_millis(self.config.delay_ms);
        self.tasks
            .iter()
            .fold(SimulatedExecutor::new(default_delay), |exec, (name, task)| {
                let exec = match task.delay_ms {
                    Some(ms) => exec.with_delay(name.clone(), Duration::from_millis(ms)),
                    None => exec,
                };
                if task.fail {
                    exec.with_failure(name.clone())
                } else {
                    exec
                }
            })
    }
}

pub(crate) fn build_graph(tasks: &BTreeMap<String, TaskConfig>) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    for (name, task) in tasks {
        graph.add_task(name.clone(), task.after.iter().cloned())?;
    }
    graph.build()?;
    Ok(graph)
}
