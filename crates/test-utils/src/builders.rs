#![allow(dead_code)]

use std::collections::BTreeMap;

use rundag::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use rundag::dag::DependencyGraph;
use rundag::errors::Result;
use rundag::types::ExecutorKind;

/// Build and `build()` a graph from `(id, dependencies)` pairs.
///
/// Panics on structural errors; use `DependencyGraph` directly to test those.
pub fn built_graph(tasks: &[(&str, &[&str])]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (id, deps) in tasks {
        graph
            .add_task(*id, deps.iter().copied())
            .expect("add_task failed in test graph");
    }
    graph.build().expect("test graph failed to build");
    graph
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_executor(mut self, kind: ExecutorKind) -> Self {
        self.config.config.executor = kind;
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.config.config.delay_ms = ms;
        self
    }

    pub fn with_max_parallel(mut self, n: usize) -> Self {
        self.config.config.max_parallel = Some(n);
        self
    }

    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.config.timeout = Some(timeout.to_string());
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig {
                after: vec![],
                cmd: None,
                delay_ms: None,
                fail: false,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.task.delay_ms = Some(ms);
        self
    }

    pub fn fail(mut self, val: bool) -> Self {
        self.task.fail = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
