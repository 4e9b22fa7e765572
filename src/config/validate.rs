// src/config/validate.rs

use crate::config::model::{build_graph, ConfigFile, RawConfigFile};
use crate::errors::{Result, RundagError};
use crate::types::{parse_duration, ExecutorKind};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RundagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let timeout = parse_timeout(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task, timeout))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_commands(cfg)?;
    validate_graph(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(RundagError::ConfigError(
            "config must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // `executor` is strongly typed and validated during deserialization.

    if cfg.config.max_parallel == Some(0) {
        return Err(RundagError::ConfigError(
            "[config].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }

    parse_timeout(cfg)?;
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.executor != ExecutorKind::Shell {
        return Ok(());
    }

    for (name, task) in cfg.task.iter() {
        let has_cmd = task.cmd.as_deref().is_some_and(|c| !c.trim().is_empty());
        if !has_cmd {
            return Err(RundagError::ConfigError(format!(
                "task '{}' has no `cmd`, which the shell executor requires",
                name
            )));
        }
    }
    Ok(())
}

/// Unknown dependencies and cycles are reported with the graph's own errors.
fn validate_graph(cfg: &RawConfigFile) -> Result<()> {
    build_graph(&cfg.task).map(|_| ())
}

fn parse_timeout(cfg: &RawConfigFile) -> Result<Option<std::time::Duration>> {
    cfg.config
        .timeout
        .as_deref()
        .map(|s| {
            parse_duration(s)
                .map_err(|e| RundagError::ConfigError(format!("[config].timeout: {e}")))
        })
        .transpose()
}
