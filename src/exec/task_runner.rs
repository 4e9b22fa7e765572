// src/exec/task_runner.rs

//! Shell command work executor.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::dag::TaskNode;
use crate::engine::{TaskId, TaskOutcome};
use crate::exec::backend::{WorkExecutor, WorkFuture};

/// Runs one shell command per task.
///
/// Processes are started with `kill_on_drop(true)`, so aborting the work
/// future (deadline, Ctrl-C) also kills the child.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    commands: BTreeMap<TaskId, String>,
    working_dir: Option<PathBuf>,
}

impl ShellExecutor {
    pub fn new(commands: BTreeMap<TaskId, String>) -> Self {
        Self {
            commands,
            working_dir: None,
        }
    }

    /// Run every command from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl WorkExecutor for ShellExecutor {
    fn execute(&self, task: &TaskNode) -> WorkFuture {
        let name = task.id().to_string();
        let cmd = self.commands.get(&name).cloned();
        let working_dir = self.working_dir.clone();

        Box::pin(async move {
            let Some(cmd) = cmd else {
                error!(task = %name, "no command configured for task");
                return TaskOutcome::Failed("no command configured".to_string());
            };

            match run_command(&name, &cmd, working_dir).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(task = %name, error = %err, "task execution error");
                    TaskOutcome::Failed(format!("{err:#}"))
                }
            }
        })
    }
}

/// Run `cmd` through the platform shell and map its exit status to an outcome.
async fn run_command(task: &str, cmd: &str, working_dir: Option<PathBuf>) -> Result<TaskOutcome> {
    info!(task = %task, cmd = %cmd, "starting task process");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;

    // Always consume both pipes so the child never blocks on a full buffer.
    if let Some(stdout) = child.stdout.take() {
        let task_name = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(task = %task_name, "stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let task_name = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task}'"))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    if status.success() {
        Ok(TaskOutcome::Success)
    } else {
        Ok(TaskOutcome::Failed(format!("exited with status {code}")))
    }
}
