//! Subprocess-backed tool invoker.
//!
//! Spawns the utility with `tokio::process`, captures stdout and stderr, and
//! waits for it to exit. An optional timeout bounds the wait; the child is
//! killed when the wait is abandoned.

use super::invoker::{ToolError, ToolInvoker, ToolOutput, ToolRequest};
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs utilities as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessToolInvoker {
    timeout: Option<Duration>,
}

impl ProcessToolInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon and kill any invocation running longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolInvoker for ProcessToolInvoker {
    async fn run(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError> {
        debug!("running: {}", request.display());

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args);
        if let Some(dir) = &request.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => ToolError::NotFound(request.program.clone()),
            _ => ToolError::Spawn {
                program: request.program.clone(),
                reason: e.to_string(),
            },
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| ToolError::TimedOut {
                    program: request.program.clone(),
                    secs: limit.as_secs(),
                })?,
            None => wait.await,
        }
        .map_err(|e| ToolError::Spawn {
            program: request.program.clone(),
            reason: e.to_string(),
        })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
