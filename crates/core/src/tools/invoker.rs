//! Tool invocation seam and supporting types.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single external utility invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub program: String,
    pub args: Vec<String>,

    /// Working directory of the child process.
    ///
    /// Always explicit; the engine never relies on the process-wide current
    /// directory.
    pub working_dir: Option<PathBuf>,
}

impl ToolRequest {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Command line for log messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured output of a finished utility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Errors raised before a utility produced an exit status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Command not found: {0}")]
    NotFound(String),
    #[error("Failed to run '{program}': {reason}")]
    Spawn { program: String, reason: String },
    #[error("'{program}' did not finish within {secs} seconds")]
    TimedOut { program: String, secs: u64 },
}

/// Runs external utilities to completion.
///
/// The engine only needs arguments in and exit status plus diagnostics out,
/// so tests substitute [`ScriptedToolInvoker`](super::ScriptedToolInvoker).
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn run(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError>;
}
