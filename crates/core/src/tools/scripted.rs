//! Scripted tool invoker for testing.

use super::invoker::{ToolError, ToolInvoker, ToolOutput, ToolRequest};
use crate::boot::locator::copy_dir_recursive;
use async_trait::async_trait;
use bk_protocol::config_models::ToolsConfig;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Side effect applied when a scripted tool "runs", e.g. populating the
/// extract directory the way the real extractor would.
pub type ToolEffect = Arc<dyn Fn(&ToolRequest) -> io::Result<()> + Send + Sync>;

/// Canned result for one program.
#[derive(Clone)]
pub struct ScriptedResponse {
    result: Result<ToolOutput, ToolError>,
    effect: Option<ToolEffect>,
}

impl fmt::Debug for ScriptedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedResponse")
            .field("result", &self.result)
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

impl ScriptedResponse {
    /// Exit 0 with empty output.
    pub fn success() -> Self {
        Self::exit(0, "")
    }

    /// Exit with `code`, reporting `stderr`.
    pub fn exit(code: i32, stderr: &str) -> Self {
        Self {
            result: Ok(ToolOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
            effect: None,
        }
    }

    /// Fail before producing an exit status.
    pub fn error(error: ToolError) -> Self {
        Self {
            result: Err(error),
            effect: None,
        }
    }

    /// Run `effect` before returning the canned result.
    ///
    /// An effect that fails turns the response into exit code 1 with the
    /// I/O error as stderr.
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&ToolRequest) -> io::Result<()> + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }
}

/// Tool invoker that returns canned results per program name and records
/// every request it receives.
///
/// Programs without a script fail with [`ToolError::NotFound`].
#[derive(Clone, Default)]
pub struct ScriptedToolInvoker {
    responses: HashMap<String, ScriptedResponse>,
    calls: Arc<Mutex<Vec<ToolRequest>>>,
}

impl ScriptedToolInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for `program`.
    pub fn on(mut self, program: &str, response: ScriptedResponse) -> Self {
        self.responses.insert(program.to_string(), response);
        self
    }

    /// All requests received so far, in order.
    pub fn calls(&self) -> Vec<ToolRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Program names of all requests received so far, in order.
    pub fn programs_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.program).collect()
    }

    /// A toolchain that behaves like the real utilities on the file system.
    ///
    /// The extractor writes `image_files` (relative path, content) into its
    /// `-o` target, the synchronizer copies its source tree to its
    /// destination and the author writes a small file at its `-o` path.
    pub fn iso_toolchain(tools: &ToolsConfig, image_files: &[(&str, &[u8])]) -> Self {
        let files: Vec<(PathBuf, Vec<u8>)> = image_files
            .iter()
            .map(|(path, content)| (PathBuf::from(path), content.to_vec()))
            .collect();

        Self::new()
            .on(
                &tools.extract,
                ScriptedResponse::success().with_effect(move |request| {
                    let dest = request
                        .args
                        .iter()
                        .find_map(|arg| arg.strip_prefix("-o"))
                        .map(PathBuf::from)
                        .ok_or_else(|| io::Error::other("missing -o argument"))?;
                    for (rel, content) in &files {
                        let path = dest.join(rel);
                        if let Some(parent) = path.parent() {
                            fs::create_dir_all(parent)?;
                        }
                        fs::write(path, content)?;
                    }
                    Ok(())
                }),
            )
            .on(
                &tools.sync,
                ScriptedResponse::success().with_effect(|request| {
                    let [_, src, dst] = request.args.as_slice() else {
                        return Err(io::Error::other("expected: -av <src>/ <dst>/"));
                    };
                    copy_dir_recursive(Path::new(src), Path::new(dst)).map_err(io::Error::other)
                }),
            )
            .on(
                &tools.author,
                ScriptedResponse::success().with_effect(|request| {
                    let output = request
                        .args
                        .iter()
                        .position(|arg| arg == "-o")
                        .and_then(|i| request.args.get(i + 1))
                        .ok_or_else(|| io::Error::other("missing -o argument"))?;
                    fs::write(output, b"ISO9660")
                }),
            )
    }
}

#[async_trait]
impl ToolInvoker for ScriptedToolInvoker {
    async fn run(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let Some(response) = self.responses.get(&request.program) else {
            return Err(ToolError::NotFound(request.program.clone()));
        };

        if let Some(effect) = &response.effect {
            if let Err(e) = effect(request) {
                return Ok(ToolOutput {
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: e.to_string(),
                });
            }
        }

        response.result.clone()
    }
}
