//! Submission and retrieval of images.
//!
//! [`ImageService`] is the single entry point the HTTP layer and the CLI
//! talk to. It validates and stores uploads, drives the
//! [`PipelineEngine`] for each submission under its own run, and answers
//! the polling queries.

pub mod error;
pub mod filename;

pub use error::ServiceError;
pub use filename::{has_allowed_extension, is_plain_file_name, sanitize_filename};

use crate::engine::{PipelineEngine, PipelineRequest};
use crate::state::registry::{RunHandle, RunRegistry};
use crate::state::tracker::StepTracker;
use crate::tools::{ProcessToolInvoker, ToolInvoker};
use bk_protocol::api_models::{
    step_status_response, ProductInfoResponse, StepStatusResponse, SubmitResponse,
};
use bk_protocol::config_models::ServiceConfig;
use bk_protocol::run_models::{PipelineResult, RunSnapshot};
use bk_protocol::step_models::{StepKey, StepStatus};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Stored name used when sanitizing leaves nothing.
const FALLBACK_UPLOAD_NAME: &str = "upload.iso";

/// Result of one submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Turned away before a run was created.
    Rejected(ServiceError),

    /// The pipeline produced `output_path`.
    Completed { run_id: Uuid, output_path: PathBuf },

    /// The run ended with `error`.
    Failed { run_id: Uuid, error: String },
}

impl SubmitOutcome {
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            SubmitOutcome::Rejected(_) => None,
            SubmitOutcome::Completed { run_id, .. } | SubmitOutcome::Failed { run_id, .. } => {
                Some(*run_id)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Completed { .. })
    }

    /// Render as the upload endpoint's response body.
    pub fn to_response(&self) -> SubmitResponse {
        match self {
            SubmitOutcome::Rejected(err) => SubmitResponse::failed(None, err.to_string()),
            SubmitOutcome::Completed {
                run_id,
                output_path,
            } => {
                let file = output_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                SubmitResponse::succeeded(*run_id, file)
            }
            SubmitOutcome::Failed { run_id, error } => {
                SubmitResponse::failed(Some(*run_id), error.clone())
            }
        }
    }
}

/// Owns the configuration, the run registry and the engine.
pub struct ImageService {
    config: ServiceConfig,
    registry: RunRegistry,
    engine: Arc<PipelineEngine>,
}

impl ImageService {
    /// Create a service that drives the utilities through `invoker`.
    pub fn new(config: ServiceConfig, invoker: Arc<dyn ToolInvoker>) -> Self {
        let engine = Arc::new(PipelineEngine::new(invoker, &config));
        let registry = RunRegistry::new(config.max_retained_runs);
        Self {
            config,
            registry,
            engine,
        }
    }

    /// Create a service that spawns the configured utilities as child
    /// processes.
    pub fn with_process_tools(config: ServiceConfig) -> Self {
        let invoker = ProcessToolInvoker::new()
            .with_timeout(config.tools.timeout_secs.map(Duration::from_secs));
        Self::new(config, Arc::new(invoker))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// Create the upload and output directories if they are missing.
    pub async fn prepare_dirs(&self) -> Result<(), ServiceError> {
        for dir in [&self.config.upload_dir, &self.config.output_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| ServiceError::PrepareDir {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Store an uploaded image and convert it.
    ///
    /// Resolves once the run has finished. Processing runs on its own task,
    /// so dropping this future after the upload is stored does not stop the
    /// run; dropping it while the payload is still arriving fails the run.
    /// The stored input is removed on every path.
    ///
    /// # Arguments
    ///
    /// * `filename` - Name the client gave the file
    /// * `payload` - The file content
    /// * `run_id` - Client-chosen run id; a fresh one is used when absent
    pub async fn submit<R>(&self, filename: &str, payload: R, run_id: Option<Uuid>) -> SubmitOutcome
    where
        R: AsyncRead + Unpin + Send,
    {
        if filename.trim().is_empty() {
            return SubmitOutcome::Rejected(ServiceError::NoFileSelected);
        }
        if !has_allowed_extension(filename) {
            return SubmitOutcome::Rejected(ServiceError::InvalidFileType);
        }

        let run = self.registry.begin_run(run_id).await;
        run.update(
            StepKey::Upload,
            StepStatus::InProgress,
            "Uploading ISO file...",
        )
        .await;

        let mut sanitized = sanitize_filename(filename);
        if sanitized.is_empty() {
            sanitized = FALLBACK_UPLOAD_NAME.to_string();
        }
        let tag = Uuid::new_v4().simple().to_string();
        let stored = self
            .config
            .upload_dir
            .join(format!("{}_{}", &tag[..8], sanitized));

        let mut guard = UploadGuard::new(run.clone(), stored.clone());
        let written = match self.store(payload, &stored).await {
            Ok(written) => written,
            Err(err) => {
                guard.disarm();
                remove_input(&stored).await;
                return self.fail_upload(&run, err).await;
            }
        };
        guard.disarm();
        info!(
            "Run {} received {} ({} bytes)",
            run.id(),
            stored.display(),
            written
        );

        let request = PipelineRequest {
            input_path: stored.clone(),
            source_name: sanitized,
            output_dir: self.config.output_dir.clone(),
        };
        let engine = Arc::clone(&self.engine);
        let task_run = run.clone();
        let task = tokio::spawn(async move {
            task_run
                .update(
                    StepKey::Upload,
                    StepStatus::Completed,
                    "File uploaded successfully",
                )
                .await;
            let result = engine.run(&task_run, &request).await;
            remove_input(&request.input_path).await;
            result
        });

        let result = match task.await {
            Ok(result) => result,
            Err(err) => {
                warn!("Run {} processing task ended abnormally: {}", run.id(), err);
                remove_input(&stored).await;
                let error = format!("Processing aborted: {err}");
                run.update(
                    StepKey::Complete,
                    StepStatus::Error,
                    format!("Processing failed: {error}"),
                )
                .await;
                run.finish().await;
                PipelineResult::Failure { error }
            }
        };

        match result {
            PipelineResult::Success { output_path } => SubmitOutcome::Completed {
                run_id: run.id(),
                output_path,
            },
            PipelineResult::Failure { error } => SubmitOutcome::Failed {
                run_id: run.id(),
                error,
            },
        }
    }

    async fn store<R>(&self, payload: R, path: &Path) -> Result<u64, ServiceError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let limit = self.config.max_upload_bytes;
        let store_err = |source| ServiceError::Store {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(store_err)?;
        }
        let mut file = tokio::fs::File::create(path).await.map_err(store_err)?;
        let mut limited = payload.take(limit.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(store_err)?;
        file.flush().await.map_err(store_err)?;

        if written > limit {
            return Err(ServiceError::TooLarge { limit });
        }
        Ok(written)
    }

    async fn fail_upload(&self, run: &RunHandle, err: ServiceError) -> SubmitOutcome {
        record_upload_failure(run, &err).await;
        SubmitOutcome::Failed {
            run_id: run.id(),
            error: err.to_string(),
        }
    }

    /// Resolve a produced image by its bare file name.
    ///
    /// Names with separators or naming `.`/`..` are refused, as are paths
    /// that are not regular files.
    pub fn artifact_path(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_file_name(name) {
            return None;
        }
        let path = self.config.output_dir.join(name);
        path.is_file().then_some(path)
    }

    /// Stage records of `run_id`, or of the latest run when `None`.
    ///
    /// An unknown id yields `None`. With no runs at all every stage reads
    /// pending.
    pub async fn step_status(&self, run_id: Option<Uuid>) -> Option<StepStatusResponse> {
        match self.resolve(run_id).await? {
            Some(run) => Some(step_status_response(&run.steps().await)),
            None => Some(step_status_response(&StepTracker::new().snapshot())),
        }
    }

    /// Product metadata of `run_id`, or of the latest run when `None`.
    pub async fn product_info(&self, run_id: Option<Uuid>) -> Option<ProductInfoResponse> {
        match self.resolve(run_id).await? {
            Some(run) => Some(run.product_info_response().await),
            None => Some(StepTracker::new().product_info_response()),
        }
    }

    /// Full state of one run.
    pub async fn snapshot(&self, run_id: Uuid) -> Option<RunSnapshot> {
        self.registry.snapshot(run_id).await
    }

    /// Outer `None`: the requested run is unknown. Inner `None`: no run was
    /// requested and none exists yet.
    async fn resolve(&self, run_id: Option<Uuid>) -> Option<Option<RunHandle>> {
        match run_id {
            Some(id) => self.registry.get(id).await.map(Some),
            None => Some(self.registry.latest().await),
        }
    }
}

async fn record_upload_failure(run: &RunHandle, err: &ServiceError) {
    warn!("Run {} upload failed: {}", run.id(), err);
    run.update(
        StepKey::Upload,
        StepStatus::Error,
        format!("Upload failed: {err}"),
    )
    .await;
    run.update(
        StepKey::Complete,
        StepStatus::Error,
        format!("Processing failed: {err}"),
    )
    .await;
    run.finish().await;
}

/// Fails the run and removes the partial input if the upload is dropped
/// before it was stored.
struct UploadGuard {
    run: Option<RunHandle>,
    path: PathBuf,
}

impl UploadGuard {
    fn new(run: RunHandle, path: PathBuf) -> Self {
        Self {
            run: Some(run),
            path,
        }
    }

    fn disarm(&mut self) {
        self.run = None;
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove input {}: {}", self.path.display(), e),
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    record_upload_failure(&run, &ServiceError::Cancelled).await;
                });
            }
            Err(_) => warn!("Run {} upload was cancelled outside a runtime", run.id()),
        }
    }
}

async fn remove_input(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove input {}: {}", path.display(), e),
    }
}
