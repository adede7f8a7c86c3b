//! Pipeline execution engine.
//!
//! The PipelineEngine turns one uploaded image into a bootable image. It
//! walks the stages in order, reporting each transition on the run's
//! [`RunHandle`], and stops at the first fatal error. Temporary directories
//! are removed on every path once setup succeeded.

pub mod error;
pub mod workspace;

pub use error::PipelineError;
pub use workspace::{resolve_tmp_base, RunWorkspace};

use crate::boot::{self, ListingLimits};
use crate::product::parse_iso_filename;
use crate::state::registry::RunHandle;
use crate::tools::{ToolCommands, ToolInvoker, ToolOutput, ToolRequest};
use bk_protocol::config_models::ServiceConfig;
use bk_protocol::run_models::PipelineResult;
use bk_protocol::step_models::{StepKey, StepStatus};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the marker file carrying the original image file name.
pub const NAME_MARKER_FILE: &str = "isofilename";

/// Listing entries included in the copy stage progress message.
const LISTING_PREVIEW: usize = 10;

/// Input of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    /// The image to convert.
    pub input_path: PathBuf,
    /// Name used when the image carries no marker file.
    pub source_name: String,
    /// Directory the produced image is written to.
    pub output_dir: PathBuf,
}

/// The main pipeline execution engine.
///
/// The engine holds no per-run state, so one instance can drive any number
/// of concurrent runs.
pub struct PipelineEngine {
    invoker: Arc<dyn ToolInvoker>,
    commands: ToolCommands,
    tmp_base: Option<PathBuf>,
    output_prefix: String,
    listing: ListingLimits,
}

impl PipelineEngine {
    /// Create a new PipelineEngine.
    ///
    /// # Arguments
    ///
    /// * `invoker` - Runs the external utilities
    /// * `config` - Tool names, output prefix and temp directory parent
    pub fn new(invoker: Arc<dyn ToolInvoker>, config: &ServiceConfig) -> Self {
        Self {
            invoker,
            commands: ToolCommands::new(config.tools.clone()),
            tmp_base: resolve_tmp_base(config.tmp_base.as_deref()),
            output_prefix: config.output_prefix.clone(),
            listing: ListingLimits::default(),
        }
    }

    /// Override the caps of the diagnostic tree listing.
    pub fn with_listing_limits(mut self, limits: ListingLimits) -> Self {
        self.listing = limits;
        self
    }

    /// Execute the pipeline for one image.
    ///
    /// Stage transitions are written to `run` as they happen. Setup,
    /// cleanup and complete always end in a terminal status; stages after
    /// a failure stay pending.
    ///
    /// # Arguments
    ///
    /// * `run` - Run record receiving stage updates and product metadata
    /// * `request` - The image, its fallback name and the output directory
    ///
    /// # Returns
    ///
    /// The produced image path, or the error that ended the run.
    pub async fn run(&self, run: &RunHandle, request: &PipelineRequest) -> PipelineResult {
        info!(
            "Run {} started for {}",
            run.id(),
            request.input_path.display()
        );

        run.update(
            StepKey::Setup,
            StepStatus::InProgress,
            "Creating temporary directories...",
        )
        .await;

        let workspace = match RunWorkspace::create(self.tmp_base.as_deref()) {
            Ok(workspace) => workspace,
            Err(e) => {
                let err = PipelineError::Setup(e.to_string());
                run.update(StepKey::Setup, StepStatus::Error, err.to_string())
                    .await;
                run.update(StepKey::Cleanup, StepStatus::Completed, "Nothing to clean up")
                    .await;
                return self.conclude(run, Err(err)).await;
            }
        };
        debug!(
            "Run {} workspace: mount={} work={}",
            run.id(),
            workspace.mount_dir().display(),
            workspace.work_dir().display()
        );
        run.update(
            StepKey::Setup,
            StepStatus::Completed,
            "Temporary directories created successfully",
        )
        .await;

        let outcome = self.execute_stages(run, request, &workspace).await;
        if let Err(err) = &outcome {
            run.update(err.stage(), StepStatus::Error, err.to_string())
                .await;
        }

        run.update(
            StepKey::Cleanup,
            StepStatus::InProgress,
            "Cleaning up temporary files...",
        )
        .await;
        let failures = workspace.cleanup();
        if failures.is_empty() {
            run.update(
                StepKey::Cleanup,
                StepStatus::Completed,
                "Cleanup completed successfully",
            )
            .await;
        } else {
            for failure in &failures {
                warn!("Run {}: failed to remove {}", run.id(), failure);
            }
            run.update(
                StepKey::Cleanup,
                StepStatus::Completed,
                "Cleanup completed with warnings",
            )
            .await;
        }

        self.conclude(run, outcome).await
    }

    async fn conclude(
        &self,
        run: &RunHandle,
        outcome: Result<PathBuf, PipelineError>,
    ) -> PipelineResult {
        let result = match outcome {
            Ok(output_path) => {
                run.update(
                    StepKey::Complete,
                    StepStatus::Completed,
                    "Processing completed successfully!",
                )
                .await;
                info!("Run {} produced {}", run.id(), output_path.display());
                PipelineResult::Success { output_path }
            }
            Err(err) => {
                run.update(
                    StepKey::Complete,
                    StepStatus::Error,
                    format!("Processing failed: {err}"),
                )
                .await;
                error!("Run {} failed: {}", run.id(), err);
                PipelineResult::Failure {
                    error: err.to_string(),
                }
            }
        };
        run.finish().await;
        result
    }

    async fn execute_stages(
        &self,
        run: &RunHandle,
        request: &PipelineRequest,
        workspace: &RunWorkspace,
    ) -> Result<PathBuf, PipelineError> {
        self.extract(run, &request.input_path, workspace.mount_dir())
            .await?;
        self.copy(run, workspace.mount_dir(), workspace.work_dir())
            .await?;
        let output_path = self.analyze(run, request, workspace.work_dir()).await;
        self.install_bootloader(run, workspace.mount_dir(), workspace.work_dir())
            .await?;
        self.generate(run, workspace.work_dir(), &output_path)
            .await
    }

    async fn extract(
        &self,
        run: &RunHandle,
        image: &Path,
        mount: &Path,
    ) -> Result<(), PipelineError> {
        let tool = self.commands.tools().extract.clone();
        run.update(
            StepKey::Extract,
            StepStatus::InProgress,
            format!("Extracting ISO contents using {tool}..."),
        )
        .await;

        let output = self
            .invoke(StepKey::Extract, &self.commands.extract(image, mount))
            .await?;
        if !output.success() {
            return Err(PipelineError::Extract(output.stderr.trim().to_string()));
        }

        run.update(
            StepKey::Extract,
            StepStatus::Completed,
            format!("ISO extracted successfully using {tool}"),
        )
        .await;
        Ok(())
    }

    async fn copy(&self, run: &RunHandle, mount: &Path, work: &Path) -> Result<(), PipelineError> {
        run.update(
            StepKey::Copy,
            StepStatus::InProgress,
            "Analyzing ISO contents...",
        )
        .await;

        let root = mount.to_path_buf();
        let limits = self.listing;
        let listing = tokio::task::spawn_blocking(move || boot::list_tree(&root, limits)).await;
        let message = match listing {
            Ok(Ok(lines)) => {
                let preview: Vec<&str> = lines
                    .iter()
                    .take(LISTING_PREVIEW)
                    .map(String::as_str)
                    .collect();
                format!("ISO contents: {}", preview.join(", "))
            }
            Ok(Err(e)) => format!("Could not list ISO contents: {e}"),
            Err(e) => format!("Could not list ISO contents: {e}"),
        };
        run.update(StepKey::Copy, StepStatus::InProgress, message).await;

        run.update(
            StepKey::Copy,
            StepStatus::InProgress,
            "Copying ISO contents...",
        )
        .await;
        let output = self
            .invoke(StepKey::Copy, &self.commands.sync(mount, work))
            .await?;
        if !output.success() {
            return Err(PipelineError::Copy(output.stderr.trim().to_string()));
        }

        run.update(
            StepKey::Copy,
            StepStatus::Completed,
            "ISO contents copied successfully",
        )
        .await;
        Ok(())
    }

    /// Decide the output path and record product metadata.
    ///
    /// Never fails: an unreadable or empty marker falls back to the source
    /// name, and an unrecognized name still yields an output path.
    async fn analyze(
        &self,
        run: &RunHandle,
        request: &PipelineRequest,
        work: &Path,
    ) -> PathBuf {
        run.update(
            StepKey::Analyze,
            StepStatus::InProgress,
            "Analyzing product information...",
        )
        .await;

        let marker = work.join(NAME_MARKER_FILE);
        let from_marker = match tokio::fs::read_to_string(&marker).await {
            Ok(content) if !content.trim().is_empty() => Some(content.trim().to_string()),
            Ok(_) => {
                warn!("Run {}: {} is empty", run.id(), NAME_MARKER_FILE);
                None
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Run {}: could not read {}: {}", run.id(), NAME_MARKER_FILE, e);
                None
            }
        };
        let found_marker = from_marker.is_some();
        let name = final_component(from_marker.as_deref().unwrap_or(&request.source_name))
            .unwrap_or_else(|| request.source_name.clone());

        let info = parse_iso_filename(&name);
        let message = match (&info, found_marker) {
            (Some(info), true) => format!(
                "Product detected: {} ({}) - {}",
                info.product, info.code, info.version_string
            ),
            (Some(info), false) => format!(
                "Product detected from filename: {} ({}) - {}",
                info.product, info.code, info.version_string
            ),
            (None, true) => format!("Product analysis completed (unrecognized format: {name})"),
            (None, false) => {
                format!("Product analysis completed (using input filename: {name})")
            }
        };
        run.set_product_info(info).await;
        run.update(StepKey::Analyze, StepStatus::Completed, message)
            .await;

        request
            .output_dir
            .join(format!("{}{}", self.output_prefix, name))
    }

    async fn install_bootloader(
        &self,
        run: &RunHandle,
        mount: &Path,
        work: &Path,
    ) -> Result<(), PipelineError> {
        run.update(
            StepKey::Bootloader,
            StepStatus::InProgress,
            "Looking for isolinux folder in extracted ISO...",
        )
        .await;

        let root = mount.to_path_buf();
        let located = tokio::task::spawn_blocking(move || boot::locate_boot_dir(&root))
            .await
            .map_err(|e| PipelineError::BootInstall(e.to_string()))?
            .ok_or(PipelineError::BootDirMissing)?;

        let relative = located.strip_prefix(mount).unwrap_or(&located);
        run.update(
            StepKey::Bootloader,
            StepStatus::InProgress,
            format!("Found isolinux folder at: {}", relative.display()),
        )
        .await;

        let work_root = work.to_path_buf();
        let installed =
            tokio::task::spawn_blocking(move || boot::install_boot_dir(&located, &work_root))
                .await
                .map_err(|e| PipelineError::BootInstall(e.to_string()))?
                .map_err(|e| PipelineError::BootInstall(format!("{e:#}")))?;

        if boot::has_boot_catalog(&installed) {
            run.update(
                StepKey::Bootloader,
                StepStatus::Completed,
                "Bootloader files copied from source ISO",
            )
            .await;
        } else {
            run.update(
                StepKey::Bootloader,
                StepStatus::InProgress,
                "Creating boot catalog...",
            )
            .await;
            run.update(
                StepKey::Bootloader,
                StepStatus::Completed,
                "Bootloader files copied; boot catalog will be generated",
            )
            .await;
        }
        Ok(())
    }

    async fn generate(
        &self,
        run: &RunHandle,
        work: &Path,
        output_path: &Path,
    ) -> Result<PathBuf, PipelineError> {
        run.update(
            StepKey::Generate,
            StepStatus::InProgress,
            "Generating bootable ISO...",
        )
        .await;

        // The author runs inside the work tree, so a relative output path
        // would land there.
        let output_path =
            std::path::absolute(output_path).map_err(|e| PipelineError::Generate(e.to_string()))?;
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::Generate(e.to_string()))?;
        }

        let output = self
            .invoke(StepKey::Generate, &self.commands.author(work, &output_path))
            .await?;
        if !output.success() {
            return Err(PipelineError::Generate(output.stderr.trim().to_string()));
        }

        let file_name = output_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        run.update(
            StepKey::Generate,
            StepStatus::Completed,
            format!("ISO generated successfully: {file_name}"),
        )
        .await;
        Ok(output_path)
    }

    async fn invoke(
        &self,
        stage: StepKey,
        request: &ToolRequest,
    ) -> Result<ToolOutput, PipelineError> {
        debug!("{}: {}", stage.as_str().to_uppercase(), request.display());
        self.invoker
            .run(request)
            .await
            .map_err(|e| PipelineError::from_tool(stage, e))
    }
}

/// Final path component of a marker or upload name.
fn final_component(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .map(|component| component.to_string_lossy().into_owned())
        .filter(|component| !component.is_empty())
}
