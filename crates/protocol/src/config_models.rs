//! Service configuration models for `bootkit.toml`.
//!
//! Every field has a default so an empty or missing file yields a working
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 16 GiB upload ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024 * 1024;

/// Represents settings from `bootkit.toml`.
///
/// # Example
///
/// ```toml
/// upload_dir = "uploads"
/// output_dir = "output"
/// output_prefix = "Bootable_"
///
/// [tools]
/// extract = "7z"
/// timeout_secs = 3600
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory uploaded images are stored in while they are processed.
    pub upload_dir: PathBuf,

    /// Directory produced bootable images are written to.
    pub output_dir: PathBuf,

    /// Parent directory for the per-run temporary directories.
    ///
    /// When unset, `/app/tmp` is used if it exists, otherwise the system
    /// temp directory.
    pub tmp_base: Option<PathBuf>,

    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,

    /// Literal tag prepended to the output image name.
    pub output_prefix: String,

    /// Number of run records kept for polling before the oldest finished
    /// runs are evicted.
    pub max_retained_runs: usize,

    /// Address the HTTP server listens on.
    pub bind: String,

    /// External utilities used by the pipeline.
    pub tools: ToolsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("output"),
            tmp_base: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            output_prefix: "Bootable_".to_string(),
            max_retained_runs: 64,
            bind: "0.0.0.0:5000".to_string(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Program names of the three external utilities.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Archive extractor invoked as `<extract> x <image> -o<dir> -y`.
    pub extract: String,

    /// Tree synchronizer invoked as `<sync> -av <src>/ <dst>/`.
    pub sync: String,

    /// Image author invoked with mkisofs-style arguments.
    pub author: String,

    /// Upper bound on a single utility invocation. Unbounded when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            extract: "7z".to_string(),
            sync: "rsync".to_string(),
            author: "genisoimage".to_string(),
            timeout_secs: None,
        }
    }
}
