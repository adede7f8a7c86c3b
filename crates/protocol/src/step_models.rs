//! Pipeline stage models.
//!
//! Every run is described by exactly nine stage records, one per
//! [`StepKey`], each carrying a [`StepStatus`] and a human-readable message.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Identifies one of the fixed pipeline stages.
///
/// The declaration order is the pipeline order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TS)]
#[serde(rename_all = "lowercase")]
pub enum StepKey {
    /// The image payload is being received and stored.
    Upload,
    /// Temporary directories are being created.
    Setup,
    /// The image is being unpacked into the mount directory.
    Extract,
    /// The unpacked tree is being synchronized into the work directory.
    Copy,
    /// Product metadata is being derived from the filename marker.
    Analyze,
    /// The boot-loader directory is being located and installed.
    Bootloader,
    /// The new bootable image is being authored.
    Generate,
    /// Temporary directories are being removed.
    Cleanup,
    /// Terminal stage reflecting the outcome of the run.
    Complete,
}

impl StepKey {
    /// All stage keys in pipeline order.
    pub const ALL: [StepKey; 9] = [
        StepKey::Upload,
        StepKey::Setup,
        StepKey::Extract,
        StepKey::Copy,
        StepKey::Analyze,
        StepKey::Bootloader,
        StepKey::Generate,
        StepKey::Cleanup,
        StepKey::Complete,
    ];

    /// Wire name of the stage.
    pub fn as_str(self) -> &'static str {
        match self {
            StepKey::Upload => "upload",
            StepKey::Setup => "setup",
            StepKey::Extract => "extract",
            StepKey::Copy => "copy",
            StepKey::Analyze => "analyze",
            StepKey::Bootloader => "bootloader",
            StepKey::Generate => "generate",
            StepKey::Cleanup => "cleanup",
            StepKey::Complete => "complete",
        }
    }

    /// Message shown while the stage has not started yet.
    pub fn default_message(self) -> &'static str {
        match self {
            StepKey::Upload => "Awaiting file upload...",
            StepKey::Setup => "Setting up temporary directories...",
            StepKey::Extract => "Extracting ISO contents...",
            StepKey::Copy => "Copying ISO contents...",
            StepKey::Analyze => "Analyzing product information...",
            StepKey::Bootloader => "Checking bootloader...",
            StepKey::Generate => "Generating bootable ISO...",
            StepKey::Cleanup => "Cleaning up temporary files...",
            StepKey::Complete => "Processing complete!",
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown stage name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStepKey(pub String);

impl fmt::Display for UnknownStepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pipeline stage '{}'", self.0)
    }
}

impl std::error::Error for UnknownStepKey {}

impl FromStr for StepKey {
    type Err = UnknownStepKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownStepKey(s.to_string()))
    }
}

/// Lifecycle status of a single stage.
///
/// Within one run a stage moves Pending -> InProgress -> Completed | Error,
/// possibly receiving several InProgress updates with refined messages.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Error,
}

impl StepStatus {
    /// Whether the stage has reached a final status for this run.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }
}

/// Status and message of one pipeline stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StepRecord {
    pub key: StepKey,
    pub status: StepStatus,
    pub message: String,
}

impl StepRecord {
    /// A pending record carrying the stage's default message.
    pub fn pending(key: StepKey) -> Self {
        Self {
            key,
            status: StepStatus::Pending,
            message: key.default_message().to_string(),
        }
    }
}
