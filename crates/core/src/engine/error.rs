//! Fatal pipeline errors.

use crate::tools::ToolError;
use bk_protocol::step_models::StepKey;
use thiserror::Error;

/// A condition that ends a run.
///
/// The display text is what the run reports as its error and what the
/// failing stage shows as its message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Failed to create temporary directories: {0}")]
    Setup(String),

    #[error("7zip not found. Please ensure 7zip is installed.")]
    ExtractorMissing,

    #[error("Failed to extract ISO: {0}")]
    ExtractInvocation(String),

    #[error("Failed to extract ISO using 7zip: {0}")]
    Extract(String),

    #[error("{tool} not found. Please ensure {tool} is installed.")]
    ToolMissing { stage: StepKey, tool: String },

    #[error("Failed to run {tool}: {reason}")]
    ToolInvocation {
        stage: StepKey,
        tool: String,
        reason: String,
    },

    #[error("Failed to copy ISO contents: {0}")]
    Copy(String),

    #[error("Could not find isolinux folder in extracted ISO")]
    BootDirMissing,

    #[error("Failed to install bootloader files: {0}")]
    BootInstall(String),

    #[error("Failed to generate ISO: {0}")]
    Generate(String),
}

impl PipelineError {
    /// Translate a tool that never produced an exit status.
    pub fn from_tool(stage: StepKey, error: ToolError) -> Self {
        if stage == StepKey::Extract {
            return match error {
                ToolError::NotFound(_) => PipelineError::ExtractorMissing,
                other => PipelineError::ExtractInvocation(other.to_string()),
            };
        }
        match error {
            ToolError::NotFound(tool) => PipelineError::ToolMissing { stage, tool },
            ToolError::Spawn { program, reason } => PipelineError::ToolInvocation {
                stage,
                tool: program,
                reason,
            },
            ToolError::TimedOut { program, secs } => PipelineError::ToolInvocation {
                stage,
                tool: program,
                reason: format!("did not finish within {secs} seconds"),
            },
        }
    }

    /// The stage this error is reported against.
    pub fn stage(&self) -> StepKey {
        match self {
            PipelineError::Setup(_) => StepKey::Setup,
            PipelineError::ToolMissing { stage, .. } => *stage,
            PipelineError::ToolInvocation { stage, .. } => *stage,
            PipelineError::ExtractorMissing
            | PipelineError::ExtractInvocation(_)
            | PipelineError::Extract(_) => StepKey::Extract,
            PipelineError::Copy(_) => StepKey::Copy,
            PipelineError::BootDirMissing | PipelineError::BootInstall(_) => StepKey::Bootloader,
            PipelineError::Generate(_) => StepKey::Generate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_extractor_message() {
        let err = PipelineError::from_tool(StepKey::Extract, ToolError::NotFound("7z".to_string()));
        assert_eq!(err.to_string(), "7zip not found. Please ensure 7zip is installed.");
        assert_eq!(err.stage(), StepKey::Extract);
    }

    #[test]
    fn test_missing_synchronizer_message() {
        let err = PipelineError::from_tool(StepKey::Copy, ToolError::NotFound("rsync".to_string()));
        assert_eq!(err.to_string(), "rsync not found. Please ensure rsync is installed.");
        assert_eq!(err.stage(), StepKey::Copy);
    }

    #[test]
    fn test_timeout_is_reported_against_stage() {
        let err = PipelineError::from_tool(
            StepKey::Generate,
            ToolError::TimedOut {
                program: "genisoimage".to_string(),
                secs: 60,
            },
        );
        assert_eq!(err.stage(), StepKey::Generate);
        assert_eq!(
            err.to_string(),
            "Failed to run genisoimage: did not finish within 60 seconds"
        );
    }
}
