//! Runtime run state models.
//!
//! A run is one execution of the image pipeline, from accepted submission
//! to terminal success or failure. Each run is keyed by its own UUID so
//! concurrent submissions never share tracked state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;
use uuid::Uuid;

use crate::product_models::ProductVersionInfo;
use crate::step_models::StepRecord;

/// Immutable copy of a run's tracked state for external observers.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
pub struct RunSnapshot {
    #[ts(type = "string")]
    pub run_id: Uuid,

    /// All nine stage records in pipeline order.
    pub steps: Vec<StepRecord>,

    /// Metadata parsed during the analyze stage, if any.
    pub product_info: Option<ProductVersionInfo>,

    pub started_at: DateTime<Utc>,

    /// Set once the run reaches its terminal outcome.
    pub finished_at: Option<DateTime<Utc>>,
}

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    /// The bootable image was written to `output_path`.
    Success { output_path: PathBuf },

    /// The run stopped at its first fatal error.
    Failure { error: String },
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success { .. })
    }

    /// The error message of a failed run.
    pub fn error(&self) -> Option<&str> {
        match self {
            PipelineResult::Success { .. } => None,
            PipelineResult::Failure { error } => Some(error),
        }
    }
}
