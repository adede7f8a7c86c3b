//! HTTP payloads exchanged with the browser client.
//!
//! The JSON shapes match what the upload page polls:
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "ISO processed successfully",
//!   "output_file": "Bootable_UCSInstall_UCOS_14.0.1.10000.iso",
//!   "download_url": "/download/Bootable_UCSInstall_UCOS_14.0.1.10000.iso",
//!   "run_id": "uuid-here"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::product_models::ProductVersionInfo;
use crate::step_models::{StepKey, StepRecord, StepStatus};

/// Result of submitting an image for conversion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SubmitResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// File name of the produced bootable image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    /// Relative URL the artifact can be downloaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// First fatal error of a failed submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Run the submission was tracked under, when one was started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub run_id: Option<Uuid>,
}

impl SubmitResponse {
    pub fn succeeded(run_id: Uuid, output_file: String) -> Self {
        Self {
            success: true,
            message: Some("ISO processed successfully".to_string()),
            download_url: Some(format!("/download/{output_file}")),
            output_file: Some(output_file),
            error: None,
            run_id: Some(run_id),
        }
    }

    pub fn failed(run_id: Option<Uuid>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            output_file: None,
            download_url: None,
            error: Some(error.into()),
            run_id,
        }
    }
}

/// Generic failure body for lookups that found nothing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Status and message of one stage as reported by the polling endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StepState {
    pub status: StepStatus,
    pub message: String,
}

/// Stage name to state, serialized in pipeline order.
pub type StepStatusResponse = BTreeMap<StepKey, StepState>;

/// Build the polling payload from a run's stage records.
pub fn step_status_response(steps: &[StepRecord]) -> StepStatusResponse {
    steps
        .iter()
        .map(|record| {
            (
                record.key,
                StepState {
                    status: record.status,
                    message: record.message.clone(),
                },
            )
        })
        .collect()
}

/// Most recently parsed product metadata plus the restricted-image flag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ProductInfoResponse {
    pub product_info: Option<ProductVersionInfo>,

    /// Whether the analyze message mentions an unrestricted image.
    pub has_unrst_warning: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_status_response_orders_by_pipeline() {
        let steps: Vec<StepRecord> = StepKey::ALL
            .iter()
            .rev()
            .map(|key| StepRecord::pending(*key))
            .collect();

        let response = step_status_response(&steps);
        let keys: Vec<StepKey> = response.keys().copied().collect();
        assert_eq!(keys, StepKey::ALL.to_vec());
    }

    #[test]
    fn test_submit_response_omits_absent_fields() {
        let json = serde_json::to_value(SubmitResponse::failed(None, "Invalid file type"))
            .expect("serialize");

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid file type");
        assert!(json.get("output_file").is_none());
        assert!(json.get("run_id").is_none());
    }
}
