//! Stage ledger for a single run.
//!
//! The tracker holds one [`StepRecord`] per [`StepKey`] and the product
//! metadata parsed during the run. It is a passive ledger: stage ordering is
//! the engine's job, the tracker records whatever it is told.

use bk_protocol::api_models::ProductInfoResponse;
use bk_protocol::product_models::ProductVersionInfo;
use bk_protocol::step_models::{StepKey, StepRecord, StepStatus};
use log::{info, warn};

/// Marker looked for in the analyze message to flag unrestricted images.
const UNRESTRICTED_MARKER: &str = "UNRESTRICTED";

/// In-memory record of all pipeline stages of one run.
#[derive(Debug, Clone)]
pub struct StepTracker {
    steps: Vec<StepRecord>,
    product_info: Option<ProductVersionInfo>,
}

impl Default for StepTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StepTracker {
    /// Create a tracker with every stage pending.
    pub fn new() -> Self {
        Self {
            steps: StepKey::ALL.into_iter().map(StepRecord::pending).collect(),
            product_info: None,
        }
    }

    /// Put every stage back to pending and forget the product metadata.
    pub fn reset(&mut self) {
        for record in &mut self.steps {
            *record = StepRecord::pending(record.key);
        }
        self.product_info = None;
    }

    /// Set a stage's status, replacing its message when one is given.
    pub fn update(&mut self, key: StepKey, status: StepStatus, message: Option<String>) {
        let Some(record) = self.steps.iter_mut().find(|record| record.key == key) else {
            return;
        };

        record.status = status;
        if let Some(message) = message {
            record.message = message;
        }

        let label = key.as_str().to_uppercase();
        match status {
            StepStatus::Error => warn!("{label}: {}", record.message),
            _ => info!("{label} [{status:?}]: {}", record.message),
        }
    }

    /// Same as [`update`](Self::update) for a stage given by name.
    ///
    /// Unknown names are ignored.
    pub fn update_named(&mut self, key: &str, status: StepStatus, message: Option<String>) {
        if let Ok(key) = key.parse::<StepKey>() {
            self.update(key, status, message);
        }
    }

    /// Current record of one stage.
    pub fn get(&self, key: StepKey) -> Option<&StepRecord> {
        self.steps.iter().find(|record| record.key == key)
    }

    /// Owned copy of all stage records in pipeline order.
    pub fn snapshot(&self) -> Vec<StepRecord> {
        self.steps.clone()
    }

    pub fn set_product_info(&mut self, info: Option<ProductVersionInfo>) {
        self.product_info = info;
    }

    pub fn product_info(&self) -> Option<&ProductVersionInfo> {
        self.product_info.as_ref()
    }

    /// Whether the analyze message mentions an unrestricted image.
    pub fn has_unrst_warning(&self) -> bool {
        self.get(StepKey::Analyze)
            .map(|record| record.message.to_uppercase().contains(UNRESTRICTED_MARKER))
            .unwrap_or(false)
    }

    /// Product metadata payload for the polling endpoint.
    pub fn product_info_response(&self) -> ProductInfoResponse {
        ProductInfoResponse {
            product_info: self.product_info.clone(),
            has_unrst_warning: self.has_unrst_warning(),
        }
    }
}
