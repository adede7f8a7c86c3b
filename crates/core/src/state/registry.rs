//! Registry of pipeline runs keyed by run id.
//!
//! Every submission gets its own [`RunHandle`], so concurrent runs never see
//! each other's stage updates or product metadata. Observers may poll a run
//! while the engine mutates it; each record sits behind its own `RwLock`.

use crate::state::tracker::StepTracker;
use bk_protocol::api_models::ProductInfoResponse;
use bk_protocol::product_models::ProductVersionInfo;
use bk_protocol::run_models::RunSnapshot;
use bk_protocol::step_models::{StepKey, StepRecord, StepStatus};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Tracked state of one run.
#[derive(Debug)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub tracker: StepTracker,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            tracker: StepTracker::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.run_id,
            steps: self.tracker.snapshot(),
            product_info: self.tracker.product_info().cloned(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Shared handle to one run's record.
///
/// Cloning the handle is cheap; all clones refer to the same record.
#[derive(Debug, Clone)]
pub struct RunHandle {
    run_id: Uuid,
    record: Arc<RwLock<RunRecord>>,
}

impl RunHandle {
    /// Create a handle that is not registered anywhere.
    ///
    /// Useful for driving the engine directly, e.g. from the CLI.
    pub fn detached() -> Self {
        Self::for_id(Uuid::new_v4())
    }

    fn for_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            record: Arc::new(RwLock::new(RunRecord::new(run_id))),
        }
    }

    pub fn id(&self) -> Uuid {
        self.run_id
    }

    /// Set a stage's status and message.
    pub async fn update(&self, key: StepKey, status: StepStatus, message: impl Into<String>) {
        let mut record = self.record.write().await;
        record.tracker.update(key, status, Some(message.into()));
    }

    /// Set a stage's status, keeping its current message.
    pub async fn set_status(&self, key: StepKey, status: StepStatus) {
        let mut record = self.record.write().await;
        record.tracker.update(key, status, None);
    }

    pub async fn set_product_info(&self, info: Option<ProductVersionInfo>) {
        let mut record = self.record.write().await;
        record.tracker.set_product_info(info);
    }

    /// Reset every stage to pending and forget previous results.
    pub async fn reset(&self) {
        let mut record = self.record.write().await;
        record.tracker.reset();
        record.started_at = Utc::now();
        record.finished_at = None;
    }

    /// Stamp the run as finished.
    pub async fn finish(&self) {
        let mut record = self.record.write().await;
        record.finished_at = Some(Utc::now());
    }

    pub async fn is_finished(&self) -> bool {
        self.record.read().await.finished_at.is_some()
    }

    pub async fn steps(&self) -> Vec<StepRecord> {
        self.record.read().await.tracker.snapshot()
    }

    pub async fn step(&self, key: StepKey) -> Option<StepRecord> {
        self.record.read().await.tracker.get(key).cloned()
    }

    pub async fn product_info_response(&self) -> ProductInfoResponse {
        self.record.read().await.tracker.product_info_response()
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        self.record.read().await.snapshot()
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    runs: HashMap<Uuid, RunHandle>,
    /// Run ids from oldest to newest start.
    order: Vec<Uuid>,
}

/// Concurrent-safe map from run id to run record.
#[derive(Debug, Clone)]
pub struct RunRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    max_retained: usize,
}

impl RunRegistry {
    /// Create a registry that keeps at most `max_retained` runs once they
    /// have finished.
    pub fn new(max_retained: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner::default())),
            max_retained: max_retained.max(1),
        }
    }

    /// Start tracking a run.
    ///
    /// A fresh id is issued unless the caller supplies one. Supplying the id
    /// of a known run resets that run's record. The new run becomes the
    /// latest run.
    pub async fn begin_run(&self, run_id: Option<Uuid>) -> RunHandle {
        let run_id = run_id.unwrap_or_else(Uuid::new_v4);
        let mut inner = self.inner.write().await;

        let handle = if let Some(existing) = inner.runs.get(&run_id).cloned() {
            existing.reset().await;
            existing
        } else {
            let handle = RunHandle::for_id(run_id);
            inner.runs.insert(run_id, handle.clone());
            handle
        };

        inner.order.retain(|id| *id != run_id);
        inner.order.push(run_id);

        self.evict_finished(&mut inner).await;
        handle
    }

    /// Drop the oldest finished runs while over capacity.
    async fn evict_finished(&self, inner: &mut RegistryInner) {
        let mut index = 0;
        while inner.runs.len() > self.max_retained && index < inner.order.len() {
            let run_id = inner.order[index];
            let finished = match inner.runs.get(&run_id) {
                Some(handle) => handle.is_finished().await,
                None => true,
            };

            if finished {
                inner.order.remove(index);
                inner.runs.remove(&run_id);
                debug!("evicted run {run_id}");
            } else {
                index += 1;
            }
        }
    }

    pub async fn get(&self, run_id: Uuid) -> Option<RunHandle> {
        self.inner.read().await.runs.get(&run_id).cloned()
    }

    /// The most recently started run.
    pub async fn latest(&self) -> Option<RunHandle> {
        let inner = self.inner.read().await;
        inner
            .order
            .last()
            .and_then(|run_id| inner.runs.get(run_id))
            .cloned()
    }

    pub async fn snapshot(&self, run_id: Uuid) -> Option<RunSnapshot> {
        match self.get(run_id).await {
            Some(handle) => Some(handle.snapshot().await),
            None => None,
        }
    }

    pub async fn latest_snapshot(&self) -> Option<RunSnapshot> {
        match self.latest().await {
            Some(handle) => Some(handle.snapshot().await),
            None => None,
        }
    }

    pub async fn run_count(&self) -> usize {
        self.inner.read().await.runs.len()
    }
}
