//! State management for pipeline runs.
//!
//! This module provides:
//! - StepTracker, the per-run ledger of stage statuses
//! - RunRegistry for keeping concurrent runs apart

pub mod registry;
pub mod tracker;
