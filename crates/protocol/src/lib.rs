//! # bk-protocol
//!
//! Core protocol definitions and data models for bootkit.
//!
//! This crate defines all shared data structures used for:
//! - Pipeline stage tracking (step records and statuses)
//! - Product/version metadata parsed from image filenames
//! - HTTP response payloads consumed by the browser client
//! - Service configuration loaded from `bootkit.toml`
//!
//! ## Modules
//!
//! - [`step_models`]: Stage keys, statuses and records
//! - [`product_models`]: Parsed product version information
//! - [`run_models`]: Per-run snapshots and pipeline results
//! - [`api_models`]: Submit, status and product-info payloads
//! - [`config_models`]: Service configuration
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, uuid and chrono
//! - TypeScript generation: All wire types derive `TS` for the web client
//! - Independent compilation: No dependencies on other bootkit crates

pub mod api_models;
pub mod config_models;
pub mod product_models;
pub mod run_models;
pub mod step_models;

// Re-export all public types for convenience
pub use api_models::*;
pub use config_models::*;
pub use product_models::*;
pub use run_models::*;
pub use step_models::*;
