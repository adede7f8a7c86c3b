//! # bk-core
//!
//! Core conversion pipeline for bootkit.
//!
//! This crate provides:
//! - Version metadata decoding for vendor image file names
//! - Per-run stage tracking and the run registry
//! - Boot-loader directory discovery and installation
//! - External utility invocation behind a narrow trait
//! - The pipeline engine and the submission service around it
//!
//! ## Modules
//!
//! - [`config`]: Service configuration loading
//! - [`product`]: File name version codec and product labels
//! - [`state`]: Stage tracker and run registry
//! - [`boot`]: Boot artifact location
//! - [`tools`]: Tool invocation seam and its implementations
//! - [`engine`]: Pipeline execution engine
//! - [`service`]: Upload, conversion and retrieval entry point

pub mod boot;
pub mod config;
pub mod engine;
pub mod product;
pub mod service;
pub mod state;
pub mod tools;
