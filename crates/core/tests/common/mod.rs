//! Common test utilities for the integration suites.
//!
//! This module provides shared functionality including:
//! - Sample image trees and service configurations
//! - Assertions over stage records

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
