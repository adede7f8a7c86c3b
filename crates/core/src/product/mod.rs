//! Product metadata derived from vendor image filenames.
//!
//! This module provides:
//! - The filename codec (`UCSInstall_UCOS_14.0.1.10000.iso` -> version record)
//! - The static product label table

pub mod codec;
pub mod labels;

pub use codec::parse_iso_filename;
pub use labels::product_label;
