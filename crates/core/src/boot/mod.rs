//! Boot material discovery for extracted images.
//!
//! This module provides:
//! - Locating the `isolinux/` directory in an extracted tree
//! - Installing it into the work tree the image is authored from
//! - Reporting whether the boot catalog already exists
//! - A bounded tree listing for progress messages

pub mod listing;
pub mod locator;

pub use listing::{list_tree, ListingLimits};
pub use locator::{has_boot_catalog, install_boot_dir, locate_boot_dir};

/// Name of the boot-loader directory.
pub const BOOT_DIR_NAME: &str = "isolinux";

/// Boot catalog file name inside the boot-loader directory.
pub const BOOT_CATALOG_FILE: &str = "boot.cat";

/// Boot image path relative to the image root.
pub const BOOT_IMAGE_PATH: &str = "isolinux/isolinux.bin";

/// Boot catalog path relative to the image root.
pub const BOOT_CATALOG_PATH: &str = "isolinux/boot.cat";
