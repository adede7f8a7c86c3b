//! Product metadata models.
//!
//! Describes the product and version encoded in a vendor image filename such
//! as `UCSInstall_UCOS_14.0.1.10000.iso`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Product and version information parsed from an image filename.
///
/// `su` is only present when the build number uses one of the two
/// recognized encodings: `10000` (general availability, SU 0) or `1<d>900`
/// (service update `d`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ProductVersionInfo {
    /// Short product code, e.g. `UCOS` or `CUC`.
    pub code: String,

    /// Display label for the product.
    ///
    /// Falls back to `code` when the code is not in the label table.
    pub product: String,

    pub major: u32,
    pub minor: u32,
    pub maint: u32,
    pub build: u32,

    /// Service-update level derived from `build`.
    pub su: Option<u32>,

    /// Display version such as `14.0.1 (GA)` or `12.5.1 (SU3)`.
    pub version_string: String,

    /// Dotted four-component version, e.g. `14.0.1.10000`.
    pub full_version: String,
}

impl ProductVersionInfo {
    /// Whether this is a general-availability release (SU 0).
    pub fn is_ga(&self) -> bool {
        self.su == Some(0)
    }
}
