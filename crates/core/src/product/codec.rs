//! Filename codec for vendor install images.
//!
//! Recognizes exactly one naming convention:
//!
//! ```text
//! [<prefix>_]<CODE>_<major>.<minor>.<maint>.<build>[-<qualifier>].iso
//! ```
//!
//! where `<prefix>` is `UCSInstall` or `PCD`, `<CODE>` is upper-case
//! alphanumeric, and `<qualifier>` is drawn from `[A-Za-z0-9._-]`. Anything
//! else is "no match", which callers treat as metadata being unavailable.

use bk_protocol::product_models::ProductVersionInfo;

use super::labels::product_label;

/// Prefixes that may precede the product code.
const KNOWN_PREFIXES: &[&str] = &["UCSInstall_", "PCD_"];

/// Required image suffix.
const ISO_SUFFIX: &str = ".iso";

/// Build number marking a general-availability release.
const GA_BUILD: &str = "10000";

/// Parse a vendor image filename into product and version information.
///
/// Returns `None` when the filename does not follow the convention, and
/// also when a version field does not fit in a `u32`.
///
/// # Example
///
/// ```
/// use bk_core::product::parse_iso_filename;
///
/// let info = parse_iso_filename("PCD_CUC_12.5.1.13900-1.iso").unwrap();
/// assert_eq!(info.code, "CUC");
/// assert_eq!(info.su, Some(3));
/// assert_eq!(info.version_string, "12.5.1 (SU3)");
/// ```
pub fn parse_iso_filename(filename: &str) -> Option<ProductVersionInfo> {
    let stem = filename.strip_suffix(ISO_SUFFIX)?;

    // A prefix is only consumed when the remainder still parses, so a bare
    // product code that happens to equal a prefix is not lost.
    KNOWN_PREFIXES
        .iter()
        .filter_map(|prefix| stem.strip_prefix(*prefix))
        .find_map(parse_code_and_version)
        .or_else(|| parse_code_and_version(stem))
}

/// Parse `<CODE>_<major>.<minor>.<maint>.<build>[-<qualifier>]`.
fn parse_code_and_version(rest: &str) -> Option<ProductVersionInfo> {
    let (code, version) = rest.split_once('_')?;
    if !is_product_code(code) {
        return None;
    }

    let numbers = match version.split_once('-') {
        Some((numbers, qualifier)) if is_qualifier(qualifier) => numbers,
        Some(_) => return None,
        None => version,
    };

    let parts: Vec<&str> = numbers.split('.').collect();
    let [major, minor, maint, build] = parts.as_slice() else {
        return None;
    };
    if !parts.iter().all(|part| is_digits(part)) {
        return None;
    }

    let su = service_update(build);

    let mut version_string = format!("{major}.{minor}.{maint}");
    match su {
        Some(0) => version_string.push_str(" (GA)"),
        Some(n) => version_string.push_str(&format!(" (SU{n})")),
        None => {}
    }

    Some(ProductVersionInfo {
        code: code.to_string(),
        product: product_label(code).unwrap_or(code).to_string(),
        // Fields beyond u32::MAX make the whole name unrecognized.
        major: major.parse().ok()?,
        minor: minor.parse().ok()?,
        maint: maint.parse().ok()?,
        build: build.parse().ok()?,
        su,
        version_string,
        full_version: format!("{major}.{minor}.{maint}.{build}"),
    })
}

/// Decode the service-update level hidden in a build number.
///
/// `10000` is GA (SU 0) and `1<d>900` is SU `d`. Every other build number
/// carries no recognized service-update level.
fn service_update(build: &str) -> Option<u32> {
    if build == GA_BUILD {
        return Some(0);
    }

    let bytes = build.as_bytes();
    match bytes {
        [b'1', digit, b'9', b'0', b'0'] if digit.is_ascii_digit() => {
            Some(u32::from(digit - b'0'))
        }
        _ => None,
    }
}

fn is_product_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn is_digits(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

fn is_qualifier(qualifier: &str) -> bool {
    !qualifier.is_empty()
        && qualifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ga_release() {
        let info = parse_iso_filename("UCSInstall_UCOS_14.0.1.10000.iso").unwrap();

        assert_eq!(info.code, "UCOS");
        assert_eq!(info.product, "Cisco Unified Communications Manager");
        assert_eq!(
            (info.major, info.minor, info.maint, info.build),
            (14, 0, 1, 10000)
        );
        assert_eq!(info.su, Some(0));
        assert_eq!(info.version_string, "14.0.1 (GA)");
        assert_eq!(info.full_version, "14.0.1.10000");
        assert!(info.is_ga());
    }

    #[test]
    fn test_parse_service_update_with_qualifier() {
        let info = parse_iso_filename("PCD_CUC_12.5.1.13900-1.iso").unwrap();

        assert_eq!(info.code, "CUC");
        assert_eq!(info.product, "Cisco Unity Connection");
        assert_eq!(info.build, 13900);
        assert_eq!(info.su, Some(3));
        assert_eq!(info.version_string, "12.5.1 (SU3)");
        assert_eq!(info.full_version, "12.5.1.13900");
    }

    #[test]
    fn test_every_su_digit() {
        for digit in 0..=9u32 {
            let name = format!("UCSInstall_CER_15.0.1.1{digit}900.iso");
            let info = parse_iso_filename(&name).unwrap();
            assert_eq!(info.su, Some(digit), "{name}");
            assert!(info.version_string.ends_with(&format!("(SU{digit})")));
        }
    }

    #[test]
    fn test_unrecognized_build_has_no_su() {
        for build in ["19000", "10001", "23900", "139000", "1390", "12345"] {
            let name = format!("UCSInstall_UCOS_12.5.1.{build}.iso");
            let info = parse_iso_filename(&name).unwrap();
            assert_eq!(info.su, None, "{name}");
            assert_eq!(info.version_string, "12.5.1");
        }
    }

    #[test]
    fn test_digit_1_su_is_recognized() {
        let info = parse_iso_filename("UCSInstall_UCOS_12.5.1.11900.iso").unwrap();
        assert_eq!(info.su, Some(1));
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let info = parse_iso_filename("UCSInstall_XYZ9_1.2.3.4.iso").unwrap();
        assert_eq!(info.code, "XYZ9");
        assert_eq!(info.product, "XYZ9");
    }

    #[test]
    fn test_prefix_is_optional() {
        let info = parse_iso_filename("UCCX_12.5.1.10000-24.iso").unwrap();
        assert_eq!(info.code, "UCCX");
        assert_eq!(info.product, "Cisco Unified Contact Center Express");
    }

    #[test]
    fn test_prefix_lookalike_code() {
        // "PCD_" is tried as a prefix first, then as the product code itself.
        let info = parse_iso_filename("PCD_12.6.2.10000.iso").unwrap();
        assert_eq!(info.code, "PCD");
        assert_eq!(info.su, Some(0));
    }

    #[test]
    fn test_non_matching_names() {
        for name in [
            "randomfile.iso",
            "UCSInstall_UCOS_14.0.1.10000.ISO",
            "UCSInstall_UCOS_14.0.1.10000.img",
            "UCSInstall_ucos_14.0.1.10000.iso",
            "UCSInstall_UCOS_14.0.1.iso",
            "UCSInstall_UCOS_14.0.1.10000.5.iso",
            "UCSInstall_UCOS_14.0.a.10000.iso",
            "UCSInstall_UCOS_14.0.1.10000-.iso",
            "UCSInstall_UCOS_14.0.1.10000-a b.iso",
            "UCSInstall_UCOS_UNRST_14.0.1.10000.iso",
            "Other_UCOS_14.0.1.10000.iso",
            "_14.0.1.10000.iso",
            "",
        ] {
            assert!(parse_iso_filename(name).is_none(), "{name:?} should not match");
        }
    }

    #[test]
    fn test_oversized_field_is_unrecognized() {
        assert!(parse_iso_filename("UCSInstall_UCOS_4294967296.0.1.10000.iso").is_none());
        let info = parse_iso_filename("UCSInstall_UCOS_4294967295.0.1.10000.iso").unwrap();
        assert_eq!(info.major, u32::MAX);
    }

    #[test]
    fn test_qualifier_charset() {
        let info = parse_iso_filename("UCSInstall_CUP_14.0.1.14900-11.sgn_b.iso").unwrap();
        assert_eq!(info.code, "CUP");
        assert_eq!(info.su, Some(4));
    }
}
