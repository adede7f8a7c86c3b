//! Upload and artifact file name rules.

/// Extension accepted for uploads, compared case-insensitively.
pub const ALLOWED_EXTENSION: &str = "iso";

/// Whether `name` ends in `.iso` in any letter case.
pub fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(ALLOWED_EXTENSION))
}

/// Reduce a client-supplied name to a safe single path component.
///
/// Directory parts are dropped, whitespace becomes `_`, and anything other
/// than ASCII alphanumerics, `.`, `_` and `-` is removed. Leading and
/// trailing dots and underscores are trimmed, so the result never names a
/// hidden file or a parent directory. The result may be empty.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Whether `name` is a bare file name: no separators, not `.` or `..`.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert!(has_allowed_extension("a.iso"));
        assert!(has_allowed_extension("A.ISO"));
        assert!(has_allowed_extension("x.tar.Iso"));
        assert!(!has_allowed_extension("a.img"));
        assert!(!has_allowed_extension("iso"));
        assert!(!has_allowed_extension("a.iso.txt"));
    }

    #[test]
    fn test_sanitize_keeps_vendor_names() {
        assert_eq!(
            sanitize_filename("UCSInstall_UCOS_14.0.1.10000-20.sgn.iso"),
            "UCSInstall_UCOS_14.0.1.10000-20.sgn.iso"
        );
    }

    #[test]
    fn test_sanitize_strips_paths_and_specials() {
        assert_eq!(sanitize_filename("../../etc/passwd.iso"), "passwd.iso");
        assert_eq!(sanitize_filename("C:\\Users\\me\\my disk.iso"), "my_disk.iso");
        assert_eq!(sanitize_filename("caf\u{e9} (1).iso"), "caf_1.iso");
        assert_eq!(sanitize_filename(".hidden.iso"), "hidden.iso");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_plain_file_name() {
        assert!(is_plain_file_name("Bootable_a.iso"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("a/b.iso"));
        assert!(!is_plain_file_name("..\\b.iso"));
    }
}
