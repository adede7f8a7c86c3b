//! Bounded directory listing used for progress diagnostics.

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Caps applied by [`list_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
    /// Deepest level visited below the root.
    pub max_depth: usize,
    /// Directories reported per parent directory.
    pub dirs_per_level: usize,
    /// Files reported per parent directory.
    pub files_per_level: usize,
    /// Entries gathered before the listing is cut off.
    pub max_entries: usize,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            max_depth: 3,
            dirs_per_level: 5,
            files_per_level: 10,
            max_entries: 20,
        }
    }
}

/// Marker appended when the listing hit `max_entries`.
pub const TRUNCATED_MARKER: &str = "... (truncated)";

/// List a tree as `DIR: rel` / `FILE: rel` lines, within `limits`.
///
/// Entries come in walk order with siblings sorted by name. A walk error
/// ends the listing with what was gathered so far; it is only returned when
/// nothing was gathered. Purely diagnostic; callers must not act on the
/// result.
pub fn list_tree(root: &Path, limits: ListingLimits) -> Result<Vec<String>, walkdir::Error> {
    let entries = WalkDir::new(root)
        .min_depth(1)
        .max_depth(limits.max_depth.max(1))
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map(|entry| (entry.path().to_path_buf(), entry.file_type().is_dir())));
    gather(root, entries, limits)
}

/// Apply `limits` to `(path, is_dir)` entries.
fn gather<E, I>(root: &Path, entries: I, limits: ListingLimits) -> Result<Vec<String>, E>
where
    E: std::fmt::Display,
    I: IntoIterator<Item = Result<(PathBuf, bool), E>>,
{
    let mut lines = Vec::new();
    let mut per_parent: HashMap<PathBuf, (usize, usize)> = HashMap::new();

    for entry in entries {
        let (path, is_dir) = match entry {
            Ok(entry) => entry,
            Err(err) if lines.is_empty() => return Err(err),
            Err(err) => {
                debug!("Listing of {} stopped early: {}", root.display(), err);
                break;
            }
        };
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let counts = per_parent.entry(parent).or_default();
        let rel = path.strip_prefix(root).unwrap_or(path.as_path()).display().to_string();

        if is_dir {
            if counts.0 >= limits.dirs_per_level {
                continue;
            }
            counts.0 += 1;
            lines.push(format!("DIR: {rel}"));
        } else {
            if counts.1 >= limits.files_per_level {
                continue;
            }
            counts.1 += 1;
            lines.push(format!("FILE: {rel}"));
        }

        if lines.len() > limits.max_entries {
            lines.push(TRUNCATED_MARKER.to_string());
            break;
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lists_dirs_and_files_relative() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("isolinux")).unwrap();
        fs::write(temp.path().join("isolinux/isolinux.bin"), b"x").unwrap();
        fs::write(temp.path().join("isofilename"), b"x").unwrap();

        let lines = list_tree(temp.path(), ListingLimits::default()).unwrap();

        assert_eq!(
            lines,
            vec![
                "FILE: isofilename",
                "DIR: isolinux",
                "FILE: isolinux/isolinux.bin"
            ]
        );
    }

    #[test]
    fn test_per_level_caps() {
        let temp = TempDir::new().unwrap();
        for i in 0..8 {
            fs::create_dir_all(temp.path().join(format!("d{i}"))).unwrap();
        }
        for i in 0..12 {
            fs::write(temp.path().join(format!("f{i:02}")), b"x").unwrap();
        }

        let limits = ListingLimits {
            max_entries: 100,
            ..ListingLimits::default()
        };
        let lines = list_tree(temp.path(), limits).unwrap();

        assert_eq!(lines.iter().filter(|l| l.starts_with("DIR:")).count(), 5);
        assert_eq!(lines.iter().filter(|l| l.starts_with("FILE:")).count(), 10);
    }

    #[test]
    fn test_total_cap_adds_marker() {
        let temp = TempDir::new().unwrap();
        for d in 0..5 {
            for f in 0..10 {
                let dir = temp.path().join(format!("d{d}"));
                fs::create_dir_all(&dir).unwrap();
                fs::write(dir.join(format!("f{f}")), b"x").unwrap();
            }
        }

        let lines = list_tree(temp.path(), ListingLimits::default()).unwrap();

        assert_eq!(lines.len(), 22);
        assert_eq!(lines.last().map(String::as_str), Some(TRUNCATED_MARKER));
    }

    #[test]
    fn test_depth_limit() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b/c/d")).unwrap();

        let limits = ListingLimits {
            max_depth: 2,
            ..ListingLimits::default()
        };
        let lines = list_tree(temp.path(), limits).unwrap();

        assert_eq!(lines, vec!["DIR: a", "DIR: a/b"]);
    }

    #[test]
    fn test_walk_error_keeps_gathered_lines() {
        let root = Path::new("/iso");
        let entries = vec![
            Ok((root.join("isolinux"), true)),
            Ok((root.join("isolinux/isolinux.bin"), false)),
            Err("permission denied"),
            Ok((root.join("never_reached"), false)),
        ];

        let lines = gather(root, entries, ListingLimits::default()).unwrap();

        assert_eq!(lines, vec!["DIR: isolinux", "FILE: isolinux/isolinux.bin"]);
    }

    #[test]
    fn test_error_before_any_entry_is_returned() {
        let entries: Vec<Result<(PathBuf, bool), &str>> = vec![Err("permission denied")];
        let result = gather(Path::new("/iso"), entries, ListingLimits::default());
        assert_eq!(result, Err("permission denied"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(list_tree(&temp.path().join("absent"), ListingLimits::default()).is_err());
    }
}
