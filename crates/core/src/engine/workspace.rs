//! Temporary directories owned by one run.
//!
//! Both directories live exactly as long as the [`RunWorkspace`]. The engine
//! closes them explicitly to observe removal errors; dropping the workspace
//! on any other path (early return, panic) still removes them.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};

/// Parent used for temporary directories in the container image.
const CONTAINER_TMP_BASE: &str = "/app/tmp";

/// The extract target and the work tree of one run.
#[derive(Debug)]
pub struct RunWorkspace {
    mount: TempDir,
    work: TempDir,
}

impl RunWorkspace {
    /// Create two fresh, empty directories under `base`.
    ///
    /// If the second directory cannot be created the first is removed
    /// again, so a failed setup leaves nothing behind.
    pub fn create(base: Option<&Path>) -> io::Result<Self> {
        let mount = temp_dir("iso_mount_", base)?;
        let work = temp_dir("iso_work_", base)?;
        Ok(Self { mount, work })
    }

    /// Directory the image is extracted into.
    pub fn mount_dir(&self) -> &Path {
        self.mount.path()
    }

    /// Directory the new image is authored from.
    pub fn work_dir(&self) -> &Path {
        self.work.path()
    }

    /// Remove both directories, returning a description of every failure.
    pub fn cleanup(self) -> Vec<String> {
        let mut failures = Vec::new();
        for dir in [self.mount, self.work] {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                failures.push(format!("{}: {e}", path.display()));
            }
        }
        failures
    }
}

/// Resolve the parent for temporary directories.
///
/// An explicit setting wins; otherwise `/app/tmp` is used when present and
/// the system temp directory when not.
pub fn resolve_tmp_base(configured: Option<&Path>) -> Option<PathBuf> {
    match configured {
        Some(base) => Some(base.to_path_buf()),
        None => {
            let container = Path::new(CONTAINER_TMP_BASE);
            container.is_dir().then(|| container.to_path_buf())
        }
    }
}

fn temp_dir(prefix: &str, base: Option<&Path>) -> io::Result<TempDir> {
    let mut builder = Builder::new();
    builder.prefix(prefix);
    match base {
        Some(base) => builder.tempdir_in(base),
        None => builder.tempdir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_cleanup() {
        let base = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::create(Some(base.path())).unwrap();

        let mount = workspace.mount_dir().to_path_buf();
        let work = workspace.work_dir().to_path_buf();
        assert_ne!(mount, work);
        assert!(mount.is_dir() && work.is_dir());
        assert!(mount
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("iso_mount_"));
        assert!(work
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("iso_work_"));

        std::fs::write(work.join("file"), b"x").unwrap();
        assert!(workspace.cleanup().is_empty());
        assert!(!mount.exists());
        assert!(!work.exists());
    }

    #[test]
    fn test_drop_removes_directories() {
        let base = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::create(Some(base.path())).unwrap();
        let mount = workspace.mount_dir().to_path_buf();

        drop(workspace);
        assert!(!mount.exists());
    }

    #[test]
    fn test_missing_base_fails() {
        let base = tempfile::tempdir().unwrap();
        let result = RunWorkspace::create(Some(&base.path().join("absent")));
        assert!(result.is_err());
    }

    #[test]
    fn test_configured_base_wins() {
        let base = Path::new("/srv/scratch");
        assert_eq!(resolve_tmp_base(Some(base)), Some(base.to_path_buf()));
    }
}
