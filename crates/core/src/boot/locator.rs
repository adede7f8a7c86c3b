//! Boot-loader directory discovery and installation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{BOOT_CATALOG_FILE, BOOT_DIR_NAME};

/// Find the boot-loader directory inside an extracted image tree.
///
/// The root itself is never a match. When several directories carry the
/// name, the shallowest wins; ties at the same depth go to the
/// lexicographically first path. Symlinks are not followed and unreadable
/// subtrees are skipped.
pub fn locate_boot_dir(extracted_root: &Path) -> Option<PathBuf> {
    WalkDir::new(extracted_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir() && entry.file_name() == BOOT_DIR_NAME)
        .min_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path().cmp(b.path())))
        .map(walkdir::DirEntry::into_path)
}

/// Whether the boot catalog already exists inside `boot_dir`.
///
/// Only reports presence; the image author creates the catalog when it is
/// missing.
pub fn has_boot_catalog(boot_dir: &Path) -> bool {
    boot_dir.join(BOOT_CATALOG_FILE).is_file()
}

/// Replace `work_root/isolinux` with a full copy of `located`.
///
/// Returns the installed directory.
pub fn install_boot_dir(located: &Path, work_root: &Path) -> Result<PathBuf> {
    let target = work_root.join(BOOT_DIR_NAME);

    if target.is_symlink() || target.is_file() {
        fs::remove_file(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
    } else if target.exists() {
        fs::remove_dir_all(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
    }

    copy_dir_recursive(located, &target)?;
    Ok(target)
}

/// Recursively copy a directory, preserving symlinks.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)
            .with_context(|| format!("Failed to create directory: {}", dst.display()))?;
    }

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            let target = fs::read_link(&src_path)?;
            std::os::unix::fs::symlink(&target, &dst_path)
                .with_context(|| format!("Failed to create symlink: {}", dst_path.display()))?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)
                .with_context(|| format!("Failed to copy file: {}", src_path.display()))?;
        }
    }

    Ok(())
}
