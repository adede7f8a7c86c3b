//! Test fixtures: scratch directories, configurations and image trees.

use bk_core::tools::ScriptedToolInvoker;
use bk_protocol::config_models::{ServiceConfig, ToolsConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Boot material every bootable sample image carries.
pub const BOOT_FILES: &[(&str, &[u8])] = &[
    ("isolinux/isolinux.bin", b"isolinux"),
    ("isolinux/isolinux.cfg", b"default linux"),
];

/// Scratch layout for one test: uploads, output and temp parent.
pub struct TestEnv {
    pub root: TempDir,
    pub config: ServiceConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let tmp_base = root.path().join("tmp");
        std::fs::create_dir_all(&tmp_base).expect("Failed to create tmp base");

        let config = ServiceConfig {
            upload_dir: root.path().join("uploads"),
            output_dir: root.path().join("output"),
            tmp_base: Some(tmp_base),
            ..ServiceConfig::default()
        };
        Self { root, config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    /// Entries left under the temp parent.
    pub fn leftover_temp_dirs(&self) -> Vec<PathBuf> {
        let base = self.config.tmp_base.as_ref().expect("tmp_base is set");
        std::fs::read_dir(base)
            .expect("Failed to read tmp base")
            .map(|entry| entry.expect("Failed to read entry").path())
            .collect()
    }

    /// Number of files left in the upload directory.
    pub fn leftover_uploads(&self) -> usize {
        match std::fs::read_dir(self.upload_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// Toolchain that extracts `BOOT_FILES` plus `extra` files.
pub fn toolchain_with(extra: &[(&'static str, &'static [u8])]) -> ScriptedToolInvoker {
    let mut files: Vec<(&str, &[u8])> = BOOT_FILES.to_vec();
    files.extend_from_slice(extra);
    ScriptedToolInvoker::iso_toolchain(&ToolsConfig::default(), &files)
}

/// Toolchain whose image carries the given `isofilename` marker.
pub fn toolchain_with_marker(marker: &'static str) -> ScriptedToolInvoker {
    toolchain_with(&[("isofilename", marker.as_bytes())])
}

/// Toolchain whose image has no boot-loader directory.
pub fn toolchain_without_boot_dir() -> ScriptedToolInvoker {
    ScriptedToolInvoker::iso_toolchain(
        &ToolsConfig::default(),
        &[("Packages/base.rpm", b"rpm"), ("README", b"readme")],
    )
}
