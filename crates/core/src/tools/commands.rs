//! Command lines for the extract, sync and author utilities.

use super::invoker::ToolRequest;
use crate::boot::{BOOT_CATALOG_PATH, BOOT_IMAGE_PATH};
use bk_protocol::config_models::ToolsConfig;
use std::path::Path;

/// Builds the invocations of the three external utilities.
#[derive(Debug, Clone)]
pub struct ToolCommands {
    tools: ToolsConfig,
}

impl ToolCommands {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolsConfig {
        &self.tools
    }

    /// `7z x <image> -o<dest> -y`
    pub fn extract(&self, image: &Path, dest: &Path) -> ToolRequest {
        ToolRequest::new(&self.tools.extract)
            .arg("x")
            .arg_path(image)
            .arg(format!("-o{}", dest.display()))
            .arg("-y")
    }

    /// `rsync -av <src>/ <dst>/`
    ///
    /// The trailing slashes copy the contents of `src` rather than the
    /// directory itself.
    pub fn sync(&self, src: &Path, dst: &Path) -> ToolRequest {
        ToolRequest::new(&self.tools.sync)
            .arg("-av")
            .arg(with_trailing_slash(src))
            .arg(with_trailing_slash(dst))
    }

    /// `genisoimage ... -o <output> .` run inside `work_root`.
    pub fn author(&self, work_root: &Path, output: &Path) -> ToolRequest {
        ToolRequest::new(&self.tools.author)
            .args(["-J", "-no-emul-boot", "-boot-info-table", "-boot-load-size", "4"])
            .args(["-b", BOOT_IMAGE_PATH, "-c", BOOT_CATALOG_PATH])
            .arg("-v")
            .arg("-o")
            .arg_path(output)
            .arg(".")
            .current_dir(work_root)
    }
}

fn with_trailing_slash(path: &Path) -> String {
    let mut rendered = path.to_string_lossy().into_owned();
    if !rendered.ends_with('/') {
        rendered.push('/');
    }
    rendered
}
