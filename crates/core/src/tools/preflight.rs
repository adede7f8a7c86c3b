//! Host tool availability checks.
//!
//! Lets the server warn at startup instead of failing the first upload.

use bk_protocol::config_models::ToolsConfig;

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Configured utilities that cannot be found on `PATH`.
pub fn missing_tools(tools: &ToolsConfig) -> Vec<String> {
    [&tools.extract, &tools.sync, &tools.author]
        .into_iter()
        .filter(|tool| !command_exists(tool))
        .cloned()
        .collect()
}
