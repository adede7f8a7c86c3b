//! TOML loader for [`ServiceConfig`].

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use bk_protocol::config_models::ServiceConfig;
use std::path::Path;

/// Loads the service configuration from a TOML file.
///
/// # Arguments
///
/// * `path` - Location of the configuration file
///
/// # Returns
///
/// The parsed configuration. A missing file yields the defaults rather than
/// an error; keys absent from the file take their default values.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML or has wrongly typed keys
/// - A value is unusable (see [`validate`])
///
/// # Example
///
/// ```rust,no_run
/// use bk_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("bootkit.toml")).await?;
/// println!("Serving on {}", config.bind);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(path: &Path) -> ConfigResult<ServiceConfig> {
    if !path.exists() {
        return Ok(ServiceConfig::default());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let config: ServiceConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })?;

    validate(&config).map_err(|reason| ConfigError::InvalidConfig {
        path: path.to_path_buf(),
        reason,
    })?;

    Ok(config)
}

/// Checks values that parse but cannot work.
///
/// Also applied to configurations assembled from command-line overrides.
pub fn validate(config: &ServiceConfig) -> Result<(), String> {
    if config.max_upload_bytes == 0 {
        return Err("max_upload_bytes must be greater than zero".to_string());
    }
    if config.max_retained_runs == 0 {
        return Err("max_retained_runs must be greater than zero".to_string());
    }
    if config.output_prefix.contains('/') {
        return Err(format!(
            "output_prefix must not contain '/': {}",
            config.output_prefix
        ));
    }
    for (key, program) in [
        ("tools.extract", &config.tools.extract),
        ("tools.sync", &config.tools.sync),
        ("tools.author", &config.tools.author),
    ] {
        if program.trim().is_empty() {
            return Err(format!("{key} must not be empty"));
        }
    }
    if config.tools.timeout_secs == Some(0) {
        return Err("tools.timeout_secs must be greater than zero".to_string());
    }
    Ok(())
}
