//! Service configuration loading.
//!
//! Settings come from a single TOML file; every key is optional.

pub mod error;
pub mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, validate};
