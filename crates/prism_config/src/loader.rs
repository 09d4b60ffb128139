//! Settings file loading.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::{ConfigFile, Settings};

/// Loads settings from a `prism.toml` file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    load_settings_from_str(&content)
}

/// Parses `prism.toml` text that is already in memory.
pub fn load_settings_from_str(content: &str) -> Result<Settings, ConfigError> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    Ok(file.engine)
}
