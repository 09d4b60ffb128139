//! Configuration types deserialized from `prism.toml`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Directory name used under the user cache directory.
pub const CACHE_DIR_NAME: &str = "prism-build";

/// The whole `prism.toml` document.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub engine: Settings,
}

/// Run-time engine settings, every one optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Log engine decisions at debug level.
    pub verbose: bool,
    /// Keep the per-invocation temporary directory instead of deleting it.
    pub retain_temp_dir: bool,
    /// Build cache location; defaults under the user cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Rebuild dimension artifacts even when cached. The cache is still
    /// written.
    pub force_transform: bool,
}

impl Settings {
    /// Overlays `PRISM_*` environment values obtained through `lookup`.
    ///
    /// Booleans accept `1/true/yes/on` and `0/false/no/off` in any case;
    /// an empty value is ignored.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let flags = [
            ("PRISM_VERBOSE", &mut self.verbose),
            ("PRISM_RETAIN_TEMP_DIR", &mut self.retain_temp_dir),
            ("PRISM_FORCE_TRANSFORM", &mut self.force_transform),
        ];
        for (name, slot) in flags {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = parse_bool(name, &value)?;
            }
        }
        if let Some(dir) = lookup("PRISM_CACHE_DIR").filter(|v| !v.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// The build cache directory: the override, or `<user cache>/prism-build`.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let base = directories::BaseDirs::new().ok_or_else(|| {
            ConfigError::MissingField("cache_dir (no user cache directory available)".to_string())
        })?;
        Ok(base.cache_dir().join(CACHE_DIR_NAME))
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError(format!(
            "{name} must be a boolean, got {value:?}"
        ))),
    }
}
