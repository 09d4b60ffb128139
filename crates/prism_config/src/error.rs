//! Settings errors.

use std::path::PathBuf;

/// Why a set of engine settings could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("cannot read settings file {}: {source}", path.display())]
    IoError {
        /// File that was being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// `prism.toml` is not valid TOML or does not match the settings schema.
    #[error("malformed prism.toml: {0}")]
    ParseError(String),

    /// A setting the engine cannot run without was not given.
    #[error("setting `{0}` is required")]
    MissingField(String),

    /// A setting was given but its value is unusable.
    #[error("invalid setting: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_setting_names_the_key() {
        let err = ConfigError::MissingField("version".to_string());
        assert_eq!(err.to_string(), "setting `version` is required");
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let err = ConfigError::IoError {
            path: PathBuf::from("/etc/prism.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "cannot read settings file /etc/prism.toml: denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_and_invalid_prefixes() {
        assert!(ConfigError::ParseError("line 2".into())
            .to_string()
            .starts_with("malformed prism.toml"));
        assert!(ConfigError::ValidationError("PRISM_VERBOSE".into())
            .to_string()
            .starts_with("invalid setting"));
    }
}
