//! Validation of the values the embedding program supplies in code.

use crate::error::ConfigError;

/// Rejects an empty engine version.
///
/// The version is mixed into every cache key; it must change whenever any
/// transformer's output changes.
pub fn validate_version(version: &str) -> Result<(), ConfigError> {
    if version.trim().is_empty() {
        return Err(ConfigError::MissingField("version".to_string()));
    }
    Ok(())
}

/// Checks that a dimension name can be embedded in package paths and
/// marker comments: non-empty, only ASCII letters, digits, `_` and `-`.
pub fn validate_dimension_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::ValidationError(
            "dimension name must not be empty".to_string(),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(ConfigError::ValidationError(format!(
            "dimension name {name:?} contains invalid character {bad:?}"
        )));
    }
    Ok(())
}
