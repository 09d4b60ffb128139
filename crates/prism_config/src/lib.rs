//! Engine settings: the `prism.toml` file, environment overrides and the
//! validation rules shared by every configuration surface.
//!
//! The engine version and the dimension → transformer map are supplied in
//! code by the embedding program; everything tunable at run time lives in
//! [`Settings`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;
pub mod validate;

pub use error::ConfigError;
pub use loader::{load_settings, load_settings_from_str};
pub use types::{Settings, CACHE_DIR_NAME};
pub use validate::{validate_dimension_name, validate_version};
