//! The caller-facing transformation seam and engine configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use prism_config::{validate_dimension_name, validate_version, ConfigError, Settings};
use prism_patch::Patch;

use crate::unit::CompilationUnit;

/// Error type returned by caller transformers.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// Returns the package path of `package` compiled under `dimension`.
pub fn dimension_package_path(package: &str, dimension: &str) -> String {
    format!("{package}__{dimension}")
}

/// Dimension-specific context handed to every transformer call.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// The dimension being built.
    pub dimension: &'a str,
    /// The engine version from configuration.
    pub version: &'a str,
}

impl TransformContext<'_> {
    /// The dimension-qualified path of `package` in this context's dimension.
    pub fn dimension_package_path(&self, package: &str) -> String {
        dimension_package_path(package, self.dimension)
    }
}

/// A caller-supplied source transformation for one dimension.
pub trait Transformer {
    /// Whether this dimension applies to `package`.
    ///
    /// Called often, for every package of a link and every import of a
    /// transformed unit, so it should be cheap.
    fn applies_to(&self, ctx: &TransformContext<'_>, package: &str) -> Result<bool, TransformError>;

    /// Produces the edits turning `unit` into its dimension variant.
    ///
    /// Only called when [`applies_to`](Self::applies_to) returned `true`.
    /// Patches must not overlap each other and must not rewrite import
    /// paths of applicable packages; the engine does that itself.
    fn transform(
        &self,
        ctx: &TransformContext<'_>,
        unit: &CompilationUnit,
    ) -> Result<TransformResult, TransformError>;
}

/// What a transformer wants done to a unit.
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    /// Edits to the unit's files.
    pub patches: Vec<Patch>,
    /// Packages the transformed code imports that the original did not.
    /// They must already be built by the host.
    pub extra_dependency_packages: BTreeSet<String>,
    /// Prefix each patched file with a line directive naming the original
    /// file, so positions in diagnostics and stack traces stay attributable.
    /// Patches should then keep line numbers intact.
    pub add_line_directives: bool,
    /// Log each patched file's full text at debug level.
    pub log_patched_files: bool,
}

/// Everything the engine needs from the embedding program.
pub struct EngineConfig {
    /// Version of the transformer set. Part of every cache key, so it must
    /// change whenever any transformer's output changes.
    pub version: String,
    /// Transformers keyed by dimension name.
    pub transformers: BTreeMap<String, Box<dyn Transformer>>,
    /// Run-time settings.
    pub settings: Settings,
}

impl EngineConfig {
    /// Creates a configuration with no dimensions and default settings.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            transformers: BTreeMap::new(),
            settings: Settings::default(),
        }
    }

    /// Registers `transformer` under `dimension`.
    pub fn with_transformer(
        mut self,
        dimension: impl Into<String>,
        transformer: impl Transformer + 'static,
    ) -> Self {
        self.transformers
            .insert(dimension.into(), Box::new(transformer));
        self
    }

    /// Replaces the run-time settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Checks the required parts of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_version(&self.version)?;
        if self.transformers.is_empty() {
            return Err(ConfigError::MissingField(
                "transformers (at least one dimension is required)".to_string(),
            ));
        }
        for name in self.transformers.keys() {
            validate_dimension_name(name)?;
        }
        Ok(())
    }

    /// Configured dimension names in order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.transformers.keys().map(String::as_str)
    }

    /// Whether `name` is a configured dimension.
    pub fn has_dimension(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("version", &self.version)
            .field("dimensions", &self.transformers.keys().collect::<Vec<_>>())
            .field("settings", &self.settings)
            .finish()
    }
}
