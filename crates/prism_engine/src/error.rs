//! Error types for the engine and its host collaborators.

use std::io;
use std::path::PathBuf;

use prism_cache::CacheError;
use prism_config::ConfigError;
use prism_patch::PatchError;

use crate::transform::TransformError;

/// A fatal engine failure.
///
/// Conditions the host tool should report itself are not errors; they come
/// back as [`Outcome::Deferred`](prism_common::Outcome::Deferred).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Missing or invalid engine configuration.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// The intercepted command line is not one the engine understands.
    #[error("invalid invocation: {0}")]
    Invocation(String),

    /// A required host tool flag was not present.
    #[error("missing {flag} flag")]
    MissingFlag {
        /// The flag, e.g. `-importcfg`.
        flag: &'static str,
    },

    /// The `-buildid` value has no fingerprint segment.
    #[error("invalid build id `{build_id}`")]
    InvalidBuildId {
        /// The value as given.
        build_id: String,
    },

    /// The build id disagrees with the fingerprint reported for the package.
    #[error("package {package} has build fingerprint {expected}, but the package listing reports {actual}")]
    FingerprintMismatch {
        /// Import path of the package.
        package: String,
        /// Fingerprint from `-buildid`.
        expected: String,
        /// Fingerprint from the listing.
        actual: String,
    },

    /// No fingerprint is known for a package that needs a dimension key.
    #[error("no build fingerprint for package {package}")]
    MissingFingerprint {
        /// Import path of the package.
        package: String,
    },

    /// A dimension build that must already exist is not in the cache.
    #[error("no cached {what} for package {package} in dimension {dimension}")]
    MissingArtifact {
        /// Import path of the original package.
        package: String,
        /// Dimension name.
        dimension: String,
        /// `"artifact"` or `"metadata"`.
        what: &'static str,
    },

    /// A caller transformer failed.
    #[error("transforming {package} to dimension {dimension}: {source}")]
    Transform {
        /// Import path of the package.
        package: String,
        /// Dimension name.
        dimension: String,
        /// The transformer's error.
        source: TransformError,
    },

    /// The patch set for a dimension was rejected.
    #[error("patching {package} for dimension {dimension}: {source}")]
    Patch {
        /// Import path of the package.
        package: String,
        /// Dimension name.
        dimension: String,
        /// The patch error.
        source: PatchError,
    },

    /// A bridge declaration is unusable.
    #[error("{}: {message}", file.display())]
    Bridge {
        /// The file declaring the bridge.
        file: PathBuf,
        /// What is wrong.
        message: String,
    },

    /// A dimension marker comment is malformed or misplaced.
    #[error("{}: {message}", file.display())]
    Marker {
        /// The file containing the marker.
        file: PathBuf,
        /// What is wrong.
        message: String,
    },

    /// A host collaborator failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A host tool ran but exited unsuccessfully.
    #[error("{tool} for {package} exited with status {code}")]
    ToolFailed {
        /// Tool name.
        tool: String,
        /// Package being built.
        package: String,
        /// Exit code.
        code: i32,
    },

    /// The build cache failed.
    #[error("build cache: {0}")]
    Cache(#[from] CacheError),

    /// A file system operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// An import manifest could not be read or written.
    #[error("import manifest {}: {message}", path.display())]
    Manifest {
        /// The manifest file.
        path: PathBuf,
        /// What failed.
        message: String,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the host collaborators: tool processes and package queries.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The process could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program name or path.
        program: String,
        /// The underlying error.
        source: io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("`{command}` failed ({status}): {output}")]
    Failed {
        /// The command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured output.
        output: String,
    },

    /// The process output could not be understood.
    #[error("unexpected output from `{command}`: {line}")]
    UnexpectedOutput {
        /// The command line.
        command: String,
        /// The offending line.
        line: String,
    },

    /// The package has no compiled export file.
    #[error("no export file for package {package}")]
    NoExport {
        /// Import path of the package.
        package: String,
    },
}
