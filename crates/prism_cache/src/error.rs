//! Why a cache read or write did not succeed.

use std::path::PathBuf;

/// A failed cache operation.
///
/// Reads are fail-safe: [`BuildCache::get`](crate::BuildCache::get) and
/// friends turn every one of these into a miss. The detailed variants are
/// surfaced by [`BuildCache::lookup`](crate::BuildCache::lookup) so tooling
/// can explain why an entry is unusable.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A file under the cache root could not be read, written or renamed.
    #[error("{path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Failure reported by the OS.
        source: std::io::Error,
    },

    /// No entry exists for the key.
    #[error("no cache entry for key {key}")]
    Missing {
        /// The key, in hex.
        key: String,
    },

    /// The entry file is not a record this engine writes.
    #[error("{path} is not a cache entry: {reason}")]
    InvalidRecord {
        /// Entry file.
        path: PathBuf,
        /// What did not decode.
        reason: String,
    },

    /// The entry uses an older or newer record layout.
    #[error("{path} has record layout {actual}, this engine reads {expected}")]
    FormatMismatch {
        /// Entry file.
        path: PathBuf,
        /// Layout this engine writes.
        expected: u32,
        /// Layout found on disk.
        actual: u32,
    },

    /// The entry was stored by another engine version.
    #[error("{path} was stored by engine {actual:?}, running {expected:?}")]
    VersionMismatch {
        /// Entry file.
        path: PathBuf,
        /// Running engine version.
        expected: String,
        /// Version recorded in the entry.
        actual: String,
    },

    /// The payload no longer matches the size or digest its entry recorded.
    #[error("{path} is corrupt: entry says {expected}, file has {actual}")]
    ChecksumMismatch {
        /// Payload file.
        path: PathBuf,
        /// Size or digest from the entry.
        expected: String,
        /// Size or digest on disk.
        actual: String,
    },

    /// A record or metadata document could not be encoded.
    #[error("encoding cache record: {reason}")]
    Serialization {
        /// Encoder message.
        reason: String,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
