//! On-disk entry records.
//!
//! An entry maps a key to a payload in the data area. The record is a small
//! bincode document carrying magic bytes, the record format version, the
//! engine version that wrote it, and the payload's content hash and size.
//! The payload itself is stored raw, named by its content hash.

use std::path::{Path, PathBuf};

use prism_common::{ActionId, ContentHash};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a prism cache entry record.
pub const ENTRY_MAGIC: [u8; 4] = *b"PRSM";

/// Current record format version. Increment on breaking changes.
pub const ENTRY_FORMAT_VERSION: u32 = 1;

/// The record stored for each cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Magic bytes: must be `b"PRSM"`.
    pub magic: [u8; 4],
    /// Record format version.
    pub format_version: u32,
    /// Engine version that produced this entry.
    pub engine_version: String,
    /// Content hash of the payload.
    pub output: ContentHash,
    /// Payload size in bytes.
    pub size: u64,
}

impl EntryRecord {
    /// Creates a record for `data` written by `engine_version`.
    pub fn new(data: &[u8], engine_version: &str) -> Self {
        Self {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            engine_version: engine_version.to_string(),
            output: ContentHash::from_bytes(data),
            size: data.len() as u64,
        }
    }

    /// Serializes the record.
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })
    }

    /// Decodes and validates a record read from `path`.
    pub fn decode(raw: &[u8], path: &Path, engine_version: &str) -> Result<Self, CacheError> {
        let (record, _): (EntryRecord, usize) =
            bincode::serde::decode_from_slice(raw, bincode::config::standard()).map_err(|e| {
                CacheError::InvalidRecord {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
        if record.magic != ENTRY_MAGIC {
            return Err(CacheError::InvalidRecord {
                path: path.to_path_buf(),
                reason: "bad magic bytes".to_string(),
            });
        }
        if record.format_version != ENTRY_FORMAT_VERSION {
            return Err(CacheError::FormatMismatch {
                path: path.to_path_buf(),
                expected: ENTRY_FORMAT_VERSION,
                actual: record.format_version,
            });
        }
        if record.engine_version != engine_version {
            return Err(CacheError::VersionMismatch {
                path: path.to_path_buf(),
                expected: engine_version.to_string(),
                actual: record.engine_version,
            });
        }
        Ok(record)
    }
}

/// A validated cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The key that was looked up.
    pub key: ActionId,
    /// Where the payload bytes live.
    pub path: PathBuf,
    /// Content hash of the payload.
    pub output: ContentHash,
    /// Payload size in bytes.
    pub size: u64,
}
