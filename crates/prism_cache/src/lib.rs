//! Content-addressed build cache for dimension artifacts.
//!
//! Keys are never computed from source content. The host build supplies a
//! per-unit [`Fingerprint`](prism_common::Fingerprint), which
//! [`derive_action_id`] mixes with the dimension name and engine version into
//! the dimension's action id. Two payloads hang off each action id: the
//! compiled artifact and a small JSON [`DimensionMetadata`] record, each under
//! its own derived sub-key so they never collide.
//!
//! Payload bytes are stored raw so host tools can read artifacts in place.
//! Every read is fail-safe: a missing, corrupt or stale entry is a miss.

#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod store;

pub use entry::{CacheEntry, EntryRecord};
pub use error::CacheError;
pub use keys::{artifact_key, derive_action_id, dimension_build_id, metadata_key};
pub use metadata::DimensionMetadata;
pub use store::{BuildCache, TrimStats};
