//! Handles for the files of a compilation unit.

use serde::{Deserialize, Serialize};

/// Index of a file in its [`SourceDb`](crate::SourceDb).
///
/// Handles are handed out in insertion order, which is the order the host
/// listed the files on the compiler command line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Wraps a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}
