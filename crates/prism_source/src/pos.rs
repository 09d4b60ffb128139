//! Global source positions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::file_id::FileId;

/// A position in the global position space of a [`SourceDb`](crate::SourceDb).
///
/// Each file occupies the window `base..=base + len` (the last value is its
/// end-of-file position) and windows never overlap, so a position belongs to
/// at most one file.
/// [`Pos::NONE`] (zero) is never inside any file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Pos(u32);

impl Pos {
    /// The invalid position.
    pub const NONE: Pos = Pos(0);

    /// Creates a position from a raw value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` unless this is [`Pos::NONE`].
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Returns the position `n` bytes further on.
    pub fn offset_by(self, n: u32) -> Pos {
        Pos(self.0 + n)
    }
}

/// A position resolved to its file, byte offset and 1-indexed line/column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// The file containing the position.
    pub file: FileId,
    /// Path of that file.
    pub path: PathBuf,
    /// Byte offset within the file.
    pub offset: u32,
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed byte column.
    pub col: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_invalid() {
        assert!(!Pos::NONE.is_valid());
        assert!(Pos::from_raw(1).is_valid());
    }

    #[test]
    fn offset_by_advances() {
        assert_eq!(Pos::from_raw(10).offset_by(5), Pos::from_raw(15));
    }

    #[test]
    fn ordering() {
        assert!(Pos::from_raw(3) < Pos::from_raw(4));
    }
}
