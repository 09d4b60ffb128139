//! File-local byte ranges, as produced by the lexer.

use serde::{Deserialize, Serialize};

use crate::file_id::FileId;

/// Bytes `start..end` of one file.
///
/// The lexer and scanner work a file at a time in these; patches and
/// declarations carry global [`Range`](crate::Range)s instead, obtained with
/// [`SourceFile::range`](crate::SourceFile::range).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// Owning file.
    pub file: FileId,
    /// First byte.
    pub start: u32,
    /// One past the last byte.
    pub end: u32,
}

impl Span {
    /// A span of `file`.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// From the start of `self` to the end of `last`, which must follow it
    /// in the same file.
    pub fn through(self, last: Span) -> Span {
        debug_assert_eq!(self.file, last.file);
        Span {
            end: last.end.max(self.start),
            ..self
        }
    }

    /// Byte length.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no bytes, as a synthesized semicolon does.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
