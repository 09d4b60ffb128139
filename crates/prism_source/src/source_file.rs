//! One file of a compilation unit and its slice of the global position space.

use crate::file_id::FileId;
use crate::pos::Pos;
use crate::range::Range;
use crate::span::Span;
use std::path::PathBuf;

/// A Go file as the host handed it to the compiler.
///
/// The text is never modified: patches and captures always read from it,
/// never from partially edited output.
pub struct SourceFile {
    /// Handle of this file inside its [`SourceDb`](crate::SourceDb).
    pub id: FileId,
    /// Path on disk, or a synthetic name for generated text.
    pub path: PathBuf,
    /// Original text.
    pub content: String,
    base: u32,
    /// Offset of every line's first byte; line 1 starts at 0.
    lines: Vec<u32>,
}

impl SourceFile {
    /// Wraps `content`, placing its first byte at global position `base`.
    pub fn new(id: FileId, path: PathBuf, content: String, base: u32) -> Self {
        let lines = std::iter::once(0)
            .chain(
                content
                    .match_indices('\n')
                    .map(|(at, _)| at as u32 + 1),
            )
            .collect();
        Self {
            id,
            path,
            content,
            base,
            lines,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.content.len() as u32
    }

    /// Whether the file has no text at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Global position of the first byte.
    pub fn base(&self) -> Pos {
        Pos::from_raw(self.base)
    }

    /// Global position of byte `offset`.
    pub fn pos(&self, offset: u32) -> Pos {
        Pos::from_raw(self.base + offset)
    }

    /// Global range covered by a file-local span.
    pub fn range(&self, span: Span) -> Range {
        Range::new(self.pos(span.start), self.pos(span.end))
    }

    /// Byte offset of a global position, if it falls in this file.
    ///
    /// The position just past the last byte belongs to the file.
    pub fn offset(&self, pos: Pos) -> Option<u32> {
        pos.as_raw()
            .checked_sub(self.base)
            .filter(|&offset| offset <= self.len())
    }

    /// 1-based line and byte column of `offset`.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self.lines.partition_point(|&start| start <= offset).max(1);
        (line as u32, offset - self.lines[line - 1] + 1)
    }

    /// Text between two byte offsets.
    pub fn snippet(&self, start: u32, end: u32) -> &str {
        &self.content[start as usize..end as usize]
    }

    /// Text under `span`.
    pub fn span_text(&self, span: Span) -> &str {
        self.snippet(span.start, span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(text: &str) -> SourceFile {
        SourceFile::new(
            FileId::from_raw(0),
            PathBuf::from("unit.go"),
            text.to_string(),
            1,
        )
    }

    #[test]
    fn lines_and_columns() {
        let f = unit("package p\n\nfunc F() {}\n");
        assert_eq!(f.lines, vec![0, 10, 11, 23]);
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_col(8), (1, 9));
        assert_eq!(f.line_col(10), (2, 1));
        assert_eq!(f.line_col(16), (3, 6));
        assert_eq!(f.line_col(23), (4, 1));
    }

    #[test]
    fn columns_count_bytes() {
        let f = unit("var ä = 1");
        assert_eq!(f.line_col(7), (1, 8));
    }

    #[test]
    fn window_starts_at_base() {
        let f = unit("hello");
        assert_eq!(f.base(), Pos::from_raw(1));
        assert_eq!(f.pos(3), Pos::from_raw(4));
        assert_eq!(f.offset(Pos::from_raw(4)), Some(3));
    }

    #[test]
    fn positions_outside_window_have_no_offset() {
        let f = unit("hello");
        assert_eq!(f.offset(f.pos(5)), Some(5));
        assert_eq!(f.offset(f.pos(6)), None);
        assert_eq!(f.offset(Pos::NONE), None);
    }

    #[test]
    fn span_maps_to_global_range() {
        let f = unit("hello world");
        let span = Span::new(f.id, 6, 11);
        let r = f.range(span);
        assert_eq!(r.start, Pos::from_raw(7));
        assert_eq!(r.end, Some(Pos::from_raw(12)));
        assert_eq!(f.span_text(span), "world");
        assert_eq!(f.snippet(0, 5), "hello");
    }

    #[test]
    fn empty_text_is_one_line() {
        let f = unit("");
        assert!(f.is_empty());
        assert_eq!(f.len(), 0);
        assert_eq!(f.line_col(0), (1, 1));
    }
}
