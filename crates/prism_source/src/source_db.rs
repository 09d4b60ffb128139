//! The files of one compilation unit laid out in a single position space.

use crate::file_id::FileId;
use crate::pos::{Pos, Position};
use crate::source_file::SourceFile;
use std::io;
use std::path::{Path, PathBuf};

/// Owns the original text of a unit and maps global [`Pos`] values back to
/// files, offsets and line/column coordinates.
///
/// Files receive consecutive windows in insertion order, so the windows are
/// sorted by base and never overlap.
#[derive(Default)]
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// An empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path` from disk and adds it.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path, content))
    }

    /// Adds in-memory text under `name`.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        // One slot past the previous file's end-of-file position; 0 stays invalid.
        let base = self
            .files
            .last()
            .map_or(1, |prev| prev.base().as_raw() + prev.len() + 1);
        self.files
            .push(SourceFile::new(id, name.into(), content, base));
        id
    }

    /// The file behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from another database.
    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Every file, in insertion order.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// The file whose window holds `pos`.
    pub fn file_for_pos(&self, pos: Pos) -> Option<&SourceFile> {
        if !pos.is_valid() {
            return None;
        }
        let after = self.files.partition_point(|f| f.base() <= pos);
        let file = self.files.get(after.checked_sub(1)?)?;
        file.offset(pos).is_some().then_some(file)
    }

    /// File, offset and line/column of `pos`.
    pub fn position(&self, pos: Pos) -> Option<Position> {
        let file = self.file_for_pos(pos)?;
        let offset = file.offset(pos)?;
        let (line, col) = file.line_col(offset);
        Some(Position {
            file: file.id,
            path: file.path.clone(),
            offset,
            line,
            col,
        })
    }
}
