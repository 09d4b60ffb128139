//! Loaded compilation units and the loader seam.

use std::path::{Path, PathBuf};

use prism_common::Outcome;
use prism_source::{FileId, Range, SourceDb, SourceFile};
use prism_syntax::{scan_file, FileSyntax};
use tracing::debug;

use crate::error::EngineError;

/// One package's source files and their scanned declarations, read-only.
pub struct CompilationUnit {
    /// Import path of the package.
    pub import_path: String,
    /// Name from the package clauses.
    pub package_name: String,
    /// Original text of every file; all positions resolve here.
    pub db: SourceDb,
    /// Declarations per file, in the order of `db.files()`.
    pub files: Vec<FileSyntax>,
}

impl CompilationUnit {
    /// The source file with the given id.
    pub fn file(&self, id: FileId) -> &SourceFile {
        self.db.file(id)
    }

    /// The original text covered by `range`, if it lies within one file.
    pub fn text(&self, range: Range) -> Option<&str> {
        let file = self.db.file_for_pos(range.start)?;
        let start = file.offset(range.start)?;
        let end = file.offset(range.splice_end())?;
        (start <= end).then(|| file.snippet(start, end))
    }

    /// Scanned declarations paired with their source files.
    pub fn syntax(&self) -> impl Iterator<Item = (&SourceFile, &FileSyntax)> {
        self.files.iter().map(move |s| (self.db.file(s.file), s))
    }
}

/// Loads compilation units for the dimension compiler.
pub trait UnitLoader {
    /// Loads `import_path` from the given source files.
    ///
    /// Source the host compiler would reject defers, so the compiler's own
    /// diagnostics reach the user.
    fn load(&self, import_path: &str, sources: &[PathBuf])
        -> Result<Outcome<CompilationUnit>, EngineError>;
}

/// The default loader: reads each file and scans its top-level declarations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxLoader;

impl UnitLoader for SyntaxLoader {
    fn load(
        &self,
        import_path: &str,
        sources: &[PathBuf],
    ) -> Result<Outcome<CompilationUnit>, EngineError> {
        let mut db = SourceDb::new();
        for path in sources {
            db.load_file(path).map_err(|e| EngineError::io(path, e))?;
        }
        Ok(unit_from_db(import_path, db))
    }
}

/// Scans every file of `db` into a unit, deferring on malformed source.
pub fn unit_from_db(import_path: &str, db: SourceDb) -> Outcome<CompilationUnit> {
    let mut files = Vec::with_capacity(db.files().len());
    for file in db.files() {
        match scan_file(file) {
            Ok(syntax) => files.push(syntax),
            Err(err) => {
                debug!(package = %import_path, error = %err, "failed scanning source file");
                return Outcome::deferred(err.to_string());
            }
        }
    }
    let Some(first) = files.first() else {
        return Outcome::deferred(format!("package {import_path} has no source files"));
    };
    let package_name = first.package.name.clone();
    if let Some(other) = files.iter().find(|s| s.package.name != package_name) {
        let path = display_path(db.file(other.file).path.as_path());
        debug!(package = %import_path, file = %path, "mixed package clauses");
        return Outcome::deferred(format!(
            "{path}: package {} differs from {package_name}",
            other.package.name
        ));
    }
    Outcome::Ready(CompilationUnit {
        import_path: import_path.to_string(),
        package_name,
        db,
        files,
    })
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
