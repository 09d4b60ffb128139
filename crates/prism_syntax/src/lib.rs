//! Lexer and top-level declaration scanner for Go source files.
//!
//! The dimension engine only needs a shallow view of each file: the package
//! clause, the import specs, top-level `var` specs with their trailing line
//! comments, and `func` declarations with their signatures. [`scan_file`]
//! produces that view as a [`FileSyntax`] whose ranges are global positions
//! of the owning [`SourceDb`](prism_source::SourceDb), ready to be used as
//! patch targets. Function bodies and initializer expressions are skipped by
//! bracket matching and never parsed.

#![warn(missing_docs)]

pub mod decl;
pub mod error;
pub mod lexer;
pub mod printer;
pub mod scanner;
pub mod token;

pub use decl::{Comment, FileSyntax, FuncDecl, Ident, ImportSpec, TypeExpr, VarSpec};
pub use error::ScanError;
pub use lexer::{lex, Lexed};
pub use scanner::scan_file;
pub use token::{GoToken, Token};
