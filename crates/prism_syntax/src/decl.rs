//! The read-only declaration model produced by the scanner.
//!
//! All ranges are global positions in the owning source database, so they
//! can be used directly as patch ranges and captures.

use prism_source::{FileId, Pos, Range};
use serde::{Deserialize, Serialize};

/// An identifier occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    /// The identifier text.
    pub name: String,
    /// Where it appears.
    pub range: Range,
}

/// A comment, including its `//` or `/* */` delimiters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Raw comment text.
    pub text: String,
    /// Where it appears.
    pub range: Range,
}

/// One import spec: `[alias] "path"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// The local name, `_` or `.`, if written.
    pub alias: Option<Ident>,
    /// The unquoted import path.
    pub path: String,
    /// Range of the quoted path literal.
    pub path_range: Range,
}

/// A type expression, kept as canonical text plus its source range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeExpr {
    /// Canonical rendering (see [`crate::printer`]).
    pub text: String,
    /// Source range of the type.
    pub range: Range,
    /// Whether the type is a function type.
    pub is_func: bool,
}

impl TypeExpr {
    /// Position right after the type, where an initializer would go.
    pub fn end(&self) -> Pos {
        self.range.splice_end()
    }
}

/// One top-level `var` spec.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarSpec {
    /// Declared names, in order.
    pub names: Vec<Ident>,
    /// The declared type, absent for `var x = expr`.
    pub ty: Option<TypeExpr>,
    /// Whether the var spec has an `= value` part.
    pub has_value: bool,
    /// Comments on the same line after the var spec.
    pub line_comments: Vec<Comment>,
    /// Range of the whole spec.
    pub range: Range,
}

/// A top-level function or method declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDecl {
    /// Function name.
    pub name: Ident,
    /// Whether this is a method.
    pub has_receiver: bool,
    /// Whether the function declares type parameters.
    pub has_type_params: bool,
    /// Canonical rendering of the function type, e.g. `func(x int) string`.
    pub signature: String,
    /// Range of the body including braces, absent for external functions.
    pub body: Option<Range>,
    /// Range of the whole declaration.
    pub range: Range,
}

/// The scanned top level of one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSyntax {
    /// The file scanned.
    pub file: FileId,
    /// Name from the package clause.
    pub package: Ident,
    /// Import specs in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level `var` specs in source order.
    pub vars: Vec<VarSpec>,
    /// Top-level functions and methods in source order.
    pub funcs: Vec<FuncDecl>,
}

impl FileSyntax {
    /// Finds a receiver-less function by name.
    pub fn func(&self, name: &str) -> Option<&FuncDecl> {
        self.funcs
            .iter()
            .find(|f| !f.has_receiver && f.name.name == name)
    }
}
