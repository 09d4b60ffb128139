//! Error types for lexing and declaration scanning.

use std::path::PathBuf;

/// Errors raised while lexing or scanning a source file.
///
/// A file that fails to scan is not something the engine reports itself;
/// callers treat it as a reason to leave the file to the host compiler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// A character that cannot start any token.
    #[error("{}:{line}:{col}: invalid character {ch:?}", path.display())]
    InvalidCharacter {
        /// The file being scanned.
        path: PathBuf,
        /// 1-indexed line.
        line: u32,
        /// 1-indexed column.
        col: u32,
        /// The offending character.
        ch: char,
    },

    /// A string, rune or block comment with no terminator.
    #[error("{}:{line}:{col}: unterminated {what}", path.display())]
    Unterminated {
        /// The file being scanned.
        path: PathBuf,
        /// 1-indexed line of the literal start.
        line: u32,
        /// 1-indexed column of the literal start.
        col: u32,
        /// What was left open.
        what: &'static str,
    },

    /// A token the scanner did not expect at this point.
    #[error("{}:{line}:{col}: expected {expected}, found {found}", path.display())]
    Unexpected {
        /// The file being scanned.
        path: PathBuf,
        /// 1-indexed line.
        line: u32,
        /// 1-indexed column.
        col: u32,
        /// What the scanner was looking for.
        expected: String,
        /// The text of the token that was found.
        found: String,
    },

    /// A bracket that is never closed, or closed by the wrong kind.
    #[error("{}:{line}:{col}: unbalanced `{open}`", path.display())]
    Unbalanced {
        /// The file being scanned.
        path: PathBuf,
        /// 1-indexed line of the opening bracket.
        line: u32,
        /// 1-indexed column of the opening bracket.
        col: u32,
        /// The opening bracket.
        open: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_display() {
        let err = ScanError::Unexpected {
            path: PathBuf::from("pkg/a.go"),
            line: 3,
            col: 7,
            expected: "package name".to_string(),
            found: "(".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pkg/a.go:3:7: expected package name, found ("
        );
    }

    #[test]
    fn unterminated_display() {
        let err = ScanError::Unterminated {
            path: PathBuf::from("a.go"),
            line: 1,
            col: 9,
            what: "string literal",
        };
        assert_eq!(err.to_string(), "a.go:1:9: unterminated string literal");
    }
}
