//! Token types for the Go lexer.
//!
//! Defines the [`GoToken`] enum covering the Go keywords, the punctuation the
//! declaration scanner inspects, and literal classes, plus the [`Token`]
//! struct pairing a kind with its source [`Span`].

use prism_source::Span;
use serde::{Deserialize, Serialize};

/// A Go token kind.
///
/// Literal and identifier text is not stored in the token; it is retrieved
/// from the source text using the token's span. Operators the scanner never
/// needs to tell apart share the [`GoToken::Operator`] kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GoToken {
    // === Keywords ===
    /// `break`
    Break,
    /// `case`
    Case,
    /// `chan`
    Chan,
    /// `const`
    Const,
    /// `continue`
    Continue,
    /// `default`
    Default,
    /// `defer`
    Defer,
    /// `else`
    Else,
    /// `fallthrough`
    Fallthrough,
    /// `for`
    For,
    /// `func`
    Func,
    /// `go`
    Go,
    /// `goto`
    Goto,
    /// `if`
    If,
    /// `import`
    Import,
    /// `interface`
    Interface,
    /// `map`
    Map,
    /// `package`
    Package,
    /// `range`
    Range,
    /// `return`
    Return,
    /// `select`
    Select,
    /// `struct`
    Struct,
    /// `switch`
    Switch,
    /// `type`
    Type,
    /// `var`
    Var,

    // === Literals ===
    /// An identifier.
    Ident,
    /// An integer, floating-point or imaginary literal.
    Number,
    /// A rune literal.
    Char,
    /// An interpreted or raw string literal.
    String,

    // === Punctuation ===
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `;`, written or inserted at a line end.
    Semicolon,
    /// `=`
    Assign,
    /// `*`
    Star,
    /// `<-`
    Arrow,
    /// `++` or `--`, which allow semicolon insertion.
    IncDec,
    /// Any other operator.
    Operator,

    /// End of file.
    Eof,
}

impl GoToken {
    /// Returns `true` for keywords.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            GoToken::Break
                | GoToken::Case
                | GoToken::Chan
                | GoToken::Const
                | GoToken::Continue
                | GoToken::Default
                | GoToken::Defer
                | GoToken::Else
                | GoToken::Fallthrough
                | GoToken::For
                | GoToken::Func
                | GoToken::Go
                | GoToken::Goto
                | GoToken::If
                | GoToken::Import
                | GoToken::Interface
                | GoToken::Map
                | GoToken::Package
                | GoToken::Range
                | GoToken::Return
                | GoToken::Select
                | GoToken::Struct
                | GoToken::Switch
                | GoToken::Type
                | GoToken::Var
        )
    }

    /// Returns `true` for identifiers, keywords and literals.
    pub fn is_word(self) -> bool {
        self.is_keyword()
            || matches!(
                self,
                GoToken::Ident | GoToken::Number | GoToken::Char | GoToken::String
            )
    }

    /// Returns `true` if a newline after this token ends the statement.
    pub fn ends_statement(self) -> bool {
        matches!(
            self,
            GoToken::Ident
                | GoToken::Number
                | GoToken::Char
                | GoToken::String
                | GoToken::Break
                | GoToken::Continue
                | GoToken::Fallthrough
                | GoToken::Return
                | GoToken::IncDec
                | GoToken::RParen
                | GoToken::RBracket
                | GoToken::RBrace
        )
    }

    /// Returns `true` for tokens that open a bracketed group.
    pub fn opens_group(self) -> bool {
        matches!(self, GoToken::LParen | GoToken::LBracket | GoToken::LBrace)
    }

    /// Returns `true` for tokens that close a bracketed group.
    pub fn closes_group(self) -> bool {
        matches!(self, GoToken::RParen | GoToken::RBracket | GoToken::RBrace)
    }
}

/// A lexed token with its kind and source location.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// The kind of this token.
    pub kind: GoToken,
    /// The source span covering this token's text. Inserted semicolons have
    /// an empty span at the line end.
    pub span: Span,
}

/// Looks up a keyword from an identifier string.
pub fn lookup_keyword(s: &str) -> Option<GoToken> {
    match s {
        "break" => Some(GoToken::Break),
        "case" => Some(GoToken::Case),
        "chan" => Some(GoToken::Chan),
        "const" => Some(GoToken::Const),
        "continue" => Some(GoToken::Continue),
        "default" => Some(GoToken::Default),
        "defer" => Some(GoToken::Defer),
        "else" => Some(GoToken::Else),
        "fallthrough" => Some(GoToken::Fallthrough),
        "for" => Some(GoToken::For),
        "func" => Some(GoToken::Func),
        "go" => Some(GoToken::Go),
        "goto" => Some(GoToken::Goto),
        "if" => Some(GoToken::If),
        "import" => Some(GoToken::Import),
        "interface" => Some(GoToken::Interface),
        "map" => Some(GoToken::Map),
        "package" => Some(GoToken::Package),
        "range" => Some(GoToken::Range),
        "return" => Some(GoToken::Return),
        "select" => Some(GoToken::Select),
        "struct" => Some(GoToken::Struct),
        "switch" => Some(GoToken::Switch),
        "type" => Some(GoToken::Type),
        "var" => Some(GoToken::Var),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup() {
        assert_eq!(lookup_keyword("func"), Some(GoToken::Func));
        assert_eq!(lookup_keyword("var"), Some(GoToken::Var));
        assert_eq!(lookup_keyword("Func"), None);
        assert_eq!(lookup_keyword("string"), None);
    }

    #[test]
    fn statement_enders() {
        assert!(GoToken::Ident.ends_statement());
        assert!(GoToken::RParen.ends_statement());
        assert!(GoToken::Return.ends_statement());
        assert!(!GoToken::Comma.ends_statement());
        assert!(!GoToken::Func.ends_statement());
        assert!(!GoToken::LBrace.ends_statement());
    }

    #[test]
    fn words() {
        assert!(GoToken::Chan.is_word());
        assert!(GoToken::String.is_word());
        assert!(!GoToken::Star.is_word());
    }
}
