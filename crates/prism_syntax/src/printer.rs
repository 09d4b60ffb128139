//! Canonical single-line rendering of token sequences.
//!
//! Two type expressions render to the same string exactly when they consist
//! of the same tokens, ignoring layout, comments and trailing commas. This is
//! what signature comparison relies on, so parameter names and spelling are
//! significant while line breaks are not.

use prism_source::SourceFile;

use crate::token::{GoToken, Token};

/// Renders `tokens` of `file` on one line with deterministic spacing.
pub fn render(file: &SourceFile, tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<GoToken> = None;
    let mut prev_prev: Option<GoToken> = None;
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).map(|t| t.kind);
        match token.kind {
            // Trailing commas and separators before a closer carry no meaning.
            GoToken::Comma | GoToken::Semicolon if next.is_some_and(GoToken::closes_group) => {
                continue
            }
            GoToken::Eof => continue,
            _ => {}
        }
        if let Some(p) = prev {
            if space_between(prev_prev, p, token.kind, next) {
                out.push(' ');
            }
        }
        if token.kind == GoToken::Semicolon {
            out.push(';');
        } else {
            out.push_str(file.span_text(token.span));
        }
        prev_prev = prev;
        prev = Some(token.kind);
    }
    out
}

fn space_between(
    before_prev: Option<GoToken>,
    prev: GoToken,
    cur: GoToken,
    next: Option<GoToken>,
) -> bool {
    use GoToken::*;
    match (prev, cur) {
        (Comma | Semicolon, _) => true,
        (_, Comma | Semicolon | RParen | RBracket | Dot) => false,
        (LParen | LBracket | Dot | Star | Ellipsis, _) => false,
        (LBrace, RBrace) => false,
        (LBrace, _) | (_, RBrace) => true,
        (_, LBrace) => false,
        (Func | Map, LParen | LBracket) => false,
        (Chan, Arrow) => false,
        (Arrow, _) => before_prev == Some(Chan),
        // `x []int` and `x [4]int` separate a name from an array type,
        // while `List[int]` instantiates a generic.
        (Ident, LBracket) => matches!(next, Some(RBracket | Number | Ellipsis)),
        (Ident, LParen) => false,
        (RBracket, _) => false,
        _ => true,
    }
}
