//! Top-level declaration scanner.
//!
//! Walks the token stream of one file and records the package clause,
//! imports, `var` specs and `func` declarations. Anything nested (bodies,
//! initializers, struct fields, `const` and `type` declarations) is skipped
//! by bracket matching, so the scanner accepts any file whose brackets
//! balance and whose top level is well formed.

use prism_source::{Range, SourceFile, Span};

use crate::decl::{Comment, FileSyntax, FuncDecl, Ident, ImportSpec, TypeExpr, VarSpec};
use crate::error::ScanError;
use crate::lexer::lex;
use crate::printer;
use crate::token::{GoToken, Token};

/// Scans the top-level declarations of `file`.
pub fn scan_file(file: &SourceFile) -> Result<FileSyntax, ScanError> {
    let lexed = lex(file)?;
    let scanner = Scanner {
        file,
        tokens: &lexed.tokens,
        comments: &lexed.comments,
        pos: 0,
    };
    scanner.scan()
}

struct Scanner<'a> {
    file: &'a SourceFile,
    tokens: &'a [Token],
    comments: &'a [Span],
    pos: usize,
}

impl Scanner<'_> {
    fn scan(mut self) -> Result<FileSyntax, ScanError> {
        self.expect(GoToken::Package, "`package`")?;
        let package = self.expect(GoToken::Ident, "package name")?;
        let package = self.ident(package);
        self.expect_semi()?;

        let mut imports = Vec::new();
        let mut vars = Vec::new();
        let mut funcs = Vec::new();
        loop {
            match self.peek().kind {
                GoToken::Eof => break,
                GoToken::Semicolon => self.pos += 1,
                GoToken::Import => self.import_decl(&mut imports)?,
                GoToken::Var => self.var_decl(&mut vars)?,
                GoToken::Func => funcs.push(self.func_decl()?),
                GoToken::Const | GoToken::Type => self.skip_decl()?,
                _ => return Err(self.unexpected("declaration")),
            }
        }

        Ok(FileSyntax {
            file: self.file.id,
            package,
            imports,
            vars,
            funcs,
        })
    }

    // === Token helpers ===

    fn peek(&self) -> Token {
        // The stream always ends with Eof, which is never consumed.
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: GoToken) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if token.kind != GoToken::Eof {
            self.pos += 1;
        }
        token
    }

    fn previous(&self) -> Token {
        self.tokens[self.pos.saturating_sub(1)]
    }

    fn expect(&mut self, kind: GoToken, what: &str) -> Result<Token, ScanError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_semi(&mut self) -> Result<(), ScanError> {
        match self.peek().kind {
            GoToken::Semicolon => {
                self.pos += 1;
                Ok(())
            }
            GoToken::Eof => Ok(()),
            _ => Err(self.unexpected("`;` or newline")),
        }
    }

    fn text(&self, token: Token) -> &str {
        self.file.span_text(token.span)
    }

    fn ident(&self, token: Token) -> Ident {
        Ident {
            name: self.text(token).to_string(),
            range: self.file.range(token.span),
        }
    }

    fn range(&self, first: Token, last: Token) -> Range {
        self.file.range(first.span.through(last.span))
    }

    fn unexpected(&self, expected: &str) -> ScanError {
        let token = self.peek();
        let (line, col) = self.file.line_col(token.span.start);
        let found = match token.kind {
            GoToken::Eof => "end of file".to_string(),
            GoToken::Semicolon if token.span.is_empty() => "newline".to_string(),
            _ => self.text(token).to_string(),
        };
        ScanError::Unexpected {
            path: self.file.path.clone(),
            line,
            col,
            expected: expected.to_string(),
            found,
        }
    }

    fn unbalanced(&self, open: Token) -> ScanError {
        let (line, col) = self.file.line_col(open.span.start);
        ScanError::Unbalanced {
            path: self.file.path.clone(),
            line,
            col,
            open: self.text(open).to_string(),
        }
    }

    /// Consumes a bracketed group starting at the current opener.
    fn skip_group(&mut self) -> Result<(), ScanError> {
        let mut stack: Vec<Token> = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                GoToken::Eof => {
                    return Err(match stack.last() {
                        Some(open) => self.unbalanced(*open),
                        None => self.unexpected("`(`, `[` or `{`"),
                    })
                }
                k if k.opens_group() => {
                    stack.push(token);
                    self.pos += 1;
                }
                k if k.closes_group() => {
                    let Some(open) = stack.pop() else {
                        return Err(self.unexpected("`(`, `[` or `{`"));
                    };
                    if !closes(open.kind, k) {
                        return Err(self.unbalanced(open));
                    }
                    self.pos += 1;
                    if stack.is_empty() {
                        return Ok(());
                    }
                }
                _ if stack.is_empty() => return Err(self.unexpected("`(`, `[` or `{`")),
                _ => self.pos += 1,
            }
        }
    }

    /// Consumes tokens up to (not including) a top-level token in `stops`,
    /// a top-level closer, or the end of file.
    fn skip_until(&mut self, stops: &[GoToken]) -> Result<(), ScanError> {
        loop {
            let kind = self.peek().kind;
            if kind == GoToken::Eof || kind.closes_group() || stops.contains(&kind) {
                return Ok(());
            }
            if kind.opens_group() {
                self.skip_group()?;
            } else {
                self.pos += 1;
            }
        }
    }

    /// Comments on the line of `last`, after it, and before the next
    /// significant token.
    fn line_comments(&self, last: Token) -> Vec<Comment> {
        let line = self.file.line_col(last.span.end).0;
        let bound = self.tokens[self.pos..]
            .iter()
            .find(|t| t.kind != GoToken::Semicolon)
            .map_or(u32::MAX, |t| t.span.start);
        self.comments
            .iter()
            .filter(|c| {
                c.start >= last.span.end
                    && c.start < bound
                    && self.file.line_col(c.start).0 == line
            })
            .map(|c| Comment {
                text: self.file.span_text(*c).trim_end().to_string(),
                range: self.file.range(*c),
            })
            .collect()
    }

    // === Declarations ===

    /// Runs `spec` once, or once per spec of a parenthesized group.
    fn grouped<T>(
        &mut self,
        out: &mut Vec<T>,
        mut spec: impl FnMut(&mut Self) -> Result<T, ScanError>,
    ) -> Result<(), ScanError> {
        if !self.at(GoToken::LParen) {
            out.push(spec(&mut *self)?);
            return self.expect_semi();
        }
        self.pos += 1;
        loop {
            match self.peek().kind {
                GoToken::RParen => {
                    self.pos += 1;
                    return self.expect_semi();
                }
                GoToken::Semicolon => self.pos += 1,
                _ => {
                    out.push(spec(&mut *self)?);
                    if !self.at(GoToken::RParen) {
                        self.expect(GoToken::Semicolon, "`;`, newline or `)`")?;
                    }
                }
            }
        }
    }

    fn import_decl(&mut self, out: &mut Vec<ImportSpec>) -> Result<(), ScanError> {
        self.advance();
        self.grouped(out, Self::import_spec)
    }

    fn import_spec(&mut self) -> Result<ImportSpec, ScanError> {
        let alias = match self.peek().kind {
            GoToken::Ident | GoToken::Dot => {
                let token = self.advance();
                Some(self.ident(token))
            }
            _ => None,
        };
        let lit = self.expect(GoToken::String, "import path")?;
        let quoted = self.text(lit);
        let path = quoted
            .get(1..quoted.len().saturating_sub(1))
            .unwrap_or_default()
            .to_string();
        Ok(ImportSpec {
            alias,
            path,
            path_range: self.file.range(lit.span),
        })
    }

    fn var_decl(&mut self, out: &mut Vec<VarSpec>) -> Result<(), ScanError> {
        self.advance();
        self.grouped(out, Self::var_spec)
    }

    fn var_spec(&mut self) -> Result<VarSpec, ScanError> {
        let first = self.peek();
        let mut names = Vec::new();
        loop {
            let name = self.expect(GoToken::Ident, "variable name")?;
            names.push(self.ident(name));
            if !self.at(GoToken::Comma) {
                break;
            }
            self.pos += 1;
        }

        let ty = if self.at(GoToken::Assign) {
            None
        } else {
            let start = self.pos;
            self.skip_until(&[GoToken::Assign, GoToken::Semicolon])?;
            if self.pos == start {
                return Err(self.unexpected("type or `=`"));
            }
            let tokens = &self.tokens[start..self.pos];
            Some(TypeExpr {
                text: printer::render(self.file, tokens),
                range: self.range(tokens[0], tokens[tokens.len() - 1]),
                is_func: tokens[0].kind == GoToken::Func,
            })
        };

        let has_value = self.at(GoToken::Assign);
        if has_value {
            self.pos += 1;
            let start = self.pos;
            self.skip_until(&[GoToken::Semicolon])?;
            if self.pos == start {
                return Err(self.unexpected("initializer"));
            }
        }

        let last = self.previous();
        Ok(VarSpec {
            names,
            ty,
            has_value,
            line_comments: self.line_comments(last),
            range: self.range(first, last),
        })
    }

    fn func_decl(&mut self) -> Result<FuncDecl, ScanError> {
        let func = self.advance();
        let has_receiver = self.at(GoToken::LParen);
        if has_receiver {
            self.skip_group()?;
        }
        let name = self.expect(GoToken::Ident, "function name")?;
        let name = self.ident(name);
        let has_type_params = self.at(GoToken::LBracket);
        if has_type_params {
            self.skip_group()?;
        }

        let sig_start = self.pos;
        if !self.at(GoToken::LParen) {
            return Err(self.unexpected("`(`"));
        }
        self.skip_group()?;
        // Results run up to the body; `struct{...}` and `interface{...}`
        // braces belong to the type.
        loop {
            let kind = self.peek().kind;
            let prev = self.previous().kind;
            match kind {
                GoToken::LBrace if !matches!(prev, GoToken::Struct | GoToken::Interface) => break,
                GoToken::Semicolon | GoToken::Eof => break,
                k if k.opens_group() => self.skip_group()?,
                k if k.closes_group() => return Err(self.unexpected("function body")),
                _ => self.pos += 1,
            }
        }
        let signature = format!(
            "func{}",
            printer::render(self.file, &self.tokens[sig_start..self.pos])
        );

        let body = if self.at(GoToken::LBrace) {
            let open = self.peek();
            self.skip_group()?;
            Some(self.range(open, self.previous()))
        } else {
            None
        };
        let range = self.range(func, self.previous());
        self.expect_semi()?;

        Ok(FuncDecl {
            name,
            has_receiver,
            has_type_params,
            signature,
            body,
            range,
        })
    }

    fn skip_decl(&mut self) -> Result<(), ScanError> {
        self.advance();
        if self.at(GoToken::LParen) {
            self.skip_group()?;
        } else {
            self.skip_until(&[GoToken::Semicolon])?;
        }
        self.expect_semi()
    }
}

fn closes(open: GoToken, close: GoToken) -> bool {
    matches!(
        (open, close),
        (GoToken::LParen, GoToken::RParen)
            | (GoToken::LBracket, GoToken::RBracket)
            | (GoToken::LBrace, GoToken::RBrace)
    )
}
