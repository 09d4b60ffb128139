//! Lexical analyzer for Go source text.
//!
//! Converts a [`SourceFile`] into a sequence of [`Token`]s, applying Go's
//! automatic semicolon insertion so the scanner can treat line ends that
//! terminate a declaration like explicit `;`. Comments are not tokens; their
//! spans are collected separately so trailing comments can be attached to
//! declarations afterwards.

use prism_source::{FileId, SourceFile, Span};

use crate::error::ScanError;
use crate::token::{lookup_keyword, GoToken, Token};

/// Output of [`lex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lexed {
    /// Tokens in source order, always ending with [`GoToken::Eof`].
    pub tokens: Vec<Token>,
    /// Spans of every `//` and `/* */` comment in source order.
    pub comments: Vec<Span>,
}

/// Byte order mark Go ignores at the start of a file.
const BOM: &str = "\u{feff}";

/// Lexes the whole file.
pub fn lex(file: &SourceFile) -> Result<Lexed, ScanError> {
    let mut lexer = Lexer {
        file,
        source: file.content.as_bytes(),
        pos: if file.content.starts_with(BOM) { BOM.len() } else { 0 },
        id: file.id,
        insert_semi: false,
        tokens: Vec::new(),
        comments: Vec::new(),
    };
    lexer.lex_all()?;
    Ok(Lexed {
        tokens: lexer.tokens,
        comments: lexer.comments,
    })
}

struct Lexer<'a> {
    file: &'a SourceFile,
    source: &'a [u8],
    pos: usize,
    id: FileId,
    /// Set when a newline at this point would end a statement.
    insert_semi: bool,
    tokens: Vec<Token>,
    comments: Vec<Span>,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Result<(), ScanError> {
        loop {
            self.skip_trivia()?;
            if self.pos >= self.source.len() {
                if self.insert_semi {
                    self.push_implicit_semi(self.pos);
                }
                let end = self.pos as u32;
                self.tokens.push(Token {
                    kind: GoToken::Eof,
                    span: Span::new(self.id, end, end),
                });
                return Ok(());
            }
            let token = self.next_token()?;
            self.insert_semi = token.kind.ends_statement();
            self.tokens.push(token);
        }
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.id, start as u32, self.pos as u32)
    }

    fn push_implicit_semi(&mut self, at: usize) {
        self.tokens.push(Token {
            kind: GoToken::Semicolon,
            span: Span::new(self.id, at as u32, at as u32),
        });
        self.insert_semi = false;
    }

    fn unterminated(&self, start: usize, what: &'static str) -> ScanError {
        let (line, col) = self.file.line_col(start as u32);
        ScanError::Unterminated {
            path: self.file.path.clone(),
            line,
            col,
            what,
        }
    }

    /// Skips whitespace and comments, inserting semicolons at line ends.
    fn skip_trivia(&mut self) -> Result<(), ScanError> {
        loop {
            match self.peek() {
                b'\n' => {
                    if self.insert_semi {
                        self.push_implicit_semi(self.pos);
                    }
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek_at(1) == b'/' => {
                    let start = self.pos;
                    while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                    self.comments.push(self.span_from(start));
                }
                b'/' if self.peek_at(1) == b'*' => {
                    let start = self.pos;
                    self.pos += 2;
                    let mut has_newline = false;
                    loop {
                        if self.pos >= self.source.len() {
                            return Err(self.unterminated(start, "block comment"));
                        }
                        if self.source[self.pos] == b'*' && self.peek_at(1) == b'/' {
                            self.pos += 2;
                            break;
                        }
                        has_newline |= self.source[self.pos] == b'\n';
                        self.pos += 1;
                    }
                    // A block comment spanning lines acts like a newline.
                    if has_newline && self.insert_semi {
                        self.push_implicit_semi(start);
                    }
                    self.comments.push(self.span_from(start));
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ScanError> {
        let start = self.pos;
        let b = self.peek();

        if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 {
            return self.lex_identifier_or_keyword(start);
        }
        if b.is_ascii_digit() || (b == b'.' && self.peek_at(1).is_ascii_digit()) {
            return Ok(self.lex_number(start));
        }
        match b {
            b'"' => self.lex_quoted(start, b'"', GoToken::String, "string literal"),
            b'\'' => self.lex_quoted(start, b'\'', GoToken::Char, "rune literal"),
            b'`' => self.lex_raw_string(start),
            _ => Ok(self.lex_operator(start)),
        }
    }

    fn lex_identifier_or_keyword(&mut self, start: usize) -> Result<Token, ScanError> {
        let text = &self.file.content[start..];
        let mut len = 0;
        for ch in text.chars() {
            if ch.is_alphanumeric() || ch == '_' {
                len += ch.len_utf8();
            } else {
                break;
            }
        }
        if len == 0 {
            let ch = text.chars().next().unwrap_or('\u{fffd}');
            let (line, col) = self.file.line_col(start as u32);
            return Err(ScanError::InvalidCharacter {
                path: self.file.path.clone(),
                line,
                col,
                ch,
            });
        }
        self.pos += len;
        let word = &self.file.content[start..self.pos];
        let kind = lookup_keyword(word).unwrap_or(GoToken::Ident);
        Ok(Token {
            kind,
            span: self.span_from(start),
        })
    }

    fn lex_number(&mut self, start: usize) -> Token {
        let hex = self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X');
        while self.pos < self.source.len() {
            let c = self.source[self.pos];
            let exponent = if hex {
                matches!(c, b'p' | b'P')
            } else {
                matches!(c, b'e' | b'E')
            };
            if exponent && matches!(self.peek_at(1), b'+' | b'-') {
                self.pos += 2;
            } else if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token {
            kind: GoToken::Number,
            span: self.span_from(start),
        }
    }

    fn lex_quoted(
        &mut self,
        start: usize,
        quote: u8,
        kind: GoToken,
        what: &'static str,
    ) -> Result<Token, ScanError> {
        self.pos += 1;
        loop {
            match self.source.get(self.pos) {
                None | Some(b'\n') => return Err(self.unterminated(start, what)),
                Some(b'\\') => self.pos += 2,
                Some(&c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        Ok(Token {
            kind,
            span: self.span_from(start),
        })
    }

    fn lex_raw_string(&mut self, start: usize) -> Result<Token, ScanError> {
        self.pos += 1;
        loop {
            match self.source.get(self.pos) {
                None => return Err(self.unterminated(start, "raw string literal")),
                Some(b'`') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        Ok(Token {
            kind: GoToken::String,
            span: self.span_from(start),
        })
    }

    fn lex_operator(&mut self, start: usize) -> Token {
        const THREE: [&[u8]; 4] = [b"<<=", b">>=", b"&^=", b"..."];
        const TWO: [&[u8]; 20] = [
            b"&&", b"||", b"<-", b"++", b"--", b"==", b"!=", b"<=", b">=", b":=", b"+=", b"-=",
            b"*=", b"/=", b"%=", b"&=", b"|=", b"^=", b"<<", b">>",
        ];
        let rest = &self.source[self.pos..];
        let len = if THREE.iter().any(|op| rest.starts_with(op)) {
            3
        } else if TWO.iter().any(|op| rest.starts_with(op)) || rest.starts_with(b"&^") {
            2
        } else {
            1
        };
        let op = &rest[..len];
        self.pos += len;
        let kind = match op {
            b"(" => GoToken::LParen,
            b")" => GoToken::RParen,
            b"[" => GoToken::LBracket,
            b"]" => GoToken::RBracket,
            b"{" => GoToken::LBrace,
            b"}" => GoToken::RBrace,
            b"," => GoToken::Comma,
            b"." => GoToken::Dot,
            b"..." => GoToken::Ellipsis,
            b";" => GoToken::Semicolon,
            b"=" => GoToken::Assign,
            b"*" => GoToken::Star,
            b"<-" => GoToken::Arrow,
            b"++" | b"--" => GoToken::IncDec,
            _ => GoToken::Operator,
        };
        Token {
            kind,
            span: self.span_from(start),
        }
    }
}
