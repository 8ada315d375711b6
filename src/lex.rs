//! Minimal Rust lexer for the rewrite scan path.
//!
//! The rewrite engine only needs token boundaries, not syntax: identifiers,
//! literals, comments, and punctuation, each with its exact byte span and
//! start line. Comments and string bodies are atomic tokens, so `golden!(`
//! inside either can never be mistaken for a call. Tokens are emitted in
//! order and never overlap; the bytes between them are whitespace.

use thiserror::Error;

/// Token classification. Only identifiers carry their text, because the
/// call-site scan matches on identifier spelling and punctuation shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Lifetime,
    /// String, raw string, byte, byte string, C string, or char literal.
    Literal,
    Number,
    LineComment,
    BlockComment,
    Punct(char),
}

/// A lexed token: classification plus byte span and 1-based start line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub len: usize,
    pub line: u32,
}

impl Token {
    /// Byte offset one past the end of the token.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated {what} starting on line {line}")]
    Unterminated { what: &'static str, line: u32 },

    #[error("malformed raw string delimiter on line {line}")]
    BadRawDelimiter { line: u32 },
}

/// Streaming lexer over a single source file.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    /// Produce the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();
        let start = self.pos;
        let line = self.line;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '/' => self.scan_slash(line)?,
            '"' => {
                self.bump();
                self.scan_escaped('"', "string literal", line)?;
                TokenKind::Literal
            }
            '\'' => self.scan_quote(line)?,
            'r' | 'b' | 'c' => self.scan_prefixed(c, start, line)?,
            c if is_ident_start(c) => self.scan_ident(start),
            c if c.is_ascii_digit() => self.scan_number(),
            other => {
                self.bump();
                TokenKind::Punct(other)
            }
        };

        Ok(Some(Token {
            kind,
            offset: start,
            len: self.pos - start,
            line,
        }))
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        if c == '\n' {
            self.line += 1;
        }
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn scan_ident(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            self.bump();
        }
        TokenKind::Ident(self.src[start..self.pos].to_string())
    }

    fn scan_number(&mut self) -> TokenKind {
        self.bump();
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            self.bump();
        }
        // fractional part, but not a field/method access like `x.abs()`
        if self.peek() == Some('.')
            && self.src[self.pos + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        {
            self.bump();
            while let Some(c) = self.peek() {
                if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                self.bump();
            }
        }
        TokenKind::Number
    }

    fn scan_slash(&mut self, line: u32) -> Result<TokenKind, LexError> {
        self.bump();
        match self.peek() {
            Some('/') => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
                Ok(TokenKind::LineComment)
            }
            Some('*') => {
                self.bump();
                // block comments nest in Rust
                let mut depth = 1usize;
                while depth > 0 {
                    match self.bump() {
                        None => {
                            return Err(LexError::Unterminated {
                                what: "block comment",
                                line,
                            })
                        }
                        Some('*') if self.peek() == Some('/') => {
                            self.bump();
                            depth -= 1;
                        }
                        Some('/') if self.peek() == Some('*') => {
                            self.bump();
                            depth += 1;
                        }
                        Some(_) => {}
                    }
                }
                Ok(TokenKind::BlockComment)
            }
            _ => Ok(TokenKind::Punct('/')),
        }
    }

    /// Disambiguate `'a` (lifetime) from `'a'` (char literal) by peeking past
    /// the identifier run that follows the quote.
    fn scan_quote(&mut self, line: u32) -> Result<TokenKind, LexError> {
        let rest = &self.src[self.pos + 1..];
        if let Some(first) = rest.chars().next() {
            if is_ident_start(first) {
                let run: usize = rest
                    .chars()
                    .take_while(|&c| is_ident_continue(c))
                    .map(char::len_utf8)
                    .sum();
                if rest[run..].chars().next() != Some('\'') {
                    // lifetime: quote plus identifier run, no closing quote
                    self.pos += 1 + run;
                    return Ok(TokenKind::Lifetime);
                }
            }
        }
        self.bump();
        self.scan_escaped('\'', "character literal", line)?;
        Ok(TokenKind::Literal)
    }

    /// Tokens starting with `r`, `b`, or `c`: raw strings, raw identifiers,
    /// byte and C string literals, or a plain identifier when none of the
    /// literal prefixes match.
    fn scan_prefixed(&mut self, c: char, start: usize, line: u32) -> Result<TokenKind, LexError> {
        let bytes = self.src.as_bytes();
        match c {
            'r' => {
                let mut j = start + 1;
                while bytes.get(j) == Some(&b'#') {
                    j += 1;
                }
                let hashes = j - start - 1;
                if bytes.get(j) == Some(&b'"') {
                    self.pos = j;
                    self.scan_raw_from_quote(hashes, "raw string literal", line)?;
                    return Ok(TokenKind::Literal);
                }
                if hashes == 1 && self.src[j..].chars().next().is_some_and(is_ident_start) {
                    // raw identifier, e.g. r#fn
                    self.pos = j;
                    return Ok(self.scan_ident(start));
                }
                if hashes == 0 {
                    return Ok(self.scan_ident(start));
                }
                Err(LexError::BadRawDelimiter { line })
            }
            'b' => match bytes.get(start + 1).copied() {
                Some(b'"') => {
                    self.pos = start + 2;
                    self.scan_escaped('"', "byte string literal", line)?;
                    Ok(TokenKind::Literal)
                }
                Some(b'\'') => {
                    self.pos = start + 2;
                    self.scan_escaped('\'', "byte literal", line)?;
                    Ok(TokenKind::Literal)
                }
                Some(b'r') => {
                    let mut j = start + 2;
                    while bytes.get(j) == Some(&b'#') {
                        j += 1;
                    }
                    let hashes = j - start - 2;
                    if bytes.get(j) == Some(&b'"') {
                        self.pos = j;
                        self.scan_raw_from_quote(hashes, "raw byte string literal", line)?;
                        Ok(TokenKind::Literal)
                    } else {
                        Ok(self.scan_ident(start))
                    }
                }
                _ => Ok(self.scan_ident(start)),
            },
            'c' => {
                if bytes.get(start + 1) == Some(&b'"') {
                    self.pos = start + 2;
                    self.scan_escaped('"', "C string literal", line)?;
                    Ok(TokenKind::Literal)
                } else {
                    Ok(self.scan_ident(start))
                }
            }
            _ => unreachable!("scan_prefixed only called for r/b/c"),
        }
    }

    /// Scan an escaped literal body. The opening delimiter must already be
    /// consumed; a backslash makes the following character literal.
    fn scan_escaped(&mut self, term: char, what: &'static str, line: u32) -> Result<(), LexError> {
        loop {
            match self.bump() {
                None => return Err(LexError::Unterminated { what, line }),
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(LexError::Unterminated { what, line });
                    }
                }
                Some(c) if c == term => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// Scan a raw literal body. `pos` must sit on the opening quote; the
    /// body ends at a quote followed by exactly `hashes` hash marks.
    fn scan_raw_from_quote(
        &mut self,
        hashes: usize,
        what: &'static str,
        line: u32,
    ) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.peek() {
                None => return Err(LexError::Unterminated { what, line }),
                Some('"') => {
                    let after = &self.src.as_bytes()[self.pos + 1..];
                    if after.len() >= hashes && after[..hashes].iter().all(|&b| b == b'#') {
                        self.bump();
                        self.pos += hashes;
                        return Ok(());
                    }
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
