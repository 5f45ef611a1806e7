// quill-syntax - Lexer for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexer (tokeniser) for Quill source code.
//!
//! Tokens are produced on demand by [`Lexer::scan_token`]. Lexical errors do
//! not abort scanning: they come back as `TokenKind::Error` tokens whose
//! lexeme is the diagnostic message. Once the source is exhausted every call
//! returns an `Eof` token.

use crate::token::{Token, TokenKind};

/// The lexer converts source code into tokens.
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    /// Start of the token being scanned.
    start: usize,
    /// Cursor: next byte to consume.
    current: usize,
    line: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scan the next token from the source.
    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace_and_comments();
        self.start = self.current;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        if is_alpha(c) {
            return self.read_identifier();
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => self.make_pair(b'=', TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.make_pair(b'=', TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.make_pair(b'=', TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.make_pair(b'=', TokenKind::GreaterEqual, TokenKind::Greater),
            b'"' => self.read_string(),
            _ => {
                // Never split a multi-byte character across two error tokens.
                while !self.source.is_char_boundary(self.current) {
                    self.current += 1;
                }
                self.error_token("Unexpected character.")
            }
        }
    }

    /// Collect all tokens up to (not including) `Eof`.
    pub fn tokenize(self) -> Vec<Token<'src>> {
        self.collect()
    }

    /// The source being scanned.
    pub fn source(&self) -> &'src str {
        self.source
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.current + 1).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.current += 1;
        Some(c)
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token::new(
            kind,
            &self.source[self.start..self.current],
            self.start,
            self.current - self.start,
            self.line,
        )
    }

    fn make_pair(&mut self, second: u8, pair: TokenKind, single: TokenKind) -> Token<'src> {
        let kind = if self.matches(second) { pair } else { single };
        self.make_token(kind)
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token::new(
            TokenKind::Error,
            message,
            self.start,
            self.current - self.start,
            self.line,
        )
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\r' | b'\t') => {
                    self.current += 1;
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.current += 1;
                }
                Some(b'/') if self.peek_next() == Some(b'/') => {
                    // Skip to end of line; the newline itself is counted above.
                    while !self.is_at_end() && self.peek() != Some(b'\n') {
                        self.current += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.current += 1;
        }
        self.make_token(self.identifier_kind())
    }

    /// Classify the identifier in `start..current` as a keyword or plain identifier.
    fn identifier_kind(&self) -> TokenKind {
        let lexeme = &self.bytes[self.start..self.current];
        match lexeme[0] {
            b'a' => self.check_keyword(1, "nd", TokenKind::And),
            b'c' => self.check_keyword(1, "lass", TokenKind::Class),
            b'e' => self.check_keyword(1, "lse", TokenKind::Else),
            b'f' if lexeme.len() > 1 => match lexeme[1] {
                b'a' => self.check_keyword(2, "lse", TokenKind::False),
                b'o' => self.check_keyword(2, "r", TokenKind::For),
                b'u' => self.check_keyword(2, "n", TokenKind::Fun),
                _ => TokenKind::Identifier,
            },
            b'i' => self.check_keyword(1, "f", TokenKind::If),
            b'n' => self.check_keyword(1, "il", TokenKind::Nil),
            b'o' => self.check_keyword(1, "r", TokenKind::Or),
            b'p' => self.check_keyword(1, "rint", TokenKind::Print),
            b'r' => self.check_keyword(1, "eturn", TokenKind::Return),
            b's' => self.check_keyword(1, "uper", TokenKind::Super),
            b't' if lexeme.len() > 1 => match lexeme[1] {
                b'h' => self.check_keyword(2, "is", TokenKind::This),
                b'r' => self.check_keyword(2, "ue", TokenKind::True),
                _ => TokenKind::Identifier,
            },
            b'v' => self.check_keyword(1, "ar", TokenKind::Var),
            b'w' => self.check_keyword(1, "hile", TokenKind::While),
            _ => TokenKind::Identifier,
        }
    }

    fn check_keyword(&self, offset: usize, rest: &str, kind: TokenKind) -> TokenKind {
        let lexeme = &self.bytes[self.start..self.current];
        if lexeme.len() == offset + rest.len() && &lexeme[offset..] == rest.as_bytes() {
            kind
        } else {
            TokenKind::Identifier
        }
    }

    fn read_number(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
        }

        // Fractional part requires a digit after the dot.
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.current += 1;
            }
        }

        self.make_token(TokenKind::Number)
    }

    fn read_string(&mut self) -> Token<'src> {
        while let Some(c) = self.peek() {
            if c == b'"' {
                break;
            }
            if c == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }

        if self.is_at_end() {
            return self.error_token("Unterminated string.");
        }

        // Closing quote
        self.current += 1;
        self.make_token(TokenKind::String)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.scan_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}
