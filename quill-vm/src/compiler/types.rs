// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared types for the bytecode compiler.

use std::fmt;

use quill_syntax::{Token, TokenKind};

/// Where in the source a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At the end of input.
    End,
    /// At a specific lexeme.
    Lexeme(String),
    /// Lexical errors: the message already describes the problem.
    Unspecified,
}

/// A single positioned compile-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub location: ErrorLocation,
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic pointing at `token`.
    pub fn at(token: &Token<'_>, message: impl Into<String>) -> Self {
        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::End,
            TokenKind::Error => ErrorLocation::Unspecified,
            _ => ErrorLocation::Lexeme(token.lexeme.to_string()),
        };
        Self {
            line: token.line,
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;
        match &self.location {
            ErrorLocation::End => write!(f, " at end")?,
            ErrorLocation::Lexeme(lexeme) => write!(f, " at '{}'", lexeme)?,
            ErrorLocation::Unspecified => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Error during compilation: every diagnostic reported before the compile gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render(.diagnostics))]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Messages only, without positions.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().map(|d| d.message.as_str())
    }
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(Diagnostic::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_format() {
        let at_lexeme = Token::new(TokenKind::Plus, "+", 4, 1, 3);
        assert_eq!(
            Diagnostic::at(&at_lexeme, "Expect expression.").to_string(),
            "[line 3] Error at '+': Expect expression."
        );

        let at_end = Token::new(TokenKind::Eof, "", 9, 0, 2);
        assert_eq!(
            Diagnostic::at(&at_end, "Expect ')' after expression.").to_string(),
            "[line 2] Error at end: Expect ')' after expression."
        );

        let lexical = Token::new(TokenKind::Error, "Unexpected character.", 0, 1, 1);
        assert_eq!(
            Diagnostic::at(&lexical, lexical.lexeme).to_string(),
            "[line 1] Error: Unexpected character."
        );
    }

    #[test]
    fn test_compile_error_joins_lines() {
        let eof = Token::eof();
        let err = CompileError::new(vec![
            Diagnostic::at(&eof, "first"),
            Diagnostic::at(&eof, "second"),
        ]);
        assert_eq!(
            err.to_string(),
            "[line 1] Error at end: first\n[line 1] Error at end: second"
        );
        assert_eq!(err.messages().collect::<Vec<_>>(), vec!["first", "second"]);
    }
}
