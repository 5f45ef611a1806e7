// quill-syntax - Lexer for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # quill-syntax
//!
//! Lexer for the Quill expression language.
//! Produces [`Token`]s on demand from a source string.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
