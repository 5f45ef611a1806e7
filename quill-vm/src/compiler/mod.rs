// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode compiler: transforms Quill source directly into bytecode.
//!
//! There is no intermediate AST. The compiler pulls tokens from the lexer
//! and, driven by the precedence table in [`rules`], writes instructions
//! into the chunk in the order the VM will execute them.

pub mod codegen;
pub mod rules;
pub mod types;

pub use codegen::{Compiler, compile};
pub use rules::{ParseFn, ParseRule, Precedence};
pub use types::{CompileError, Diagnostic, ErrorLocation, Result};
