// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Single-pass bytecode compiler and stack-based virtual machine for Quill.
//!
//! Source text is scanned by `quill-syntax`, compiled straight into a
//! [`Chunk`] by a Pratt parser, then executed by the [`VM`].

pub mod buffer;
pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod opcode;
pub mod utils;
pub mod value;
pub mod vm;

pub use buffer::GrowableBuffer;
pub use chunk::{Chunk, LineStart};
pub use compiler::{CompileError, Diagnostic, compile};
pub use opcode::OpCode;
pub use value::Value;
pub use vm::{InterpretError, RuntimeError, VM};
