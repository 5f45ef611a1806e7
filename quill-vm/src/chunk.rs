// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode chunks: instruction bytes, constant pool and line table.

use crate::buffer::GrowableBuffer;
use crate::opcode::OpCode;
use crate::utils::{U24_MAX, encode_u24};
use crate::value::Value;

/// Highest constant index addressable by the one-byte `Const` form.
pub const MAX_SHORT_CONSTANT: usize = u8::MAX as usize;

/// Maximum number of constants a chunk can hold (3-byte `ConstLong` index).
pub const MAX_CONSTANTS: usize = U24_MAX + 1;

/// Start of a run of bytecode that shares one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStart {
    /// Source line number (1-indexed).
    pub line: u32,
    /// Offset of the first byte in the run.
    pub offset: usize,
}

/// A chunk of bytecode with its constant pool and debug information.
///
/// The line table is run-length encoded: a new [`LineStart`] is recorded
/// only when a write's line differs from the previous write's line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    /// The bytecode instructions.
    code: GrowableBuffer<u8>,

    /// Constant pool, indexed by `Const`/`ConstLong` operands.
    constants: GrowableBuffer<Value>,

    /// Line runs, strictly increasing in `offset`.
    lines: GrowableBuffer<LineStart>,
}

impl Chunk {
    /// Create a new empty chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes that originate from `line`.
    pub fn write(&mut self, bytes: &[u8], line: u32) {
        if bytes.is_empty() {
            return;
        }
        if self.lines.last().is_none_or(|run| run.line != line) {
            self.lines.push(LineStart {
                line,
                offset: self.code.len(),
            });
        }
        self.code.extend_from_slice(bytes);
    }

    /// Append a single operand-less instruction.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write(&[op.into()], line);
    }

    /// Add a constant to the pool and return its index.
    ///
    /// Constants are never deduplicated.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Add a constant and emit the instruction that loads it.
    ///
    /// Indices up to [`MAX_SHORT_CONSTANT`] use the two-byte `Const` form,
    /// larger ones the four-byte `ConstLong` form. Returns `None` without
    /// touching the chunk when the pool is full.
    pub fn write_constant(&mut self, value: Value, line: u32) -> Option<usize> {
        if self.constants.len() >= MAX_CONSTANTS {
            return None;
        }
        let index = self.add_constant(value);
        if index <= MAX_SHORT_CONSTANT {
            self.write(&[OpCode::Const.into(), index as u8], line);
        } else {
            let [b0, b1, b2] = encode_u24(index);
            self.write(&[OpCode::ConstLong.into(), b0, b1, b2], line);
        }
        Some(index)
    }

    /// Get the source line for the byte at `offset`.
    ///
    /// Binary search over the line runs: finds the last run starting at or
    /// before `offset`. Returns `None` for offsets past the end of the code.
    pub fn get_line(&self, offset: usize) -> Option<u32> {
        if offset >= self.code.len() {
            return None;
        }
        let runs = self.lines.as_slice();
        let idx = runs.partition_point(|run| run.offset <= offset);
        runs.get(idx.checked_sub(1)?).map(|run| run.line)
    }

    /// The instruction bytes.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// The constant pool.
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Get a constant by index.
    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    /// The run-length encoded line table.
    pub fn line_runs(&self) -> &[LineStart] {
        &self.lines
    }

    /// Number of code bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Reset code, constants and lines together, keeping allocations.
    pub fn clear(&mut self) {
        self.code.clear();
        self.constants.clear();
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_run_length_encoded() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Nil, 1);
        chunk.write_op(OpCode::Nil, 1);
        chunk.write_op(OpCode::Add, 2);
        chunk.write_op(OpCode::Return, 2);
        chunk.write_op(OpCode::Return, 5);

        assert_eq!(
            chunk.line_runs(),
            &[
                LineStart { line: 1, offset: 0 },
                LineStart { line: 2, offset: 2 },
                LineStart { line: 5, offset: 4 },
            ]
        );
    }

    #[test]
    fn test_get_line_boundaries() {
        let mut chunk = Chunk::new();
        chunk.write(&[0, 0, 0], 10);
        chunk.write(&[0, 0], 11);
        chunk.write(&[0], 13);

        assert_eq!(chunk.get_line(0), Some(10));
        assert_eq!(chunk.get_line(2), Some(10));
        assert_eq!(chunk.get_line(3), Some(11));
        assert_eq!(chunk.get_line(4), Some(11));
        assert_eq!(chunk.get_line(5), Some(13));
        assert_eq!(chunk.get_line(6), None);
    }

    #[test]
    fn test_get_line_empty_chunk() {
        assert_eq!(Chunk::new().get_line(0), None);
    }

    #[test]
    fn test_empty_write_adds_no_line_run() {
        let mut chunk = Chunk::new();
        chunk.write(&[], 3);
        assert!(chunk.line_runs().is_empty());
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_constants_are_not_deduplicated() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.add_constant(Value::Number(1.0)), 0);
        assert_eq!(chunk.add_constant(Value::Number(1.0)), 1);
        assert_eq!(chunk.constants().len(), 2);
    }

    #[test]
    fn test_constant_encoding_switches_after_255() {
        let mut chunk = Chunk::new();
        for i in 0..=MAX_SHORT_CONSTANT {
            chunk.write_constant(Value::Number(i as f64), 1);
        }
        assert_eq!(chunk.len(), 256 * 2);

        let before = chunk.len();
        assert_eq!(chunk.write_constant(Value::Nil, 1), Some(256));
        assert_eq!(chunk.len() - before, 4);
        assert_eq!(
            &chunk.code()[before..],
            &[OpCode::ConstLong as u8, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Bool(true), 4);
        chunk.clear();
        assert!(chunk.is_empty());
        assert!(chunk.constants().is_empty());
        assert!(chunk.line_runs().is_empty());
    }
}
