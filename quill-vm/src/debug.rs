// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Human-readable disassembly of chunks.

use std::fmt::Write;

use crate::chunk::Chunk;
use crate::opcode::OpCode;
use crate::utils::decode_u24;

/// Widest instruction, in bytes; the byte columns are padded to this.
const MAX_INSTRUCTION_BYTES: usize = 4;

/// Disassemble a whole chunk under a `=== name ===` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", name);
    let _ = writeln!(out, "OFFSET B0 B1 B2 B3 LINE   OPCODE");
    let _ = writeln!(out, "------ -- -- -- -- -----  ----------------");

    let mut offset = 0;
    while offset < chunk.len() {
        let (line, next) = disassemble_instruction(chunk, offset);
        out.push_str(&line);
        out.push('\n');
        offset = next;
    }
    out
}

/// Disassemble the instruction at `offset`.
///
/// Returns the formatted line (without trailing newline) and the offset of
/// the next instruction. Unknown opcodes advance by one byte.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let code = chunk.code();
    let mut out = String::new();

    let Some(&byte) = code.get(offset) else {
        let _ = write!(out, "{:06} <end of chunk>", offset);
        return (out, offset + 1);
    };
    let op = OpCode::from_byte(byte);
    let size = op
        .map_or(1, OpCode::size)
        .min(code.len() - offset)
        .min(MAX_INSTRUCTION_BYTES);

    // Instruction bytes
    let _ = write!(out, "{:06} ", offset);
    for b in &code[offset..offset + size] {
        let _ = write!(out, "{:02X} ", b);
    }
    for _ in size..MAX_INSTRUCTION_BYTES {
        out.push_str("   ");
    }

    // Line numbers
    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        out.push_str("    |  ");
    } else {
        let _ = write!(out, "{:5}  ", line.unwrap_or(0));
    }

    match op {
        Some(op @ OpCode::Const) if size == op.size() => {
            constant_instruction(&mut out, chunk, op, code[offset + 1] as usize);
        }
        Some(op @ OpCode::ConstLong) if size == op.size() => {
            let index = decode_u24([code[offset + 1], code[offset + 2], code[offset + 3]]);
            constant_instruction(&mut out, chunk, op, index);
        }
        Some(op @ (OpCode::Const | OpCode::ConstLong)) => {
            let _ = write!(out, "{:<16} <truncated>", op.name());
        }
        Some(op) => {
            let _ = write!(out, "{:<16}", op.name());
        }
        None => {
            let _ = write!(out, "Unknown opcode: {}", byte);
        }
    }

    (out.trim_end().to_string(), offset + size)
}

fn constant_instruction(out: &mut String, chunk: &Chunk, op: OpCode, index: usize) {
    match chunk.constant(index) {
        Some(value) => {
            let _ = write!(out, "{:<16} {:4} '{}'", op.name(), index, value);
        }
        None => {
            let _ = write!(out, "{:<16} {:4} <missing>", op.name(), index);
        }
    }
}
