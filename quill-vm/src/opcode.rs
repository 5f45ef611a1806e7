// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode instruction definitions.

/// Bytecode instructions for the Quill VM.
///
/// Each instruction is a one-byte opcode followed by zero or more operand
/// bytes. Multi-byte operands are little-endian. The discriminants are the
/// encoded byte values and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants & Literals
    // =========================================================================
    /// Push constant from constant pool onto stack. Operand: 1-byte index.
    Const = 0,

    /// Push constant from constant pool onto stack. Operand: 3-byte index.
    ConstLong = 1,

    /// Push nil.
    Nil = 2,

    /// Push true.
    True = 3,

    /// Push false.
    False = 4,

    // =========================================================================
    // Comparison
    // =========================================================================
    /// Equality: push a == b where b = pop(), a = pop().
    Eq = 5,

    /// Greater than: push a > b where b = pop(), a = pop().
    Gt = 6,

    /// Less than: push a < b where b = pop(), a = pop().
    Lt = 7,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    /// Addition: push a + b where b = pop(), a = pop().
    Add = 8,

    /// Subtraction: push a - b where b = pop(), a = pop().
    Sub = 9,

    /// Multiplication: push a * b where b = pop(), a = pop().
    Mul = 10,

    /// Division: push a / b where b = pop(), a = pop().
    Div = 11,

    /// Logical negation: push (not pop()).
    Not = 12,

    /// Arithmetic negation: push -pop().
    Negate = 13,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Pop the result and finish the run.
    Return = 14,
}

impl OpCode {
    /// Decode an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => OpCode::Const,
            1 => OpCode::ConstLong,
            2 => OpCode::Nil,
            3 => OpCode::True,
            4 => OpCode::False,
            5 => OpCode::Eq,
            6 => OpCode::Gt,
            7 => OpCode::Lt,
            8 => OpCode::Add,
            9 => OpCode::Sub,
            10 => OpCode::Mul,
            11 => OpCode::Div,
            12 => OpCode::Not,
            13 => OpCode::Negate,
            14 => OpCode::Return,
            _ => return None,
        })
    }

    /// Number of operand bytes following the opcode.
    #[inline]
    pub fn operand_len(self) -> usize {
        match self {
            OpCode::Const => 1,
            OpCode::ConstLong => 3,
            _ => 0,
        }
    }

    /// Total encoded size of the instruction in bytes.
    #[inline]
    pub fn size(self) -> usize {
        1 + self.operand_len()
    }

    /// Name used by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Const => "OP_CONSTANT",
            OpCode::ConstLong => "OP_CONSTANT_LONG",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Eq => "OP_EQUAL",
            OpCode::Gt => "OP_GREATER",
            OpCode::Lt => "OP_LESS",
            OpCode::Add => "OP_ADD",
            OpCode::Sub => "OP_SUBTRACT",
            OpCode::Mul => "OP_MULTIPLY",
            OpCode::Div => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Return => "OP_RETURN",
        }
    }

    /// Net change in stack depth after this instruction (positive = push, negative = pop).
    /// Checked by the VM in debug builds.
    #[inline]
    pub fn stack_effect(self) -> i8 {
        match self {
            // Push 1
            OpCode::Const | OpCode::ConstLong | OpCode::Nil | OpCode::True | OpCode::False => 1,

            // Neutral (pop 1, push 1)
            OpCode::Not | OpCode::Negate => 0,

            // Pop 2, push 1
            OpCode::Eq
            | OpCode::Gt
            | OpCode::Lt
            | OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div => -1,

            OpCode::Return => -1,
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::from_byte(byte).ok_or(byte)
    }
}
