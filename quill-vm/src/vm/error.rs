// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime errors for the VM.

use crate::compiler::CompileError;

/// Runtime error during VM execution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// Unary operator applied to a non-number.
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    /// Binary arithmetic or comparison applied to a non-number.
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    /// Stack underflow.
    #[error("Stack underflow.")]
    StackUnderflow,
    /// Byte that does not decode to an opcode.
    #[error("Unknown opcode {0}.")]
    UnknownOpcode(u8),
    /// Operand bytes missing at the end of the chunk.
    #[error("Unexpected end of bytecode.")]
    UnexpectedEnd,
    /// Constant operand outside the pool.
    #[error("Constant index {0} out of bounds.")]
    ConstantOutOfBounds(usize),
    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for VM operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failure of an `interpret` call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpretError {
    /// The source did not compile; nothing was executed.
    #[error("{0}")]
    Compile(#[from] CompileError),
    /// Execution aborted at `line`.
    #[error("{error}\n[line {line}] in script")]
    Runtime { error: RuntimeError, line: u32 },
}

impl InterpretError {
    pub fn is_compile(&self) -> bool {
        matches!(self, InterpretError::Compile(_))
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, InterpretError::Runtime { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_format() {
        let err = InterpretError::Runtime {
            error: RuntimeError::OperandMustBeNumber,
            line: 7,
        };
        assert_eq!(err.to_string(), "Operand must be a number.\n[line 7] in script");
        assert!(err.is_runtime());
    }
}
