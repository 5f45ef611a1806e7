// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Stack-based virtual machine for executing Quill bytecode.

pub mod error;
pub mod handlers;
pub mod stack;

use log::{debug, log_enabled, trace};

use crate::chunk::Chunk;
use crate::compiler::compile;
use crate::debug::disassemble_instruction;
use crate::opcode::OpCode;
use crate::utils::decode_u24;
use crate::value::Value;

pub use error::{InterpretError, Result, RuntimeError};
pub use stack::ValueStack;

/// The Quill virtual machine.
///
/// A VM executes one chunk at a time and can be reused: after a runtime
/// error the stack is cleared and the next `interpret` starts clean.
pub struct VM {
    /// Value stack.
    stack: ValueStack,

    /// Offset of the next byte to read in the active chunk.
    ip: usize,

    /// Offset of the opcode currently executing.
    op_start: usize,
}

impl VM {
    /// Create a new VM.
    pub fn new() -> Self {
        Self {
            stack: ValueStack::new(),
            ip: 0,
            op_start: 0,
        }
    }

    /// Compile and execute `source`, returning the value of the expression.
    pub fn interpret(&mut self, source: &str) -> std::result::Result<Value, InterpretError> {
        let chunk = compile(source)?;
        self.run(&chunk)
    }

    /// Execute a chunk of bytecode.
    ///
    /// On a runtime error the stack is reset and the error carries the
    /// source line of the failing instruction.
    pub fn run(&mut self, chunk: &Chunk) -> std::result::Result<Value, InterpretError> {
        debug!(
            "running chunk: {} bytes, {} constants",
            chunk.len(),
            chunk.constants().len()
        );
        self.ip = 0;
        self.op_start = 0;
        self.stack.reset();

        match self.run_loop(chunk) {
            Ok(value) => {
                debug!("run finished: {}", value);
                Ok(value)
            }
            Err(error) => {
                // Running off the end leaves `op_start` past the code.
                let line = chunk
                    .get_line(self.op_start)
                    .or_else(|| chunk.line_runs().last().map(|run| run.line))
                    .unwrap_or(0);
                debug!("runtime error at line {}: {}", line, error);
                self.stack.reset();
                Err(InterpretError::Runtime { error, line })
            }
        }
    }

    /// The operand stack (empty between runs).
    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    fn run_loop(&mut self, chunk: &Chunk) -> Result<Value> {
        loop {
            if log_enabled!(log::Level::Trace) {
                self.trace_instruction(chunk);
            }

            self.op_start = self.ip;
            let op = self.read_op(chunk)?;
            let depth = self.stack.len();

            match op {
                // Constants & literals - handled inline
                OpCode::Const => {
                    let idx = self.read_byte(chunk)? as usize;
                    let val = self.get_constant(chunk, idx)?;
                    self.stack.push(val);
                }
                OpCode::ConstLong => {
                    let bytes = [
                        self.read_byte(chunk)?,
                        self.read_byte(chunk)?,
                        self.read_byte(chunk)?,
                    ];
                    let val = self.get_constant(chunk, decode_u24(bytes))?;
                    self.stack.push(val);
                }
                OpCode::Nil => self.stack.push(Value::Nil),
                OpCode::True => self.stack.push(Value::Bool(true)),
                OpCode::False => self.stack.push(Value::Bool(false)),

                // Equality is defined across all types
                OpCode::Eq => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    self.stack.push(Value::Bool(a == b));
                }
                OpCode::Not => {
                    let val = self.stack.pop()?;
                    self.stack.push(Value::Bool(val.is_falsey()));
                }

                // Arithmetic - delegated to handler
                OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Gt
                | OpCode::Lt
                | OpCode::Negate => {
                    self.execute_arithmetic(op)?;
                }

                OpCode::Return => {
                    let result = self.stack.pop()?;
                    // Hand-built chunks may leave extra values behind.
                    self.stack.reset();
                    return Ok(result);
                }
            }

            debug_assert_eq!(
                self.stack.len() as isize,
                depth as isize + op.stack_effect() as isize,
                "stack effect of {:?}",
                op
            );
        }
    }

    fn read_byte(&mut self, chunk: &Chunk) -> Result<u8> {
        let byte = chunk
            .code()
            .get(self.ip)
            .copied()
            .ok_or(RuntimeError::UnexpectedEnd)?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_op(&mut self, chunk: &Chunk) -> Result<OpCode> {
        let byte = self.read_byte(chunk)?;
        OpCode::try_from(byte).map_err(RuntimeError::UnknownOpcode)
    }

    fn get_constant(&self, chunk: &Chunk, idx: usize) -> Result<Value> {
        chunk
            .constant(idx)
            .copied()
            .ok_or(RuntimeError::ConstantOutOfBounds(idx))
    }

    fn trace_instruction(&self, chunk: &Chunk) {
        if !self.stack.is_empty() {
            trace!("          {}", self.stack);
        }
        if self.ip < chunk.len() {
            let (line, _) = disassemble_instruction(chunk, self.ip);
            trace!("{}", line);
        }
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_of(bytes: &[u8]) -> Chunk {
        let mut chunk = Chunk::new();
        chunk.write(bytes, 1);
        chunk
    }

    #[test]
    fn test_run_hand_built_chunk() {
        // -((1.2 + 3.4) / 5.6)
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(1.2), 123);
        chunk.write_constant(Value::Number(3.4), 123);
        chunk.write_op(OpCode::Add, 123);
        chunk.write_constant(Value::Number(5.6), 123);
        chunk.write_op(OpCode::Div, 123);
        chunk.write_op(OpCode::Negate, 123);
        chunk.write_op(OpCode::Return, 123);

        let mut vm = VM::new();
        let result = vm.run(&chunk).unwrap();
        assert_eq!(result, Value::Number(-((1.2 + 3.4) / 5.6)));
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_unknown_opcode() {
        let mut vm = VM::new();
        let err = vm.run(&chunk_of(&[0xEE])).unwrap_err();
        assert_eq!(
            err,
            InterpretError::Runtime {
                error: RuntimeError::UnknownOpcode(0xEE),
                line: 1
            }
        );
    }

    #[test]
    fn test_missing_return_runs_off_the_end() {
        let mut vm = VM::new();
        let err = vm.run(&chunk_of(&[OpCode::Nil as u8])).unwrap_err();
        assert!(matches!(
            err,
            InterpretError::Runtime {
                error: RuntimeError::UnexpectedEnd,
                ..
            }
        ));
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_run_off_end_reports_last_line() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::True, 3);
        chunk.write_op(OpCode::Nil, 4);
        let err = VM::new().run(&chunk).unwrap_err();
        assert_eq!(
            err,
            InterpretError::Runtime {
                error: RuntimeError::UnexpectedEnd,
                line: 4
            }
        );
    }

    #[test]
    fn test_leftover_values_do_not_leak_between_runs() {
        let mut vm = VM::new();
        let chunk = chunk_of(&[OpCode::Nil as u8, OpCode::True as u8, OpCode::Return as u8]);
        assert_eq!(vm.run(&chunk), Ok(Value::Bool(true)));
        assert!(vm.stack().is_empty());

        assert_eq!(vm.interpret("1"), Ok(Value::Number(1.0)));
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_every_opcode_matches_its_stack_effect() {
        // The run loop checks each instruction's stack effect in debug builds.
        for op in [
            OpCode::Eq,
            OpCode::Gt,
            OpCode::Lt,
            OpCode::Add,
            OpCode::Sub,
            OpCode::Mul,
            OpCode::Div,
            OpCode::Not,
            OpCode::Negate,
            OpCode::Nil,
            OpCode::True,
            OpCode::False,
        ] {
            let mut chunk = Chunk::new();
            chunk.write_constant(Value::Number(6.0), 1);
            chunk.write_constant(Value::Number(3.0), 1);
            chunk.write_op(op, 1);
            chunk.write_op(OpCode::Return, 1);
            assert!(VM::new().run(&chunk).is_ok(), "{:?}", op);
        }

        let mut chunk = Chunk::new();
        for i in 0..300 {
            chunk.write_constant(Value::Number(i as f64), 1);
        }
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(VM::new().run(&chunk), Ok(Value::Number(299.0)));
    }

    #[test]
    fn test_truncated_long_constant() {
        let mut chunk = Chunk::new();
        chunk.add_constant(Value::Nil);
        chunk.write(&[OpCode::ConstLong as u8, 0], 1);
        let err = VM::new().run(&chunk).unwrap_err();
        assert!(matches!(
            err,
            InterpretError::Runtime {
                error: RuntimeError::UnexpectedEnd,
                ..
            }
        ));
    }

    #[test]
    fn test_constant_out_of_bounds() {
        let err = VM::new()
            .run(&chunk_of(&[OpCode::Const as u8, 3, OpCode::Return as u8]))
            .unwrap_err();
        assert!(matches!(
            err,
            InterpretError::Runtime {
                error: RuntimeError::ConstantOutOfBounds(3),
                ..
            }
        ));
    }

    #[test]
    fn test_return_on_empty_stack() {
        let err = VM::new()
            .run(&chunk_of(&[OpCode::Return as u8]))
            .unwrap_err();
        assert!(matches!(
            err,
            InterpretError::Runtime {
                error: RuntimeError::StackUnderflow,
                ..
            }
        ));
    }

    #[test]
    fn test_runtime_error_reports_instruction_line() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::True, 1);
        chunk.write_op(OpCode::Negate, 2);
        chunk.write_op(OpCode::Return, 3);

        let err = VM::new().run(&chunk).unwrap_err();
        assert_eq!(
            err,
            InterpretError::Runtime {
                error: RuntimeError::OperandMustBeNumber,
                line: 2
            }
        );
    }
}
