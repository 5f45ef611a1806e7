// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Arithmetic opcode handlers: Add, Sub, Mul, Div, Negate, Gt, Lt.
//!
//! Operands are type-checked by peeking before anything is popped, so a
//! failing instruction leaves the stack as it found it.

use crate::opcode::OpCode;
use crate::value::Value;
use crate::vm::{Result, RuntimeError, VM};

impl VM {
    /// Execute an arithmetic or ordering opcode.
    pub(crate) fn execute_arithmetic(&mut self, op: OpCode) -> Result<()> {
        match op {
            OpCode::Add => self.binary_num_op(|a, b| a + b),
            OpCode::Sub => self.binary_num_op(|a, b| a - b),
            OpCode::Mul => self.binary_num_op(|a, b| a * b),
            OpCode::Div => self.binary_num_op(|a, b| a / b),
            OpCode::Gt => self.comparison_op(|a, b| a > b),
            OpCode::Lt => self.comparison_op(|a, b| a < b),
            OpCode::Negate => self.execute_negate(),
            _ => Err(RuntimeError::Internal(format!(
                "execute_arithmetic: unexpected opcode {:?}",
                op
            ))),
        }
    }

    fn execute_negate(&mut self) -> Result<()> {
        let Some(n) = self.stack.peek(0)?.as_number() else {
            return Err(RuntimeError::OperandMustBeNumber);
        };
        self.stack.pop()?;
        self.stack.push(Value::Number(-n));
        Ok(())
    }

    /// Peek both operands; returns `(a, b)` for `a op b` if both are numbers.
    fn numeric_operands(&self) -> Result<(f64, f64)> {
        match (self.stack.peek(1)?, self.stack.peek(0)?) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            _ => Err(RuntimeError::OperandsMustBeNumbers),
        }
    }

    /// Perform a binary numeric operation.
    pub(crate) fn binary_num_op<F>(&mut self, op: F) -> Result<()>
    where
        F: Fn(f64, f64) -> f64,
    {
        let (a, b) = self.numeric_operands()?;
        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(Value::Number(op(a, b)));
        Ok(())
    }

    /// Perform a comparison operation.
    pub(crate) fn comparison_op<F>(&mut self, op: F) -> Result<()>
    where
        F: Fn(f64, f64) -> bool,
    {
        let (a, b) = self.numeric_operands()?;
        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(Value::Bool(op(a, b)));
        Ok(())
    }
}
