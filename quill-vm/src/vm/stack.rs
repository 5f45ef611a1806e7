// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Value stack for the VM.

use std::fmt;

use crate::buffer::GrowableBuffer;
use crate::value::Value;

use super::{Result, RuntimeError};

/// Slots reserved when a stack is created.
pub const STACK_INITIAL_CAPACITY: usize = 256;

/// The VM's operand stack.
#[derive(Debug, Default)]
pub struct ValueStack {
    values: GrowableBuffer<Value>,
}

impl ValueStack {
    /// Create a new empty stack.
    pub fn new() -> Self {
        let mut values = GrowableBuffer::new();
        values.reserve(STACK_INITIAL_CAPACITY);
        Self { values }
    }

    /// Push a value onto the stack.
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Pop a value from the stack.
    #[inline]
    pub fn pop(&mut self) -> Result<Value> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Peek at a value on the stack without removing it.
    /// `distance` is the offset from the top (0 = top).
    #[inline]
    pub fn peek(&self, distance: usize) -> Result<&Value> {
        if distance >= self.values.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(&self.values[self.values.len() - 1 - distance])
    }

    /// Get the current stack size.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the stack is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Allocated slots.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Drop every value, keeping the allocation.
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

impl fmt::Display for ValueStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self.values.iter() {
            write!(f, "[ {} ]", value)?;
        }
        Ok(())
    }
}
