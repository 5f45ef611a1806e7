// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Append-only growable buffer with an explicit doubling policy.

use std::ops::Deref;

/// Smallest capacity allocated on first growth.
pub const MIN_CAPACITY: usize = 8;

/// Capacity to grow to when `required` slots are needed and `current` are allocated.
///
/// Doubles the current capacity (starting from [`MIN_CAPACITY`]), or jumps
/// straight to `required` when doubling is not enough.
pub fn grow_capacity(current: usize, required: usize) -> usize {
    required.max(MIN_CAPACITY.max(current.saturating_mul(2)))
}

/// A growable array used for bytecode, constants, line runs and the value stack.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowableBuffer<T> {
    items: Vec<T>,
}

impl<T> GrowableBuffer<T> {
    /// Create an empty buffer. Nothing is allocated until the first push.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a buffer with room for at least `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Ensure room for `additional` more items.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.items.len() + additional;
        if required > self.items.capacity() {
            let target = grow_capacity(self.items.capacity(), required);
            self.items.reserve_exact(target - self.items.len());
        }
    }

    /// Append one item.
    #[inline]
    pub fn push(&mut self, item: T) {
        self.reserve(1);
        self.items.push(item);
    }

    /// Remove and return the last item.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Drop all items, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Clone> GrowableBuffer<T> {
    /// Append every item in `items`, growing at most once.
    pub fn extend_from_slice(&mut self, items: &[T]) {
        self.reserve(items.len());
        self.items.extend_from_slice(items);
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for GrowableBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_capacity_policy() {
        assert_eq!(grow_capacity(0, 1), MIN_CAPACITY);
        assert_eq!(grow_capacity(8, 9), 16);
        assert_eq!(grow_capacity(16, 17), 32);
        assert_eq!(grow_capacity(8, 100), 100);
    }

    #[test]
    fn test_push_sets_values() {
        let n = 1024;
        let mut buf = GrowableBuffer::new();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 0);

        for i in 0..n {
            buf.push(i);
        }
        assert_eq!(buf.len(), n);
        assert!(buf.capacity() >= n);
        assert_eq!(buf.last(), Some(&(n - 1)));
        assert!(buf.iter().enumerate().all(|(i, v)| i == *v));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buf = GrowableBuffer::with_capacity(4);
        buf.extend_from_slice(&[1u8, 2, 3, 4, 5]);
        let cap = buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), cap);
    }

    #[test]
    fn test_reserve() {
        let mut buf: GrowableBuffer<u32> = GrowableBuffer::new();
        buf.reserve(256);
        assert!(buf.capacity() >= 256);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_pop() {
        let mut buf = GrowableBuffer::new();
        buf.push('a');
        assert_eq!(buf.pop(), Some('a'));
        assert_eq!(buf.pop(), None);
    }
}
