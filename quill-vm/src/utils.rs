// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared utility functions for operand encoding.

/// Largest value a 3-byte operand can hold.
pub const U24_MAX: usize = (1 << 24) - 1;

/// Encode the low 24 bits of `value` as little-endian bytes.
#[inline]
pub fn encode_u24(value: usize) -> [u8; 3] {
    debug_assert!(value <= U24_MAX, "operand {} does not fit in 24 bits", value);
    [
        (value & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        ((value >> 16) & 0xFF) as u8,
    ]
}

/// Decode a little-endian 3-byte operand.
#[inline]
pub fn decode_u24(bytes: [u8; 3]) -> usize {
    bytes[0] as usize | (bytes[1] as usize) << 8 | (bytes[2] as usize) << 16
}
