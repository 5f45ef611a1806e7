// quill-vm - Constant pool tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Constants loaded through both `Const` and `ConstLong` come back intact,
//! and the encoding switches at the one-byte boundary.

use quill_vm::chunk::MAX_SHORT_CONSTANT;
use quill_vm::{Chunk, OpCode, VM, Value, compile};

fn value_for(i: usize) -> Value {
    match i % 3 {
        0 => Value::Number(i as f64 * 0.5),
        1 => Value::Bool(i % 2 == 0),
        _ => Value::Nil,
    }
}

/// Fill the pool with `count - 1` values, then load value `count - 1` via
/// `write_constant` and return it.
fn load_last(count: usize) -> (Chunk, Value) {
    let mut chunk = Chunk::new();
    for i in 0..count - 1 {
        chunk.add_constant(value_for(i));
    }
    let expected = value_for(count - 1);
    let index = chunk.write_constant(expected, 1).unwrap();
    assert_eq!(index, count - 1);
    chunk.write_op(OpCode::Return, 1);
    (chunk, expected)
}

#[test]
fn round_trip_around_encoding_boundary() {
    let mut vm = VM::new();
    for count in [1, 2, 3, 255, 256, 257, 258, 1000, 70_000] {
        let (chunk, expected) = load_last(count);
        let index = count - 1;

        let expected_op = if index <= MAX_SHORT_CONSTANT {
            OpCode::Const
        } else {
            OpCode::ConstLong
        };
        assert_eq!(chunk.code()[0], expected_op as u8, "index {}", index);
        assert_eq!(chunk.len(), expected_op.size() + 1, "index {}", index);

        assert_eq!(vm.run(&chunk), Ok(expected), "index {}", index);
    }
}

#[test]
fn every_index_in_mixed_chunk_round_trips() {
    let mut vm = VM::new();
    let mut chunk = Chunk::new();
    let values: Vec<Value> = (0..600).map(value_for).collect();
    for value in &values {
        chunk.add_constant(*value);
    }

    for (index, expected) in values.iter().enumerate() {
        // Hand-encode the load so each index is exercised in both forms
        // where it fits.
        let mut long = Chunk::new();
        for value in &values {
            long.add_constant(*value);
        }
        let [b0, b1, b2] = quill_vm::utils::encode_u24(index);
        long.write(&[OpCode::ConstLong as u8, b0, b1, b2, OpCode::Return as u8], 1);
        assert_eq!(vm.run(&long), Ok(*expected), "long form, index {}", index);

        if index <= MAX_SHORT_CONSTANT {
            let mut short = chunk.clone();
            short.write(&[OpCode::Const as u8, index as u8, OpCode::Return as u8], 1);
            assert_eq!(vm.run(&short), Ok(*expected), "short form, index {}", index);
        }
    }
}

#[test]
fn compiled_program_with_many_constants() {
    // 300 literals: the first 256 load with Const, the rest with ConstLong.
    let source = vec!["1"; 300].join(" + ");
    let chunk = compile(&source).unwrap();
    assert_eq!(chunk.constants().len(), 300);
    // 256 two-byte loads, 44 four-byte loads, 299 adds, one return.
    assert_eq!(chunk.len(), 256 * 2 + 44 * 4 + 299 + 1);

    let mut vm = VM::new();
    assert_eq!(vm.run(&chunk), Ok(Value::Number(300.0)));
}
