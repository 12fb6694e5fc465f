#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tensorgrad::{DType, TensorBuffer, Value};

#[derive(Arbitrary, Debug)]
struct BufferFuzzInput {
    shape: Vec<u8>,  // dims, each reduced to 0..8
    loc: Vec<u8>,    // coordinates, possibly out of range
    value: f32,
    dtype: u8,       // dtype selector
}

fuzz_target!(|input: BufferFuzzInput| {
    let shape: Vec<usize> = input.shape.iter().take(4).map(|&d| (d % 8) as usize).collect();
    let loc: Vec<usize> = input.loc.iter().take(5).map(|&c| c as usize).collect();
    let dtype = match input.dtype % 3 {
        0 => DType::Float32,
        1 => DType::Int32,
        _ => DType::Bool,
    };

    let mut buf = TensorBuffer::new(&shape, dtype);
    let in_range = loc.len() == shape.len() && loc.iter().zip(&shape).all(|(l, d)| l < d);

    let written = buf.set(Value::Float(input.value), &loc);
    assert_eq!(written.is_ok(), in_range);

    if in_range {
        let index = buf.loc_to_index(&loc).unwrap();
        assert_eq!(buf.index_to_loc(index).unwrap(), loc);
        assert!(buf.get(&loc).is_ok());
    }
    if buf.size() == 0 {
        assert!(buf.index_to_loc(0).is_err());
    }
});
