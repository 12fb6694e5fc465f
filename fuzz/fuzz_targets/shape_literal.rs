#![no_main]

use libfuzzer_sys::fuzz_target;
use tensorgrad::shape::validate_shape_literal;
use tensorgrad::{DType, TensorBuffer};

/// Shape literals from untyped sources must either validate or fail
/// cleanly, never panic.
fuzz_target!(|raw: Vec<f64>| {
    let dims: Vec<f64> = raw.into_iter().take(4).collect();
    match validate_shape_literal(&dims) {
        Ok(shape) => {
            // Keep allocations bounded
            if shape.iter().all(|&d| d <= 16) {
                let buf = TensorBuffer::from_shape_literal(&dims, DType::Float32).unwrap();
                assert_eq!(buf.shape(), &shape[..]);
            }
        }
        Err(e) => assert!(e.to_string().starts_with("Tensor must have a shape")),
    }
});
