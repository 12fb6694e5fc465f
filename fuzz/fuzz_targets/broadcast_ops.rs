#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tensorgrad::autograd::{grads, Engine};
use tensorgrad::ops;

/// Binary ops under arbitrary (possibly incompatible) shapes must either
/// produce a correctly shaped gradient or return an error, and must not
/// leak tensors either way.
#[derive(Arbitrary, Debug)]
struct BroadcastFuzzInput {
    shape_a: Vec<u8>,
    shape_b: Vec<u8>,
    op_type: u8,
}

fn dims(raw: &[u8]) -> Vec<usize> {
    raw.iter().take(3).map(|&d| (d % 4) as usize).collect()
}

fuzz_target!(|input: BroadcastFuzzInput| {
    let shape_a = dims(&input.shape_a);
    let shape_b = dims(&input.shape_b);
    let mut engine = Engine::new();
    let a = ops::ones(&mut engine, &shape_a, tensorgrad::DType::Float32).unwrap();
    let b = ops::ones(&mut engine, &shape_b, tensorgrad::DType::Float32).unwrap();
    let before = engine.memory();

    let op_type = input.op_type % 4;
    let g = grads(move |e, xs| {
        let y = match op_type {
            0 => ops::add(e, &xs[0], &xs[1])?,
            1 => ops::sub(e, &xs[0], &xs[1])?,
            2 => ops::mul(e, &xs[0], &xs[1])?,
            _ => ops::div(e, &xs[0], &xs[1])?,
        };
        ops::sum(e, &y, &[], false)
    });

    match g(&mut engine, &[a.clone(), b.clone()], None) {
        Ok(result) => {
            assert_eq!(result[0].shape(), a.shape());
            assert_eq!(result[1].shape(), b.shape());
            engine.dispose_all(&result);
        }
        Err(_) => {}
    }
    assert_eq!(engine.memory(), before);
});
