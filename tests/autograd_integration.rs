//! Integration tests for autograd core functionality.
//!
//! Exercises the public engine API end to end: op dispatch, gradient
//! computation through broadcasting ops, and the functional gradient
//! helpers.

use tensorgrad::autograd::{grad, grads, value_and_grads, Engine};
use tensorgrad::config::EngineConfig;
use tensorgrad::test_util::expect_tensor_close;
use tensorgrad::{ops, DType, Error, Tensor};

fn read(engine: &Engine, t: &Tensor) -> Vec<f32> {
    engine.read_sync(t).unwrap().to_f32_vec().unwrap()
}

#[test]
fn test_tensor_creation_from_vec() {
    let mut engine = Engine::new();
    let t = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0], &[3]).unwrap();
    assert_eq!(t.size(), 3);
    assert_eq!(t.rank(), 1);
    assert_eq!(t.dtype(), DType::Float32);
    assert_eq!(read(&engine, &t), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_scalar_tensor() {
    let mut engine = Engine::new();
    let s = ops::scalar(&mut engine, 2.5).unwrap();
    assert!(s.is_scalar());
    assert!(s.shape().is_empty());
    assert_eq!(s.size(), 1);
}

#[test]
fn test_mean_squared_error_gradient() {
    // loss = sum((pred - target)^2) / n
    let mut engine = Engine::new();
    let pred = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0, 4.0], &[4]).unwrap();
    let target = ops::tensor_f32(&mut engine, &[1.5, 2.0, 2.0, 5.0], &[4]).unwrap();

    let df = grad(move |e, pred| {
        let diff = ops::sub(e, pred, &target)?;
        let sq = ops::square(e, &diff)?;
        let total = ops::sum(e, &sq, &[], false)?;
        let n = ops::scalar(e, 4.0)?;
        ops::div(e, &total, &n)
    });
    let dpred = df(&mut engine, &pred, None).unwrap();

    // 2 * (pred - target) / n
    expect_tensor_close(&engine, &dpred, &[-0.25f32, 0.0, 0.5, -0.5][..]).unwrap();
}

#[test]
fn test_linear_layer_gradients() {
    // y = sum(x * w + b) with x [2, 3], w [3], b [1]
    let mut engine = Engine::new();
    let x = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    let w = ops::tensor_f32(&mut engine, &[0.5, -1.0, 2.0], &[3]).unwrap();
    let b = ops::tensor_f32(&mut engine, &[0.1], &[1]).unwrap();

    let g = value_and_grads(move |e, params| {
        let xw = ops::mul(e, &x, &params[0])?;
        let out = ops::add(e, &xw, &params[1])?;
        ops::sum(e, &out, &[], false)
    });
    let result = g(&mut engine, &[w.clone(), b.clone()], None).unwrap();

    // 1*0.5 - 2 + 6 + 4*0.5 - 5 + 12 + 6*0.1
    expect_tensor_close(&engine, &result.value, &[14.1f32][..]).unwrap();
    assert_eq!(read(&engine, &result.grads[0]), vec![5.0, 7.0, 9.0]);
    assert_eq!(result.grads[1].shape(), &[1]);
    assert_eq!(read(&engine, &result.grads[1]), vec![6.0]);
}

#[test]
fn test_chain_of_unary_ops() {
    // d/dx exp(log(x)) = 1
    let mut engine = Engine::new();
    let x = ops::tensor_f32(&mut engine, &[0.5, 1.0, 2.0], &[3]).unwrap();
    let df = grad(|e, x| {
        let l = ops::log(e, x)?;
        let y = ops::exp(e, &l)?;
        ops::sum(e, &y, &[], false)
    });
    let dx = df(&mut engine, &x, None).unwrap();
    expect_tensor_close(&engine, &dx, &[1.0f32, 1.0, 1.0][..]).unwrap();
}

#[test]
fn test_repeated_gradient_calls_are_independent() {
    let mut engine = Engine::new();
    let x = ops::tensor_f32(&mut engine, &[3.0], &[1]).unwrap();
    let df = grad(|e, x| ops::square(e, x));

    let first = df(&mut engine, &x, None).unwrap();
    let second = df(&mut engine, &x, None).unwrap();
    assert_eq!(read(&engine, &first), vec![6.0]);
    assert_eq!(read(&engine, &second), vec![6.0]);
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_gradient_through_reshape_and_tile() {
    let mut engine = Engine::new();
    let x = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[2]).unwrap();
    let df = grad(|e, x| {
        let col = ops::reshape(e, x, &[2, 1])?;
        let tiled = ops::tile(e, &col, &[1, 3])?;
        let sq = ops::square(e, &tiled)?;
        ops::sum(e, &sq, &[], false)
    });
    let dx = df(&mut engine, &x, None).unwrap();
    // three copies of 2x each
    assert_eq!(read(&engine, &dx), vec![6.0, 12.0]);
}

#[test]
fn test_grads_with_partial_dependence() {
    let mut engine = Engine::new();
    let a = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[2]).unwrap();
    let b = ops::tensor_f32(&mut engine, &[3.0, 4.0], &[2]).unwrap();
    let g = grads(|e, xs| {
        let y = ops::neg(e, &xs[0])?;
        ops::sum(e, &y, &[], false)
    });
    let result = g(&mut engine, &[a, b], None).unwrap();
    assert_eq!(read(&engine, &result[0]), vec![-1.0, -1.0]);
    assert_eq!(read(&engine, &result[1]), vec![0.0, 0.0]);
}

#[test]
fn test_errors_surface_through_grad() {
    let mut engine = Engine::new();
    let x = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[2]).unwrap();
    let bad = grad(|e, x| {
        let other = ops::ones(e, &[3], DType::Float32)?;
        ops::add(e, x, &other)
    });
    assert!(matches!(
        bad(&mut engine, &x, None),
        Err(Error::IncompatibleBroadcast { .. })
    ));
    assert_eq!(engine.memory().num_tensors, 1);
}

#[test]
fn test_config_tolerance_drives_comparisons() {
    let config = EngineConfig {
        test_epsilon: 0.1,
        ..Default::default()
    };
    let mut engine = Engine::with_config(config).unwrap();
    let x = ops::tensor_f32(&mut engine, &[1.05], &[1]).unwrap();
    assert!(expect_tensor_close(&engine, &x, &[1.0f32][..]).is_ok());

    let mut strict = Engine::new();
    let x = ops::tensor_f32(&mut strict, &[1.05], &[1]).unwrap();
    assert!(expect_tensor_close(&strict, &x, &[1.0f32][..]).is_err());
}
