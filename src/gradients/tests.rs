//! Tests for the built-in gradient configs

use crate::autograd::{grad, grads, Engine};
use crate::ops;
use crate::tensor::{DType, Tensor};
use crate::test_util::{expect_arrays_close, DEFAULT_TEST_EPSILON};
use approx::assert_abs_diff_eq;
use proptest::prelude::*;

fn values(engine: &Engine, t: &Tensor) -> Vec<f32> {
    engine.read_sync(t).unwrap().to_f32_vec().unwrap()
}

fn assert_close(engine: &Engine, t: &Tensor, expected: &[f32]) {
    let actual = engine.read_sync(t).unwrap();
    if let Err(e) = expect_arrays_close(&actual, expected, DEFAULT_TEST_EPSILON) {
        panic!("{e}");
    }
}

/// Gradient of `sum(op(x))` at `x`.
fn unary_grad(op: fn(&mut Engine, &Tensor) -> crate::Result<Tensor>, x: &[f32]) -> Vec<f32> {
    let mut engine = Engine::new();
    let x = ops::tensor_f32(&mut engine, x, &[x.len()]).unwrap();
    let df = grad(move |e, x| {
        let y = op(e, x)?;
        ops::sum(e, &y, &[], false)
    });
    let dx = df(&mut engine, &x, None).unwrap();
    values(&engine, &dx)
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_unary_gradients() {
        assert_eq!(unary_grad(ops::neg, &[1.0, 2.0]), vec![-1.0, -1.0]);
        assert_eq!(unary_grad(ops::floor, &[1.5]), vec![0.0]);
        assert_eq!(unary_grad(ops::identity, &[1.5]), vec![1.0]);
        assert_abs_diff_eq!(unary_grad(ops::sqrt, &[4.0])[0], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(unary_grad(ops::rsqrt, &[4.0])[0], -0.0625, epsilon = 1e-6);
        assert_abs_diff_eq!(unary_grad(ops::exp, &[0.0])[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(unary_grad(ops::log, &[2.0])[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(unary_grad(ops::atan, &[1.0])[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(unary_grad(ops::square, &[-3.0])[0], -6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zeros_like_gradient_is_zero() {
        assert_eq!(unary_grad(ops::zeros_like, &[1.0, 2.0]), vec![0.0, 0.0]);
        assert_eq!(unary_grad(ops::ones_like, &[1.0]), vec![0.0]);
    }

    #[test]
    fn test_div_gradients() {
        let mut engine = Engine::new();
        let a = ops::tensor_f32(&mut engine, &[6.0], &[1]).unwrap();
        let b = ops::tensor_f32(&mut engine, &[2.0], &[1]).unwrap();
        let g = grads(|e, xs| ops::div(e, &xs[0], &xs[1]));
        let result = g(&mut engine, &[a, b], None).unwrap();
        assert_close(&engine, &result[0], &[0.5]);
        assert_close(&engine, &result[1], &[-1.5]);
    }

    #[test]
    fn test_int_operands_are_cast_for_gradients() {
        let mut engine = Engine::new();
        let x = ops::tensor_i32(&mut engine, &[2, 3], &[2]).unwrap();
        let df = grad(|e, x| {
            let xx = ops::mul(e, x, x)?;
            let as_float = ops::cast(e, &xx, DType::Float32)?;
            ops::sum(e, &as_float, &[], false)
        });
        let dx = df(&mut engine, &x, None).unwrap();
        assert_eq!(dx.dtype(), DType::Float32);
        assert_eq!(values(&engine, &dx), vec![4.0, 6.0]);
    }

    #[test]
    fn test_sum_axis_gradient() {
        let mut engine = Engine::new();
        let x = ops::ones(&mut engine, &[2, 3], DType::Float32).unwrap();
        let dy = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[2]).unwrap();
        let df = grad(|e, x| ops::sum(e, x, &[1], false));
        let dx = df(&mut engine, &x, Some(&dy)).unwrap();
        assert_eq!(dx.shape(), &[2, 3]);
        assert_eq!(values(&engine, &dx), vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_reshape_gradient() {
        let mut engine = Engine::new();
        let x = ops::ones(&mut engine, &[2, 2], DType::Float32).unwrap();
        let dy = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0, 4.0], &[4]).unwrap();
        let df = grad(|e, x| ops::reshape(e, x, &[4]));
        let dx = df(&mut engine, &x, Some(&dy)).unwrap();
        assert_eq!(dx.shape(), &[2, 2]);
        assert_eq!(values(&engine, &dx), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_tile_gradient() {
        let mut engine = Engine::new();
        let x = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let dy_values: Vec<f32> = (1..=16).map(|v| v as f32).collect();
        let dy = ops::tensor_f32(&mut engine, &dy_values, &[4, 4]).unwrap();
        let df = grad(|e, x| ops::tile(e, x, &[2, 2]));
        let dx = df(&mut engine, &x, Some(&dy)).unwrap();
        assert_eq!(values(&engine, &dx), vec![24.0, 28.0, 40.0, 44.0]);
    }

    #[test]
    fn test_tile_gradient_uneven_reps() {
        let mut engine = Engine::new();
        let x = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let dy_values: Vec<f32> = (1..=24).map(|v| v as f32).collect();
        let dy = ops::tensor_f32(&mut engine, &dy_values, &[4, 6]).unwrap();
        let df = grad(|e, x| ops::tile(e, x, &[2, 3]));
        let dx = df(&mut engine, &x, Some(&dy)).unwrap();
        assert_eq!(dx.shape(), &[2, 2]);
        // six blocks of dy summed back onto x
        assert_eq!(values(&engine, &dx), vec![54.0, 60.0, 90.0, 96.0]);
    }

    #[test]
    fn test_slice_gradient_pads_with_zeros() {
        let mut engine = Engine::new();
        let x = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0, 4.0], &[4]).unwrap();
        let dy = ops::tensor_f32(&mut engine, &[5.0, 6.0], &[2]).unwrap();
        let df = grad(|e, x| ops::slice(e, x, &[1], &[2]));
        let dx = df(&mut engine, &x, Some(&dy)).unwrap();
        assert_eq!(values(&engine, &dx), vec![0.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn test_pad_gradient_slices() {
        let mut engine = Engine::new();
        let x = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[1, 2]).unwrap();
        let dy_values: Vec<f32> = (1..=12).map(|v| v as f32).collect();
        let dy = ops::tensor_f32(&mut engine, &dy_values, &[3, 4]).unwrap();
        let df = grad(|e, x| ops::pad(e, x, &[(1, 1), (1, 1)], 7.0));
        let dx = df(&mut engine, &x, Some(&dy)).unwrap();
        assert_eq!(dx.shape(), &[1, 2]);
        assert_eq!(values(&engine, &dx), vec![6.0, 7.0]);
    }

    #[test]
    fn test_concat_gradient_splits() {
        let mut engine = Engine::new();
        let a = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[2]).unwrap();
        let b = ops::tensor_f32(&mut engine, &[3.0, 4.0, 5.0], &[3]).unwrap();
        let dy = ops::tensor_f32(&mut engine, &[10.0, 20.0, 30.0, 40.0, 50.0], &[5]).unwrap();
        let g = grads(|e, xs| ops::concat(e, xs, 0));
        let result = g(&mut engine, &[a, b], Some(&dy)).unwrap();
        assert_eq!(values(&engine, &result[0]), vec![10.0, 20.0]);
        assert_eq!(values(&engine, &result[1]), vec![30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_concat_gradient_for_one_connected_input() {
        let mut engine = Engine::new();
        let a = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[1, 2]).unwrap();
        let b = ops::tensor_f32(&mut engine, &[3.0, 4.0], &[1, 2]).unwrap();
        let df = grad(move |e, x| {
            let joined = ops::concat(e, &[b.clone(), x.clone()], 1)?;
            let sq = ops::square(e, &joined)?;
            ops::sum(e, &sq, &[], false)
        });
        let dx = df(&mut engine, &a, None).unwrap();
        assert_eq!(values(&engine, &dx), vec![2.0, 4.0]);
    }

    #[test]
    fn test_batch_norm_gradients() {
        let mut engine = Engine::new();
        let x = ops::tensor_f32(&mut engine, &[1.0, 4.0, 3.0, 6.0], &[1, 1, 2, 2]).unwrap();
        let mean = ops::tensor_f32(&mut engine, &[1.0, 2.0], &[2]).unwrap();
        let variance = ops::tensor_f32(&mut engine, &[4.0, 1.0], &[2]).unwrap();
        let scale = ops::tensor_f32(&mut engine, &[1.0, 1.0], &[2]).unwrap();
        let offset = ops::tensor_f32(&mut engine, &[0.0, 0.0], &[2]).unwrap();

        let g = grads(|e, xs| {
            let y = ops::batch_norm4d(e, &xs[0], &xs[1], &xs[2], Some(&xs[4]), Some(&xs[3]), 0.0)?;
            ops::sum(e, &y, &[], false)
        });
        let result = g(&mut engine, &[x, mean, variance, scale, offset], None).unwrap();

        assert_close(&engine, &result[0], &[0.5, 1.0, 0.5, 1.0]);
        assert_close(&engine, &result[1], &[-1.0, -2.0]);
        assert_close(&engine, &result[2], &[-0.125, -3.0]);
        assert_close(&engine, &result[3], &[1.0, 6.0]);
        assert_close(&engine, &result[4], &[2.0, 2.0]);
        assert_eq!(result[1].shape(), &[2]);
    }

    #[test]
    fn test_batch_norm_without_scale() {
        let mut engine = Engine::new();
        let x = ops::tensor_f32(&mut engine, &[1.0, 3.0], &[2]).unwrap();
        let mean = ops::tensor_f32(&mut engine, &[2.0], &[1]).unwrap();
        let variance = ops::tensor_f32(&mut engine, &[1.0], &[1]).unwrap();
        let df = grad(move |e, x| {
            let y = ops::batch_norm(e, x, &mean, &variance, None, None, 0.0)?;
            ops::sum(e, &y, &[], false)
        });
        let dx = df(&mut engine, &x, None).unwrap();
        assert_eq!(dx.shape(), &[2]);
        assert_close(&engine, &dx, &[1.0, 1.0]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_tile_gradient_counts_copies(
        values in prop::collection::vec(-3.0f32..3.0, 1..4),
        reps in 1usize..4
    ) {
        let mut engine = Engine::new();
        let n = values.len();
        let x = ops::tensor_f32(&mut engine, &values, &[n]).unwrap();
        let df = grad(move |e, x| {
            let tiled = ops::tile(e, x, &[reps])?;
            ops::sum(e, &tiled, &[], false)
        });
        let dx = df(&mut engine, &x, None).unwrap();
        let got = engine.read_sync(&dx).unwrap().to_f32_vec().unwrap();
        prop_assert!(got.iter().all(|&g| g == reps as f32));
    }
}
