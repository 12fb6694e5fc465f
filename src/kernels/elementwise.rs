//! Elementwise kernels

use super::{from_array_f32, from_array_i32, to_array_f32, to_array_i32};
use crate::autograd::{KernelArgs, KernelOutput};
use crate::error::{Error, Result};
use crate::shape::assert_and_get_broadcast_shape;
use crate::tensor::{DType, TensorData};
use ndarray::{ArrayD, IxDyn, Zip};

/// Apply `op` pairwise under numpy broadcasting.
pub(crate) fn broadcast_binary<T, U, F>(a: &ArrayD<T>, b: &ArrayD<T>, op: F) -> Result<ArrayD<U>>
where
    T: Copy,
    F: Fn(T, T) -> U,
{
    let out_shape = assert_and_get_broadcast_shape(a.shape(), b.shape())?;
    let incompatible = || Error::IncompatibleBroadcast {
        a: a.shape().to_vec(),
        b: b.shape().to_vec(),
    };
    let a_view = a.broadcast(IxDyn(&out_shape)).ok_or_else(incompatible)?;
    let b_view = b.broadcast(IxDyn(&out_shape)).ok_or_else(incompatible)?;
    Ok(Zip::from(&a_view)
        .and(&b_view)
        .map_collect(|&x, &y| op(x, y)))
}

fn binary(
    args: &KernelArgs<'_>,
    float_op: fn(f32, f32) -> f32,
    int_op: Option<fn(i32, i32) -> i32>,
) -> Result<Vec<KernelOutput>> {
    let a = args.input("a")?;
    let b = args.input("b")?;
    if a.dtype() != b.dtype() {
        return Err(Error::DtypeMismatch {
            x: a.dtype(),
            y: b.dtype(),
        });
    }

    match (a.dtype(), int_op) {
        (DType::Int32, Some(op)) => {
            let out = broadcast_binary(&to_array_i32(a)?, &to_array_i32(b)?, op)?;
            Ok(vec![from_array_i32(out)])
        }
        (DType::Float32 | DType::Int32 | DType::Bool, _) => {
            let out = broadcast_binary(&to_array_f32(a)?, &to_array_f32(b)?, float_op)?;
            Ok(vec![from_array_f32(out)])
        }
        (dtype, _) => Err(args.unsupported(dtype)),
    }
}

pub(crate) fn add(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    binary(args, |a, b| a + b, Some(i32::wrapping_add))
}

pub(crate) fn sub(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    binary(args, |a, b| a - b, Some(i32::wrapping_sub))
}

pub(crate) fn multiply(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    binary(args, |a, b| a * b, Some(i32::wrapping_mul))
}

/// Always produces float32, also for integer operands.
pub(crate) fn real_div(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    binary(args, |a, b| a / b, None)
}

fn unary_float(args: &KernelArgs<'_>, op: fn(f32) -> f32) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    if !x.dtype().is_numeric() {
        return Err(args.unsupported(x.dtype()));
    }
    Ok(vec![from_array_f32(to_array_f32(x)?.mapv(op))])
}

/// Integer input stays integer; everything else is computed in float32.
fn unary_preserving(
    args: &KernelArgs<'_>,
    float_op: fn(f32) -> f32,
    int_op: fn(i32) -> i32,
) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    match x.dtype() {
        DType::Int32 => Ok(vec![from_array_i32(to_array_i32(x)?.mapv(int_op))]),
        DType::Float32 | DType::Bool => Ok(vec![from_array_f32(to_array_f32(x)?.mapv(float_op))]),
        other => Err(args.unsupported(other)),
    }
}

pub(crate) fn neg(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_preserving(args, |x| -x, i32::wrapping_neg)
}

pub(crate) fn square(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_preserving(args, |x| x * x, |x| x.wrapping_mul(x))
}

pub(crate) fn sqrt(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_float(args, f32::sqrt)
}

pub(crate) fn rsqrt(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_float(args, |x| 1.0 / x.sqrt())
}

pub(crate) fn exp(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_float(args, f32::exp)
}

pub(crate) fn log(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_float(args, f32::ln)
}

pub(crate) fn floor(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_float(args, f32::floor)
}

pub(crate) fn atan(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    unary_float(args, f32::atan)
}

pub(crate) fn cast(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    let target = args.attrs.dtype("dtype")?;
    if x.dtype() == target {
        return Ok(vec![KernelOutput::Alias {
            input: 0,
            shape: x.shape.to_vec(),
        }]);
    }
    if !x.dtype().is_numeric() || !target.is_numeric() {
        return Err(args.unsupported(x.dtype()));
    }

    let values = x.data.to_f32_vec()?;
    let data = match target {
        DType::Float32 => TensorData::Float32(values),
        DType::Int32 => TensorData::Int32(values.into_iter().map(|v| v as i32).collect()),
        DType::Bool => TensorData::Bool(values.into_iter().map(|v| u8::from(v != 0.0)).collect()),
        other => return Err(args.unsupported(other)),
    };
    Ok(vec![KernelOutput::values(data, x.shape)])
}
