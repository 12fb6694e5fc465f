//! Gradients of elementwise unary kernels

use super::{as_float, grad_map};
use crate::autograd::{GradInputs, GradMap, Thunk};
use crate::error::Result;
use crate::ops;

pub(super) fn neg_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    Ok(grad_map([("x", Thunk::new(move |engine| ops::neg(engine, &dy)))]))
}

/// d/dx sqrt(x) = 1 / (2 sqrt(x))
pub(super) fn sqrt_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let x = as_float(engine, &x)?;
            let root = ops::sqrt(engine, &x)?;
            let two = ops::scalar(engine, 2.0)?;
            let denominator = ops::mul(engine, &root, &two)?;
            ops::div(engine, &dy, &denominator)
        }),
    )]))
}

/// d/dx x^(-1/2) = -1 / (2 x sqrt(x))
pub(super) fn rsqrt_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let x = as_float(engine, &x)?;
            let root = ops::sqrt(engine, &x)?;
            let x_root = ops::mul(engine, &x, &root)?;
            let two = ops::scalar(engine, 2.0)?;
            let denominator = ops::mul(engine, &x_root, &two)?;
            let quotient = ops::div(engine, &dy, &denominator)?;
            ops::neg(engine, &quotient)
        }),
    )]))
}

pub(super) fn square_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let x = as_float(engine, &x)?;
            let two = ops::scalar(engine, 2.0)?;
            let two_x = ops::mul(engine, &x, &two)?;
            ops::mul(engine, &dy, &two_x)
        }),
    )]))
}

/// Uses the saved output: d/dx e^x = e^x.
pub(super) fn exp_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let y = inputs.saved(0)?;
    Ok(grad_map([("x", Thunk::new(move |engine| ops::mul(engine, &dy, &y)))]))
}

pub(super) fn log_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let x = as_float(engine, &x)?;
            ops::div(engine, &dy, &x)
        }),
    )]))
}

/// d/dx atan(x) = 1 / (1 + x^2)
pub(super) fn atan_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let x = as_float(engine, &x)?;
            let squared = ops::square(engine, &x)?;
            let one = ops::scalar(engine, 1.0)?;
            let denominator = ops::add(engine, &squared, &one)?;
            ops::div(engine, &dy, &denominator)
        }),
    )]))
}

/// Piecewise-constant kernels (`Floor`, `ZerosLike`, `OnesLike`).
pub(super) fn zero_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    Ok(grad_map([("x", Thunk::new(move |engine| ops::zeros_like(engine, &dy)))]))
}

/// `Identity` and `Cast` hand the upstream gradient straight through.
pub(super) fn pass_through_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    Ok(grad_map([("x", Thunk::new(move |_| Ok(dy)))]))
}
