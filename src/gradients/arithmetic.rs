//! Gradients of binary arithmetic

use super::{as_float, grad_map};
use crate::autograd::{GradInputs, GradMap, Thunk};
use crate::error::Result;
use crate::ops;

pub(super) fn add_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let dy_b = dy.clone();
    Ok(grad_map([
        ("a", Thunk::new(move |_| Ok(dy))),
        ("b", Thunk::new(move |_| Ok(dy_b))),
    ]))
}

pub(super) fn sub_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let dy_b = dy.clone();
    Ok(grad_map([
        ("a", Thunk::new(move |_| Ok(dy))),
        ("b", Thunk::new(move |engine| ops::neg(engine, &dy_b))),
    ]))
}

pub(super) fn multiply_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let a = inputs.saved(0)?;
    let b = inputs.saved(1)?;
    let dy_b = dy.clone();
    Ok(grad_map([
        (
            "a",
            Thunk::new(move |engine| {
                let b = as_float(engine, &b)?;
                ops::mul(engine, &dy, &b)
            }),
        ),
        (
            "b",
            Thunk::new(move |engine| {
                let a = as_float(engine, &a)?;
                ops::mul(engine, &dy_b, &a)
            }),
        ),
    ]))
}

pub(super) fn real_div_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let a = inputs.saved(0)?;
    let b = inputs.saved(1)?;
    let (dy_b, b_for_b) = (dy.clone(), b.clone());
    Ok(grad_map([
        (
            "a",
            Thunk::new(move |engine| {
                let b = as_float(engine, &b)?;
                ops::div(engine, &dy, &b)
            }),
        ),
        (
            "b",
            Thunk::new(move |engine| {
                // -dy * a / b^2
                let a = as_float(engine, &a)?;
                let b = as_float(engine, &b_for_b)?;
                let numerator = ops::mul(engine, &dy_b, &a)?;
                let denominator = ops::square(engine, &b)?;
                let quotient = ops::div(engine, &numerator, &denominator)?;
                ops::neg(engine, &quotient)
            }),
        ),
    ]))
}
