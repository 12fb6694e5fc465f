//! Shape-changing ops

use crate::autograd::{Attrs, Engine, TensorMap};
use crate::error::{Error, Result};
use crate::kernels;
use crate::shape::{assert_params_consistent, parse_axis_param, size_from_shape};
use crate::tensor::Tensor;

/// View `x` under a new shape with the same number of elements.
pub fn reshape(engine: &mut Engine, x: &Tensor, shape: &[usize]) -> Result<Tensor> {
    if size_from_shape(shape) != x.size() {
        return Err(Error::ShapeMismatch {
            expected: x.shape().to_vec(),
            got: shape.to_vec(),
        });
    }
    let attrs = Attrs::new().with("shape", shape);
    engine.run_kernel_single(kernels::RESHAPE, &TensorMap::new().with("x", x), &attrs)
}

/// Like [`reshape`], where at most one entry may be `-1` and is inferred.
pub fn reshape_infer(engine: &mut Engine, x: &Tensor, shape: &[i64]) -> Result<Tensor> {
    let resolved = infer_from_implicit_shape(shape, x.size())?;
    reshape(engine, x, &resolved)
}

fn infer_from_implicit_shape(shape: &[i64], size: usize) -> Result<Vec<usize>> {
    let implicit: Vec<usize> = shape
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == -1)
        .map(|(i, _)| i)
        .collect();
    if implicit.len() > 1 {
        return Err(Error::InvalidArgument(format!(
            "Shapes can only have 1 implicit size. Found -1 at dim {} and dim {}",
            implicit[0], implicit[1]
        )));
    }
    if let Some(bad) = shape.iter().find(|&&d| d < -1) {
        return Err(Error::InvalidArgument(format!(
            "Dim size must be non-negative or -1, got {bad}"
        )));
    }

    let known: usize = shape
        .iter()
        .filter(|&&d| d >= 0)
        .map(|&d| d as usize)
        .product();
    let mut resolved: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(&i) = implicit.first() {
        if known == 0 || size % known != 0 {
            return Err(Error::InvalidArgument(format!(
                "The implicit shape can't be a fractional number. Got {size} / {known}"
            )));
        }
        resolved[i] = size / known;
    }
    Ok(resolved)
}

/// Repeat `x` `reps[i]` times along axis `i`.
pub fn tile(engine: &mut Engine, x: &Tensor, reps: &[usize]) -> Result<Tensor> {
    if reps.len() != x.rank() {
        return Err(Error::InvalidArgument(format!(
            "Error in tile: rank of reps ({}) must match the rank of x ({})",
            reps.len(),
            x.rank()
        )));
    }
    let attrs = Attrs::new().with("reps", reps);
    engine.run_kernel_single(kernels::TILE, &TensorMap::new().with("x", x), &attrs)
}

/// Window of `size` starting at `begin`.
pub fn slice(engine: &mut Engine, x: &Tensor, begin: &[usize], size: &[usize]) -> Result<Tensor> {
    let attrs = Attrs::new().with("begin", begin).with("size", size);
    engine.run_kernel_single(kernels::SLICE, &TensorMap::new().with("x", x), &attrs)
}

/// Pad every axis with `(before, after)` copies of `constant`.
pub fn pad(
    engine: &mut Engine,
    x: &Tensor,
    paddings: &[(usize, usize)],
    constant: f32,
) -> Result<Tensor> {
    if paddings.len() != x.rank() {
        return Err(Error::InvalidArgument(format!(
            "Error in pad: paddings must have one entry per axis ({}) but got {}",
            x.rank(),
            paddings.len()
        )));
    }
    let flat: Vec<usize> = paddings.iter().flat_map(|&(b, a)| [b, a]).collect();
    let attrs = Attrs::new()
        .with("paddings", flat.as_slice())
        .with("constantValue", f64::from(constant));
    engine.run_kernel_single(kernels::PAD_V2, &TensorMap::new().with("x", x), &attrs)
}

/// Concatenate along `axis` (negative counts from the end).
pub fn concat(engine: &mut Engine, tensors: &[Tensor], axis: i64) -> Result<Tensor> {
    let Some(first) = tensors.first() else {
        return Err(Error::InvalidArgument(
            "concat requires at least one tensor".to_string(),
        ));
    };
    let axis = parse_axis_param(&[axis], first.rank())?[0];

    let shapes: Vec<Vec<usize>> = tensors.iter().map(|t| t.shape().to_vec()).collect();
    assert_params_consistent(&shapes, axis)?;
    for t in &tensors[1..] {
        super::assert_same_dtype(first, t)?;
    }

    if tensors.len() == 1 {
        return super::identity(engine, first);
    }

    let mut inputs = TensorMap::new();
    for (i, t) in tensors.iter().enumerate() {
        inputs.insert(&format!("x{i}"), t);
    }
    engine.run_kernel_single(kernels::CONCAT, &inputs, &Attrs::new().with("axis", axis))
}
