//! Gradients of reductions and layout kernels

use super::grad_map;
use crate::autograd::{GradInputs, GradMap, Thunk};
use crate::error::Result;
use crate::ops;
use crate::shape::{compute_strides, expand_shape_to_keep_dim, parse_axis_param, size_from_shape};
use crate::tensor::DType;

/// Broadcast `dy` back over the summed axes.
pub(super) fn sum_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    let axes = parse_axis_param(&inputs.attrs.ints("axis")?, x.rank())?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let expanded_shape = expand_shape_to_keep_dim(x.shape(), &axes);
            let expanded = ops::reshape(engine, &dy, &expanded_shape)?;
            let ones = ops::ones(engine, x.shape(), DType::Float32)?;
            ops::mul(engine, &expanded, &ones)
        }),
    )]))
}

pub(super) fn reshape_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| ops::reshape(engine, &dy, x.shape())),
    )]))
}

/// Sum every tiled copy of `x` in `dy` back onto `x`'s shape.
pub(super) fn tile_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    let reps = inputs.attrs.dims("reps")?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let rep_strides = compute_strides(&reps);
            let mut total = ops::zeros(engine, x.shape(), DType::Float32)?;
            for copy in 0..size_from_shape(&reps) {
                let mut remainder = copy;
                let begin: Vec<usize> = rep_strides
                    .iter()
                    .zip(x.shape())
                    .map(|(&stride, &dim)| {
                        let rep = remainder / stride;
                        remainder -= rep * stride;
                        rep * dim
                    })
                    .collect();
                let block = ops::slice(engine, &dy, &begin, x.shape())?;
                total = ops::add(engine, &total, &block)?;
            }
            Ok(total)
        }),
    )]))
}

/// Pad `dy` with zeros back out to `x`'s shape.
pub(super) fn slice_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    let begin = inputs.attrs.dims("begin")?;
    let size = inputs.attrs.dims("size")?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let paddings: Vec<(usize, usize)> = x
                .shape()
                .iter()
                .zip(begin.iter().zip(&size))
                .map(|(&dim, (&b, &s))| (b, dim - b - s))
                .collect();
            ops::pad(engine, &dy, &paddings, 0.0)
        }),
    )]))
}

/// Cut the unpadded window out of `dy`.
pub(super) fn pad_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let x = inputs.saved(0)?;
    let paddings = inputs.attrs.dims("paddings")?;
    Ok(grad_map([(
        "x",
        Thunk::new(move |engine| {
            let begin: Vec<usize> = paddings.iter().step_by(2).copied().collect();
            ops::slice(engine, &dy, &begin, x.shape())
        }),
    )]))
}

/// Split `dy` along the concat axis, one piece per input.
pub(super) fn concat_grad(inputs: &GradInputs) -> Result<GradMap> {
    let dy = inputs.dy()?;
    let axis = inputs.attrs.dims("axis")?.first().copied().unwrap_or(0);
    let mut offset = 0;
    let mut grads = GradMap::new();
    for (i, saved) in inputs.saved.iter().enumerate() {
        let Some(x) = saved.clone() else { continue };
        let mut begin = vec![0; x.rank()];
        begin[axis] = offset;
        offset += x.shape()[axis];

        let dy = dy.clone();
        grads.insert(
            format!("x{i}"),
            Thunk::new(move |engine| ops::slice(engine, &dy, &begin, x.shape())),
        );
    }
    Ok(grads)
}
