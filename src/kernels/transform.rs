//! Layout kernels
//!
//! These only move elements around, so they are written as flat index
//! gathers and accept every dtype.

use crate::autograd::{KernelArgs, KernelInput, KernelOutput};
use crate::error::{Error, Result};
use crate::shape::{compute_strides, compute_out_shape, size_from_shape};
use crate::tensor::{DType, TensorData, Value};

/// Coordinates of flat `index` under `strides`.
fn unravel(mut index: usize, strides: &[usize]) -> Vec<usize> {
    strides
        .iter()
        .map(|&stride| {
            let coord = index / stride;
            index -= coord * stride;
            coord
        })
        .collect()
}

fn ravel(coords: &[usize], strides: &[usize]) -> usize {
    coords.iter().zip(strides).map(|(c, s)| c * s).sum()
}

fn gather(x: &KernelInput<'_>, out_shape: &[usize], picks: Vec<(usize, usize)>) -> Result<Vec<KernelOutput>> {
    let data = TensorData::gather_from(&[x.data], &picks)?;
    Ok(vec![KernelOutput::values(data, out_shape)])
}

pub(crate) fn reshape(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    let shape = args.attrs.dims("shape")?;
    if size_from_shape(&shape) != size_from_shape(x.shape) {
        return Err(Error::InvalidArgument(format!(
            "Size({}) must match the product of shape {:?}",
            size_from_shape(x.shape),
            shape
        )));
    }
    Ok(vec![KernelOutput::Alias { input: 0, shape }])
}

pub(crate) fn identity(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    Ok(vec![KernelOutput::Alias {
        input: 0,
        shape: x.shape.to_vec(),
    }])
}

pub(crate) fn tile(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    let reps = args.attrs.dims("reps")?;
    if reps.len() != x.shape.len() {
        return Err(Error::InvalidArgument(format!(
            "Error in tile: rank of reps ({}) must match the rank of x ({})",
            reps.len(),
            x.shape.len()
        )));
    }

    let out_shape: Vec<usize> = x.shape.iter().zip(&reps).map(|(d, r)| d * r).collect();
    let out_strides = compute_strides(&out_shape);
    let in_strides = compute_strides(x.shape);

    let picks = (0..size_from_shape(&out_shape))
        .map(|i| {
            let coords: Vec<usize> = unravel(i, &out_strides)
                .iter()
                .zip(x.shape)
                .map(|(c, d)| c % d)
                .collect();
            (0, ravel(&coords, &in_strides))
        })
        .collect();
    gather(x, &out_shape, picks)
}

pub(crate) fn slice(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    let begin = args.attrs.dims("begin")?;
    let size = args.attrs.dims("size")?;
    let in_bounds = begin.len() == x.shape.len()
        && size.len() == x.shape.len()
        && begin
            .iter()
            .zip(&size)
            .zip(x.shape)
            .all(|((b, s), d)| b + s <= *d);
    if !in_bounds {
        return Err(Error::InvalidArgument(format!(
            "Error in slice{}D: begin {:?} and size {:?} must lie within shape {:?}",
            x.shape.len(),
            begin,
            size,
            x.shape
        )));
    }

    let out_strides = compute_strides(&size);
    let in_strides = compute_strides(x.shape);
    let picks = (0..size_from_shape(&size))
        .map(|i| {
            let coords: Vec<usize> = unravel(i, &out_strides)
                .iter()
                .zip(&begin)
                .map(|(c, b)| c + b)
                .collect();
            (0, ravel(&coords, &in_strides))
        })
        .collect();
    gather(x, &size, picks)
}

/// `PadV2`: `paddings` holds `[before, after]` per axis, flattened.
pub(crate) fn pad_v2(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    let paddings = args.attrs.dims("paddings")?;
    let constant = args.attrs.float("constantValue").unwrap_or(0.0);
    if paddings.len() != x.shape.len() * 2 {
        return Err(Error::InvalidArgument(format!(
            "Error in pad: expected {} paddings but got {}",
            x.shape.len() * 2,
            paddings.len()
        )));
    }
    if x.dtype() == DType::String {
        return Err(args.unsupported(x.dtype()));
    }

    let before: Vec<usize> = paddings.iter().step_by(2).copied().collect();
    let out_shape: Vec<usize> = x
        .shape
        .iter()
        .zip(paddings.chunks(2))
        .map(|(d, p)| p[0] + d + p[1])
        .collect();

    let mut fill = TensorData::zeros(x.dtype(), 1);
    fill.set(0, Value::Float(constant as f32))?;

    let out_strides = compute_strides(&out_shape);
    let in_strides = compute_strides(x.shape);
    let picks: Vec<(usize, usize)> = (0..size_from_shape(&out_shape))
        .map(|i| {
            let coords = unravel(i, &out_strides);
            let inside = coords
                .iter()
                .zip(&before)
                .zip(x.shape)
                .all(|((c, b), d)| *c >= *b && c - b < *d);
            if inside {
                let src: Vec<usize> = coords.iter().zip(&before).map(|(c, b)| c - b).collect();
                (0, ravel(&src, &in_strides))
            } else {
                (1, 0)
            }
        })
        .collect();

    let data = TensorData::gather_from(&[x.data, &fill], &picks)?;
    Ok(vec![KernelOutput::values(data, &out_shape)])
}

/// Inputs are `x0`, `x1`, ... in order; `axis` is already normalized.
pub(crate) fn concat(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let axis = usize::try_from(args.attrs.int("axis")?)
        .map_err(|_| Error::InvalidArgument("Concat axis must be normalized".to_string()))?;
    let shapes: Vec<Vec<usize>> = args.inputs.iter().map(|i| i.shape.to_vec()).collect();
    let out_shape = compute_out_shape(&shapes, axis)?;

    let outer: usize = out_shape[..axis].iter().product();
    let mut picks = Vec::with_capacity(size_from_shape(&out_shape));
    for o in 0..outer {
        for (source, input) in args.inputs.iter().enumerate() {
            let chunk: usize = input.shape[axis..].iter().product();
            picks.extend((0..chunk).map(|j| (source, o * chunk + j)));
        }
    }

    let sources: Vec<&TensorData> = args.inputs.iter().map(|i| i.data).collect();
    let data = TensorData::gather_from(&sources, &picks)?;
    Ok(vec![KernelOutput::values(data, &out_shape)])
}

fn filled_like(args: &KernelArgs<'_>, value: Value) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    let mut data = TensorData::zeros(x.dtype(), x.data.len());
    if x.dtype() == DType::String {
        return Err(args.unsupported(x.dtype()));
    }
    for i in 0..data.len() {
        data.set(i, value.clone())?;
    }
    Ok(vec![KernelOutput::values(data, x.shape)])
}

pub(crate) fn zeros_like(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    filled_like(args, Value::Float(0.0))
}

pub(crate) fn ones_like(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    filled_like(args, Value::Float(1.0))
}
