//! Shape and stride arithmetic
//!
//! Pure, side-effect-free helpers shared by the tensor front door, the
//! kernels and the backward pass.
//!
//! - **broadcast**: broadcast shapes and gradient reduction axes
//! - **concat**: concat parameter validation and output shape

mod broadcast;
mod concat;


pub use broadcast::{assert_and_get_broadcast_shape, get_broadcast_dims, get_reduction_axes};
pub use concat::{assert_params_consistent, compute_out_shape};

use crate::error::{Error, Result};

/// Number of elements described by `shape`. The scalar shape `[]` has size 1.
pub fn size_from_shape(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Row-major strides: the last dimension has stride 1 and every earlier
/// dimension strides over the product of all later dimensions.
///
/// The scalar shape `[]` has no strides.
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Validate a shape literal coming from an untyped source.
///
/// Every entry must be a non-negative integer; otherwise construction fails
/// with a message that repeats the literal exactly as given.
pub fn validate_shape_literal(shape: &[f64]) -> Result<Vec<usize>> {
    let valid = shape
        .iter()
        .all(|&d| d.is_finite() && d >= 0.0 && d.fract() == 0.0);

    if !valid {
        return Err(Error::InvalidShape {
            shape: format_literal(shape),
        });
    }

    Ok(shape.iter().map(|&d| d as usize).collect())
}

fn format_literal(shape: &[f64]) -> String {
    shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Normalize a (possibly negative) axis list against `rank`.
///
/// An empty list means every axis. Axes must lie in `[-rank, rank)`.
pub fn parse_axis_param(axes: &[i64], rank: usize) -> Result<Vec<usize>> {
    if axes.is_empty() {
        return Ok((0..rank).collect());
    }

    let signed_rank = rank as i64;
    axes.iter()
        .map(|&axis| {
            if axis < -signed_rank || axis >= signed_rank {
                Err(Error::AxisOutOfRange { axis, rank })
            } else if axis < 0 {
                Ok((signed_rank + axis) as usize)
            } else {
                Ok(axis as usize)
            }
        })
        .collect()
}

/// Output shape of a reduction over `axes`.
pub fn reduced_shape(shape: &[usize], axes: &[usize], keep_dims: bool) -> Vec<usize> {
    shape
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| {
            if !axes.contains(&i) {
                Some(d)
            } else if keep_dims {
                Some(1)
            } else {
                None
            }
        })
        .collect()
}

/// Shape with the reduced `axes` expanded back to size 1.
pub fn expand_shape_to_keep_dim(shape: &[usize], axes: &[usize]) -> Vec<usize> {
    reduced_shape(shape, axes, true)
}
