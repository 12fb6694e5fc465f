//! Broadcasting rules
//!
//! Shapes are aligned from the trailing dimension, numpy style.

use crate::error::{Error, Result};

/// Dimensions of `out_shape` along which `in_shape` was broadcast.
///
/// Returned indices are relative to `in_shape`.
pub fn get_broadcast_dims(in_shape: &[usize], out_shape: &[usize]) -> Vec<usize> {
    let in_rank = in_shape.len();
    let out_rank = out_shape.len();
    let mut dims = Vec::new();

    for i in 0..in_rank {
        let dim = in_rank - i - 1;
        let a = in_shape[dim];
        let b = if i < out_rank { out_shape[out_rank - i - 1] } else { 1 };
        if b > 1 && a == 1 {
            dims.insert(0, dim);
        }
    }
    dims
}

/// Axes of `out_shape` that a gradient must be summed over to map it back
/// onto `in_shape`.
///
/// An axis qualifies when it is absent from `in_shape` or collapsed to 1
/// there while larger in `out_shape`.
pub fn get_reduction_axes(in_shape: &[usize], out_shape: &[usize]) -> Vec<usize> {
    let in_rank = in_shape.len();
    let out_rank = out_shape.len();
    let mut axes = Vec::new();

    for i in 0..out_rank {
        let out_axis = out_rank - i - 1;
        let out_dim = out_shape[out_axis];
        let in_dim = if i < in_rank {
            Some(in_shape[in_rank - i - 1])
        } else {
            None
        };

        match in_dim {
            None => axes.insert(0, out_axis),
            Some(1) if out_dim > 1 => axes.insert(0, out_axis),
            Some(_) => {}
        }
    }
    axes
}

/// Broadcast shape of `a` and `b`, or an error naming both shapes.
pub fn assert_and_get_broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut result = vec![0; rank];

    for i in 0..rank {
        let da = if i < a.len() { a[a.len() - i - 1] } else { 1 };
        let db = if i < b.len() { b[b.len() - i - 1] } else { 1 };

        let dim = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(Error::IncompatibleBroadcast {
                a: a.to_vec(),
                b: b.to_vec(),
            });
        };
        result[rank - i - 1] = dim;
    }
    Ok(result)
}
