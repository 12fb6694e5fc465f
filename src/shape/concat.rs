//! Concat parameter validation

use crate::error::{Error, Result};

/// Check that `shapes` can be concatenated along `axis`.
///
/// All shapes must share the first shape's rank, `axis` must lie in
/// `[0, rank)`, and every non-axis dimension must agree.
pub fn assert_params_consistent(shapes: &[Vec<usize>], axis: usize) -> Result<()> {
    let first = shapes
        .first()
        .ok_or_else(|| Error::InvalidArgument("concat requires at least one shape".into()))?;
    let rank = first.len();

    if let Some(bad) = shapes.iter().find(|s| s.len() != rank) {
        return Err(Error::ShapeMismatch {
            expected: first.clone(),
            got: bad.clone(),
        });
    }

    if axis >= rank {
        return Err(Error::AxisOutOfRange {
            axis: axis as i64,
            rank,
        });
    }

    for shape in shapes {
        let mismatch = (0..rank).any(|r| r != axis && shape[r] != first[r]);
        if mismatch {
            return Err(Error::ShapeMismatch {
                expected: first.clone(),
                got: shape.clone(),
            });
        }
    }
    Ok(())
}

/// Output shape of concatenating `shapes` along `axis`.
pub fn compute_out_shape(shapes: &[Vec<usize>], axis: usize) -> Result<Vec<usize>> {
    assert_params_consistent(shapes, axis)?;

    let mut out = shapes[0].clone();
    out[axis] = shapes.iter().map(|s| s[axis]).sum();
    Ok(out)
}
