//! Reductions

use crate::autograd::{Attrs, Engine, TensorMap};
use crate::error::Result;
use crate::kernels;
use crate::shape::parse_axis_param;
use crate::tensor::Tensor;

/// Sum over `axes` (negative axes count from the end, empty means all).
pub fn sum(engine: &mut Engine, x: &Tensor, axes: &[i64], keep_dims: bool) -> Result<Tensor> {
    let axes: Vec<i64> = parse_axis_param(axes, x.rank())?
        .into_iter()
        .map(|a| a as i64)
        .collect();
    let attrs = Attrs::new().with("axis", axes).with("keepDims", keep_dims);
    engine.run_kernel_single(kernels::SUM, &TensorMap::new().with("x", x), &attrs)
}
