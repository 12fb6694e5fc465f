//! Reductions

use super::{to_array_f32, to_array_i32};
use crate::autograd::{KernelArgs, KernelOutput};
use crate::error::Result;
use crate::shape::{parse_axis_param, reduced_shape};
use crate::tensor::{DType, TensorData};
use ndarray::{ArrayD, Axis};
use num_traits::Zero;

fn sum_axes<T, F>(mut array: ArrayD<T>, axes: &[usize], add: F) -> ArrayD<T>
where
    T: Copy + Zero,
    F: Fn(T, T) -> T,
{
    let mut sorted = axes.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    for axis in sorted {
        array = array.fold_axis(Axis(axis), T::zero(), |&acc, &v| add(acc, v));
    }
    array
}

/// `Sum` over `axis` (empty means every axis). Float input keeps float32
/// and propagates NaN; int32 and bool input sum to int32, wrapping on
/// overflow like the elementwise int kernels.
pub(crate) fn sum(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = args.input("x")?;
    let axes = parse_axis_param(&args.attrs.ints("axis")?, x.shape.len())?;
    let keep_dims = args.attrs.bool("keepDims").unwrap_or(false);
    let out_shape = reduced_shape(x.shape, &axes, keep_dims);

    let data: TensorData = match x.dtype() {
        DType::Float32 => sum_axes(to_array_f32(x)?, &axes, |a: f32, b: f32| a + b)
            .iter()
            .cloned()
            .collect::<Vec<f32>>()
            .into(),
        DType::Int32 | DType::Bool => sum_axes(to_array_i32(x)?, &axes, i32::wrapping_add)
            .iter()
            .cloned()
            .collect::<Vec<i32>>()
            .into(),
        other => return Err(args.unsupported(other)),
    };
    Ok(vec![KernelOutput::values(data, &out_shape)])
}
