//! Built-in CPU kernels
//!
//! Forward implementations only; the matching backward rules live in
//! [`crate::gradients`]. Numeric kernels go through `ndarray`, layout-only
//! kernels (tile, slice, pad, concat) gather flat indices and therefore
//! work for every dtype.

mod batchnorm;
mod elementwise;
mod reduce;
mod transform;


use crate::autograd::{KernelConfig, KernelInput, KernelOutput, KernelRegistry};
use crate::error::{Error, Result};
use crate::tensor::TensorData;
use ndarray::{ArrayD, IxDyn};

pub const ADD: &str = "Add";
pub const SUB: &str = "Sub";
pub const MULTIPLY: &str = "Multiply";
pub const REAL_DIV: &str = "RealDiv";
pub const NEG: &str = "Neg";
pub const SQRT: &str = "Sqrt";
pub const RSQRT: &str = "Rsqrt";
pub const SQUARE: &str = "Square";
pub const EXP: &str = "Exp";
pub const LOG: &str = "Log";
pub const FLOOR: &str = "Floor";
pub const ATAN: &str = "Atan";
pub const CAST: &str = "Cast";
pub const SUM: &str = "Sum";
pub const RESHAPE: &str = "Reshape";
pub const IDENTITY: &str = "Identity";
pub const TILE: &str = "Tile";
pub const SLICE: &str = "Slice";
pub const PAD_V2: &str = "PadV2";
pub const CONCAT: &str = "Concat";
pub const ZEROS_LIKE: &str = "ZerosLike";
pub const ONES_LIKE: &str = "OnesLike";
pub const FUSED_BATCH_NORM: &str = "FusedBatchNorm";

pub(crate) fn register_all(registry: &mut KernelRegistry) {
    let kernels: [KernelConfig; 23] = [
        KernelConfig::new(ADD, elementwise::add),
        KernelConfig::new(SUB, elementwise::sub),
        KernelConfig::new(MULTIPLY, elementwise::multiply),
        KernelConfig::new(REAL_DIV, elementwise::real_div),
        KernelConfig::new(NEG, elementwise::neg),
        KernelConfig::new(SQRT, elementwise::sqrt),
        KernelConfig::new(RSQRT, elementwise::rsqrt),
        KernelConfig::new(SQUARE, elementwise::square),
        KernelConfig::new(EXP, elementwise::exp),
        KernelConfig::new(LOG, elementwise::log),
        KernelConfig::new(FLOOR, elementwise::floor),
        KernelConfig::new(ATAN, elementwise::atan),
        KernelConfig::new(CAST, elementwise::cast),
        KernelConfig::new(SUM, reduce::sum),
        KernelConfig::new(RESHAPE, transform::reshape),
        KernelConfig::new(IDENTITY, transform::identity),
        KernelConfig::new(TILE, transform::tile),
        KernelConfig::new(SLICE, transform::slice),
        KernelConfig::new(PAD_V2, transform::pad_v2),
        KernelConfig::new(CONCAT, transform::concat),
        KernelConfig::new(ZEROS_LIKE, transform::zeros_like),
        KernelConfig::new(ONES_LIKE, transform::ones_like),
        KernelConfig::new(FUSED_BATCH_NORM, batchnorm::fused_batch_norm),
    ];
    for kernel in kernels {
        registry.insert_kernel(kernel);
    }
}

fn shape_error(e: ndarray::ShapeError) -> Error {
    Error::InvalidArgument(format!("ndarray shape error: {e}"))
}

/// Numeric input as an `f32` array.
pub(crate) fn to_array_f32(input: &KernelInput<'_>) -> Result<ArrayD<f32>> {
    let values = input.data.to_f32_vec()?;
    ArrayD::from_shape_vec(IxDyn(input.shape), values).map_err(shape_error)
}

/// Numeric input as an `i32` array; floats are truncated.
pub(crate) fn to_array_i32(input: &KernelInput<'_>) -> Result<ArrayD<i32>> {
    let values: Vec<i32> = match input.data {
        TensorData::Int32(v) => v.clone(),
        TensorData::Bool(v) => v.iter().map(|&b| i32::from(b)).collect(),
        other => other.to_f32_vec()?.into_iter().map(|x| x as i32).collect(),
    };
    ArrayD::from_shape_vec(IxDyn(input.shape), values).map_err(shape_error)
}

pub(crate) fn from_array_f32(array: ArrayD<f32>) -> KernelOutput {
    let shape = array.shape().to_vec();
    KernelOutput::values(array.iter().cloned().collect::<Vec<f32>>(), &shape)
}

pub(crate) fn from_array_i32(array: ArrayD<i32>) -> KernelOutput {
    let shape = array.shape().to_vec();
    KernelOutput::values(array.iter().cloned().collect::<Vec<i32>>(), &shape)
}
