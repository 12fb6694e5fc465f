//! Fused batch normalization

use super::elementwise::broadcast_binary;
use super::{from_array_f32, to_array_f32};
use crate::autograd::{KernelArgs, KernelOutput};
use crate::error::Result;

/// `(x - mean) / sqrt(variance + eps) * scale + offset`, broadcasting the
/// parameters against `x`. `scale` and `offset` are optional inputs.
pub(crate) fn fused_batch_norm(args: &KernelArgs<'_>) -> Result<Vec<KernelOutput>> {
    let x = to_array_f32(args.input("x")?)?;
    let mean = to_array_f32(args.input("mean")?)?;
    let variance = to_array_f32(args.input("variance")?)?;
    let epsilon = args.attrs.float("varianceEpsilon").unwrap_or(0.001) as f32;

    let inv_std = variance.mapv(|v| 1.0 / (v + epsilon).sqrt());
    let centered = broadcast_binary(&x, &mean, |a, b| a - b)?;
    let mut out = broadcast_binary(&centered, &inv_std, |a, b| a * b)?;

    if let Some(scale) = args.optional("scale") {
        out = broadcast_binary(&out, &to_array_f32(scale)?, |a, b| a * b)?;
    }
    if let Some(offset) = args.optional("offset") {
        out = broadcast_binary(&out, &to_array_f32(offset)?, |a, b| a + b)?;
    }

    Ok(vec![from_array_f32(out)])
}
