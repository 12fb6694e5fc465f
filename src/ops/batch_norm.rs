//! Batch normalization

use crate::autograd::{Attrs, Engine, TensorMap};
use crate::error::{Error, Result};
use crate::kernels;
use crate::tensor::Tensor;

pub const DEFAULT_VARIANCE_EPSILON: f32 = 0.001;

/// Reshape `x` to rank 4 by prepending unit axes; rank 0 and 1 become
/// `[1, 1, 1, size]`. Rank 4 and above pass through unchanged.
pub fn x_as_4d(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    let shape = x.shape();
    match x.rank() {
        0 | 1 => super::reshape(engine, x, &[1, 1, 1, x.size()]),
        2 => super::reshape(engine, x, &[1, 1, shape[0], shape[1]]),
        3 => super::reshape(engine, x, &[1, shape[0], shape[1], shape[2]]),
        _ => Ok(x.clone()),
    }
}

fn require(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidArgument(message()))
    }
}

/// `(x - mean) / sqrt(variance + eps) * scale + offset`.
///
/// `mean`, `variance` and the optional `offset`/`scale` must share a rank.
/// The result has `x`'s shape.
pub fn batch_norm(
    engine: &mut Engine,
    x: &Tensor,
    mean: &Tensor,
    variance: &Tensor,
    offset: Option<&Tensor>,
    scale: Option<&Tensor>,
    variance_epsilon: f32,
) -> Result<Tensor> {
    require(mean.rank() == variance.rank(), || {
        "Batch normalization gradient requires mean and variance to have equal ranks.".to_string()
    })?;
    if let Some(offset) = offset {
        require(mean.rank() == offset.rank(), || {
            "Batch normalization gradient requires mean and offset to have equal ranks."
                .to_string()
        })?;
    }
    if let Some(scale) = scale {
        require(mean.rank() == scale.rank(), || {
            "Batch normalization gradient requires mean and scale to have equal ranks."
                .to_string()
        })?;
    }

    let x4d = x_as_4d(engine, x)?;
    let mut inputs = TensorMap::new()
        .with("x", &x4d)
        .with("mean", mean)
        .with("variance", variance);
    if let Some(scale) = scale {
        inputs.insert("scale", scale);
    }
    if let Some(offset) = offset {
        inputs.insert("offset", offset);
    }
    let attrs = Attrs::new().with("varianceEpsilon", f64::from(variance_epsilon));

    let out = engine.run_kernel_single(kernels::FUSED_BATCH_NORM, &inputs, &attrs)?;
    super::reshape(engine, &out, x.shape())
}

/// [`batch_norm`] for rank-4 input with rank-4 or rank-1 parameters.
pub fn batch_norm4d(
    engine: &mut Engine,
    x: &Tensor,
    mean: &Tensor,
    variance: &Tensor,
    offset: Option<&Tensor>,
    scale: Option<&Tensor>,
    variance_epsilon: f32,
) -> Result<Tensor> {
    require(x.rank() == 4, || {
        format!("Error in batchNorm4D: x must be rank 4 but got rank {}.", x.rank())
    })?;
    let params = [
        ("mean", Some(mean)),
        ("variance", Some(variance)),
        ("offset", offset),
        ("scale", scale),
    ];
    for (name, param) in params {
        if let Some(param) = param {
            require(param.rank() == 4 || param.rank() == 1, || {
                format!(
                    "Error in batchNorm4D: {name} must be rank 4 or rank 1 but got rank {}.",
                    param.rank()
                )
            })?;
        }
    }
    batch_norm(engine, x, mean, variance, offset, scale, variance_epsilon)
}
