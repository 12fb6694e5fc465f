//! Gradient of `FusedBatchNorm`
//!
//! Every derivative is produced at the broadcast shape of `x`; the backward
//! pass reduces the parameter gradients over the axes their rank-1 (or
//! `[1, 1, 1, C]`) shapes collapse.

use super::grad_map;
use crate::autograd::{Engine, GradInputs, GradMap, Thunk};
use crate::error::Result;
use crate::ops;
use crate::tensor::Tensor;

#[derive(Clone)]
struct Saved {
    dy: Tensor,
    x: Tensor,
    mean: Tensor,
    variance: Tensor,
    scale: Option<Tensor>,
    epsilon: f32,
}

impl Saved {
    fn scale(&self, engine: &mut Engine) -> Result<Tensor> {
        match &self.scale {
            Some(scale) => Ok(scale.clone()),
            None => ops::scalar(engine, 1.0),
        }
    }

    /// 1 / sqrt(variance + eps)
    fn one_over_sqrt_variance(&self, engine: &mut Engine) -> Result<Tensor> {
        let eps = ops::scalar(engine, self.epsilon)?;
        let shifted = ops::add(engine, &self.variance, &eps)?;
        ops::rsqrt(engine, &shifted)
    }

    fn x_minus_mean(&self, engine: &mut Engine) -> Result<Tensor> {
        ops::sub(engine, &self.x, &self.mean)
    }
}

pub(super) fn fused_batch_norm_grad(inputs: &GradInputs) -> Result<GradMap> {
    let saved = Saved {
        dy: inputs.dy()?,
        x: inputs.saved(0)?,
        mean: inputs.saved(1)?,
        variance: inputs.saved(2)?,
        scale: inputs.saved_opt(3),
        epsilon: inputs.attrs.float("varianceEpsilon").unwrap_or(0.001) as f32,
    };
    let (s_x, s_mean, s_var, s_scale) = (saved.clone(), saved.clone(), saved.clone(), saved.clone());
    let dy_offset = saved.dy.clone();

    Ok(grad_map([
        (
            "x",
            Thunk::new(move |engine| {
                let s = s_x;
                let oosv = s.one_over_sqrt_variance(engine)?;
                let scale = s.scale(engine)?;
                let scaled = ops::mul(engine, &oosv, &scale)?;
                ops::mul(engine, &s.dy, &scaled)
            }),
        ),
        (
            "mean",
            Thunk::new(move |engine| {
                let s = s_mean;
                let oosv = s.one_over_sqrt_variance(engine)?;
                let scale = s.scale(engine)?;
                let scaled = ops::mul(engine, &oosv, &scale)?;
                let der = ops::mul(engine, &s.dy, &scaled)?;
                ops::neg(engine, &der)
            }),
        ),
        (
            "variance",
            Thunk::new(move |engine| {
                // -0.5 * (variance + eps)^(-3/2)
                let s = s_var;
                let oosv = s.one_over_sqrt_variance(engine)?;
                let squared = ops::square(engine, &oosv)?;
                let cubed = ops::mul(engine, &squared, &oosv)?;
                let minus_half = ops::scalar(engine, -0.5)?;
                let minus_half_r_cube = ops::mul(engine, &cubed, &minus_half)?;

                let scale = s.scale(engine)?;
                let centered = s.x_minus_mean(engine)?;
                let der = ops::mul(engine, &s.dy, &centered)?;
                let der = ops::mul(engine, &der, &minus_half_r_cube)?;
                ops::mul(engine, &der, &scale)
            }),
        ),
        (
            "scale",
            Thunk::new(move |engine| {
                let s = s_scale;
                let oosv = s.one_over_sqrt_variance(engine)?;
                let centered = s.x_minus_mean(engine)?;
                let normalized = ops::mul(engine, &centered, &oosv)?;
                ops::mul(engine, &s.dy, &normalized)
            }),
        ),
        ("offset", Thunk::new(move |_| Ok(dy_offset))),
    ]))
}
