//! Gradient configs of the built-in kernels
//!
//! Each gradient function receives the upstream gradients plus whatever
//! its config asked to be saved, and returns one lazy [`Thunk`] per
//! kernel input. Broadcast gradients may be returned at the broadcast
//! shape; the backward pass sums them back onto the input's shape.

mod arithmetic;
mod batch_norm;
mod transform;
mod unary;

#[cfg(test)]
mod tests;

use crate::autograd::{Engine, GradConfig, GradMap, KernelRegistry, Thunk};
use crate::error::Result;
use crate::kernels;
use crate::ops;
use crate::tensor::{DType, Tensor};

pub(crate) fn register_all(registry: &mut KernelRegistry) {
    let configs = [
        GradConfig::new(kernels::ADD, arithmetic::add_grad),
        GradConfig::new(kernels::SUB, arithmetic::sub_grad),
        GradConfig::new(kernels::MULTIPLY, arithmetic::multiply_grad).save_inputs(&["a", "b"]),
        GradConfig::new(kernels::REAL_DIV, arithmetic::real_div_grad).save_inputs(&["a", "b"]),
        GradConfig::new(kernels::NEG, unary::neg_grad),
        GradConfig::new(kernels::SQRT, unary::sqrt_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::RSQRT, unary::rsqrt_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::SQUARE, unary::square_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::EXP, unary::exp_grad).save_outputs(&[true]),
        GradConfig::new(kernels::LOG, unary::log_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::FLOOR, unary::zero_grad),
        GradConfig::new(kernels::ATAN, unary::atan_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::CAST, unary::pass_through_grad),
        GradConfig::new(kernels::IDENTITY, unary::pass_through_grad),
        GradConfig::new(kernels::ZEROS_LIKE, unary::zero_grad),
        GradConfig::new(kernels::ONES_LIKE, unary::zero_grad),
        GradConfig::new(kernels::SUM, transform::sum_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::RESHAPE, transform::reshape_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::TILE, transform::tile_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::SLICE, transform::slice_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::PAD_V2, transform::pad_grad).save_inputs(&["x"]),
        GradConfig::new(kernels::CONCAT, transform::concat_grad).save_all_inputs(),
        GradConfig::new(kernels::FUSED_BATCH_NORM, batch_norm::fused_batch_norm_grad)
            .save_inputs(&["x", "mean", "variance", "scale"]),
    ];
    for config in configs {
        registry.insert_gradient(config);
    }
}

fn grad_map<const N: usize>(entries: [(&str, Thunk); N]) -> GradMap {
    entries
        .into_iter()
        .map(|(name, thunk)| (name.to_string(), thunk))
        .collect()
}

/// Integer and bool tensors are cast so they can meet a float32 gradient.
fn as_float(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    if x.dtype() == DType::Float32 {
        Ok(x.clone())
    } else {
        ops::cast(engine, x, DType::Float32)
    }
}
