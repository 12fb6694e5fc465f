//! Elementwise unary ops

use crate::autograd::{Attrs, Engine, TensorMap};
use crate::error::Result;
use crate::kernels;
use crate::tensor::{DType, Tensor};

fn unary(engine: &mut Engine, kernel: &str, x: &Tensor) -> Result<Tensor> {
    engine.run_kernel_single(kernel, &TensorMap::new().with("x", x), &Attrs::new())
}

pub fn neg(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::NEG, x)
}

pub fn sqrt(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::SQRT, x)
}

pub fn rsqrt(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::RSQRT, x)
}

pub fn square(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::SQUARE, x)
}

pub fn exp(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::EXP, x)
}

pub fn log(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::LOG, x)
}

pub fn floor(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::FLOOR, x)
}

pub fn atan(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::ATAN, x)
}

/// New tensor sharing `x`'s buffer, recorded on the tape.
pub fn identity(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    unary(engine, kernels::IDENTITY, x)
}

pub fn cast(engine: &mut Engine, x: &Tensor, dtype: DType) -> Result<Tensor> {
    let attrs = Attrs::new().with("dtype", dtype);
    engine.run_kernel_single(kernels::CAST, &TensorMap::new().with("x", x), &attrs)
}
