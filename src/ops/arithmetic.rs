//! Binary arithmetic with numpy broadcasting

use crate::autograd::{Attrs, Engine, TensorMap};
use crate::error::{Error, Result};
use crate::kernels;
use crate::shape::assert_and_get_broadcast_shape;
use crate::tensor::Tensor;

/// Both operands must share a dtype.
pub fn assert_same_dtype(x: &Tensor, y: &Tensor) -> Result<()> {
    if x.dtype() != y.dtype() {
        return Err(Error::DtypeMismatch {
            x: x.dtype(),
            y: y.dtype(),
        });
    }
    Ok(())
}

fn binary(engine: &mut Engine, kernel: &str, a: &Tensor, b: &Tensor) -> Result<Tensor> {
    assert_same_dtype(a, b)?;
    assert_and_get_broadcast_shape(a.shape(), b.shape())?;
    let inputs = TensorMap::new().with("a", a).with("b", b);
    engine.run_kernel_single(kernel, &inputs, &Attrs::new())
}

pub fn add(engine: &mut Engine, a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary(engine, kernels::ADD, a, b)
}

pub fn sub(engine: &mut Engine, a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary(engine, kernels::SUB, a, b)
}

pub fn mul(engine: &mut Engine, a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary(engine, kernels::MULTIPLY, a, b)
}

/// Real division; integer operands produce float32.
pub fn div(engine: &mut Engine, a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary(engine, kernels::REAL_DIV, a, b)
}
