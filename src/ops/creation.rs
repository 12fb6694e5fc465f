//! Tensor construction front door

use crate::autograd::{Engine, TensorMap};
use crate::error::{Error, Result};
use crate::kernels;
use crate::shape::size_from_shape;
use crate::tensor::{DType, Tensor, TensorBuffer, TensorData};

/// Tensor of `shape` holding `values`; the value count must match.
pub fn tensor(engine: &mut Engine, values: impl Into<TensorData>, shape: &[usize]) -> Result<Tensor> {
    engine.make_tensor(values.into(), shape)
}

pub fn tensor_f32(engine: &mut Engine, values: &[f32], shape: &[usize]) -> Result<Tensor> {
    tensor(engine, values.to_vec(), shape)
}

pub fn tensor_i32(engine: &mut Engine, values: &[i32], shape: &[usize]) -> Result<Tensor> {
    tensor(engine, values.to_vec(), shape)
}

pub fn tensor_bool(engine: &mut Engine, values: &[bool], shape: &[usize]) -> Result<Tensor> {
    tensor(engine, values.to_vec(), shape)
}

pub fn tensor_str(engine: &mut Engine, values: &[&str], shape: &[usize]) -> Result<Tensor> {
    tensor(engine, values.to_vec(), shape)
}

/// Rank-0 float32 tensor.
pub fn scalar(engine: &mut Engine, value: f32) -> Result<Tensor> {
    tensor(engine, vec![value], &[])
}

pub fn zeros(engine: &mut Engine, shape: &[usize], dtype: DType) -> Result<Tensor> {
    engine.make_tensor(TensorData::zeros(dtype, size_from_shape(shape)), shape)
}

pub fn ones(engine: &mut Engine, shape: &[usize], dtype: DType) -> Result<Tensor> {
    let size = size_from_shape(shape);
    let values = match dtype {
        DType::Float32 => TensorData::Float32(vec![1.0; size]),
        DType::Int32 => TensorData::Int32(vec![1; size]),
        DType::Bool => TensorData::Bool(vec![1; size]),
        DType::Complex64 => TensorData::Complex64((0..size).flat_map(|_| [1.0, 0.0]).collect()),
        DType::String => {
            return Err(Error::UnsupportedDtype {
                kernel: "ones".to_string(),
                dtype,
            })
        }
    };
    engine.make_tensor(values, shape)
}

pub fn zeros_like(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    engine.run_kernel_single(kernels::ZEROS_LIKE, &TensorMap::new().with("x", x), &Default::default())
}

pub fn ones_like(engine: &mut Engine, x: &Tensor) -> Result<Tensor> {
    engine.run_kernel_single(kernels::ONES_LIKE, &TensorMap::new().with("x", x), &Default::default())
}

/// Mutable builder of `shape`, zero filled.
pub fn buffer(shape: &[usize], dtype: DType) -> TensorBuffer {
    TensorBuffer::new(shape, dtype)
}

/// Like [`buffer`], validating an untyped shape literal first.
pub fn buffer_from_literal(shape: &[f64], dtype: DType) -> Result<TensorBuffer> {
    TensorBuffer::from_shape_literal(shape, dtype)
}
