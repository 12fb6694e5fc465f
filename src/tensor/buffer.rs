//! Mutable tensor builder
//!
//! A `TensorBuffer` owns flat storage plus a shape and is the only mutable
//! view onto tensor values. It is frozen into an engine-owned `Tensor`
//! with [`TensorBuffer::to_tensor`].

use super::{DType, Tensor, TensorData, Value};
use crate::autograd::Engine;
use crate::error::{Error, Result};
use crate::shape::{compute_strides, size_from_shape, validate_shape_literal};

#[derive(Debug, Clone, PartialEq)]
pub struct TensorBuffer {
    shape: Vec<usize>,
    strides: Vec<usize>,
    values: TensorData,
}

impl TensorBuffer {
    /// Zero-filled buffer; string cells start unset.
    pub fn new(shape: &[usize], dtype: DType) -> Self {
        let size = size_from_shape(shape);
        Self {
            shape: shape.to_vec(),
            strides: compute_strides(shape),
            values: TensorData::zeros(dtype, size),
        }
    }

    /// Like [`TensorBuffer::new`], but validates an untyped shape literal.
    pub fn from_shape_literal(shape: &[f64], dtype: DType) -> Result<Self> {
        let shape = validate_shape_literal(shape)?;
        Ok(Self::new(&shape, dtype))
    }

    /// Wrap existing values; their element count must match `shape`.
    pub fn from_values(shape: &[usize], values: TensorData) -> Result<Self> {
        let size = size_from_shape(shape);
        if values.len() != size {
            return Err(Error::ShapeMismatch {
                expected: vec![size],
                got: vec![values.len()],
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            strides: compute_strides(shape),
            values,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &TensorData {
        &self.values
    }

    pub fn into_values(self) -> TensorData {
        self.values
    }

    /// Write one element at `loc`.
    pub fn set(&mut self, value: impl Into<Value>, loc: &[usize]) -> Result<()> {
        self.check_bounds(loc)?;
        let index = self.loc_to_index(loc)?;
        self.values.set(index, value.into())
    }

    /// Read one element at `loc`.
    pub fn get(&self, loc: &[usize]) -> Result<Value> {
        self.check_bounds(loc)?;
        let index = self.loc_to_index(loc)?;
        self.values.get(index).ok_or_else(|| Error::IndexOutOfRange {
            indices: loc.to_vec(),
            shape: self.shape.clone(),
        })
    }

    /// Flat row-major offset of `loc`.
    pub fn loc_to_index(&self, loc: &[usize]) -> Result<usize> {
        self.check_rank(loc)?;
        Ok(loc.iter().zip(&self.strides).map(|(l, s)| l * s).sum())
    }

    /// Inverse of [`TensorBuffer::loc_to_index`].
    pub fn index_to_loc(&self, index: usize) -> Result<Vec<usize>> {
        if index >= self.size() {
            return Err(Error::IndexOutOfRange {
                indices: vec![index],
                shape: self.shape.clone(),
            });
        }

        let mut remainder = index;
        Ok(self
            .strides
            .iter()
            .map(|&stride| {
                let coord = remainder / stride;
                remainder -= coord * stride;
                coord
            })
            .collect())
    }

    /// Freeze into an engine-owned tensor.
    pub fn to_tensor(&self, engine: &mut Engine) -> Result<Tensor> {
        engine.make_tensor(self.values.clone(), &self.shape)
    }

    fn check_rank(&self, loc: &[usize]) -> Result<()> {
        if loc.len() != self.rank() {
            return Err(Error::InvalidArgument(format!(
                "The number of provided coordinates ({}) must match the rank ({})",
                loc.len(),
                self.rank()
            )));
        }
        Ok(())
    }

    fn check_bounds(&self, loc: &[usize]) -> Result<()> {
        self.check_rank(loc)?;
        if loc.iter().zip(&self.shape).any(|(&l, &d)| l >= d) {
            return Err(Error::IndexOutOfRange {
                indices: loc.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(())
    }
}
