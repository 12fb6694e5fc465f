//! Tensor handle
//!
//! A `Tensor` is an immutable-shape handle onto a buffer owned by the
//! engine's data store. Cloning the handle does not touch the buffer's
//! reference count; only the engine does that.

use super::DType;
use crate::shape::{compute_strides, size_from_shape};

/// Unique id of a tensor handle.
pub type TensorId = usize;

/// Id of a buffer in the engine's data store.
pub type DataId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor {
    id: TensorId,
    data_id: DataId,
    shape: Vec<usize>,
    strides: Vec<usize>,
    dtype: DType,
}

impl Tensor {
    pub(crate) fn new(id: TensorId, data_id: DataId, shape: Vec<usize>, dtype: DType) -> Self {
        let strides = compute_strides(&shape);
        Self {
            id,
            data_id,
            shape,
            strides,
            dtype,
        }
    }

    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Id of the backing buffer; aliases (reshape, clone) share it.
    pub fn data_id(&self) -> DataId {
        self.data_id
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        size_from_shape(&self.shape)
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }
}
