//! Tensor data model
//!
//! - **dtype**: the closed set of element types
//! - **data**: flat typed storage and single-element values
//! - **buffer**: `TensorBuffer`, the mutable builder
//! - **handle**: `Tensor`, the engine-owned handle

mod buffer;
mod data;
mod dtype;
mod handle;

#[cfg(test)]
mod tests;

pub use buffer::TensorBuffer;
pub use data::{TensorData, Value};
pub use dtype::DType;
pub use handle::{DataId, Tensor, TensorId};
