//! Error types for tensorgrad

use crate::tensor::{DType, TensorId};
use thiserror::Error;

fn format_dims(dims: &[usize]) -> String {
    dims.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tensor must have a shape comprised of positive integers but got shape [{shape}].")]
    InvalidShape { shape: String },

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Axis {axis} is out of range for rank {rank}")]
    AxisOutOfRange { axis: i64, rank: usize },

    #[error(
        "Operands could not be broadcast together with shapes [{}] and [{}].",
        format_dims(.a),
        format_dims(.b)
    )]
    IncompatibleBroadcast { a: Vec<usize>, b: Vec<usize> },

    #[error(
        "Requested out of range element at [{}]. Buffer shape=[{}]",
        format_dims(.indices),
        format_dims(.shape)
    )]
    IndexOutOfRange {
        indices: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("x and y should have the same dtype, but got x ({x}) and y ({y}).")]
    DtypeMismatch { x: DType, y: DType },

    #[error("Kernel '{kernel}' does not support dtype {dtype}")]
    UnsupportedDtype { kernel: String, dtype: DType },

    #[error("Kernel '{0}' is not registered")]
    UnknownKernel(String),

    #[error("Kernel '{0}' is already registered")]
    KernelAlreadyRegistered(String),

    #[error("Gradient for kernel '{0}' is already registered")]
    GradientAlreadyRegistered(String),

    #[error("Cannot compute gradient: gradient function not found for {0}.")]
    MissingGradient(String),

    #[error(
        "Cannot backprop through input {input} of {kernel}. Available gradients found: [{}].",
        .available.join(",")
    )]
    MissingInputGradient {
        kernel: String,
        input: String,
        available: Vec<String>,
    },

    #[error(
        "Error in gradient for op {kernel}. The gradient of input '{input}' has shape [{}], which cannot be reduced to the input shape [{}]",
        format_dims(.got),
        format_dims(.expected)
    )]
    GradientShapeMismatch {
        kernel: String,
        input: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error(
        "Cannot compute gradient of y=f(x) with respect to x. Make sure that the f you passed encloses all operations that lead from x to y."
    )]
    NoGradientPath,

    #[error("Tensor is disposed.")]
    TensorDisposed { id: TensorId },

    #[error("The result of the '{kernel}' kernel contains NaN")]
    NumericError { kernel: String },

    #[error("Invalid gradient: {0}")]
    InvalidGradient(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidProgress(String),

    #[error("{0}")]
    AssertionFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tracing error: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
