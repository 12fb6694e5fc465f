//! Op layer
//!
//! Validates arguments, then dispatches to the engine with
//! [`Engine::run_kernel`](crate::autograd::Engine::run_kernel). Every op
//! takes the engine explicitly.

mod arithmetic;
mod batch_norm;
mod creation;
mod reduction;
mod transform;
mod unary;


pub use arithmetic::{add, assert_same_dtype, div, mul, sub};
pub use batch_norm::{batch_norm, batch_norm4d, x_as_4d, DEFAULT_VARIANCE_EPSILON};
pub use creation::{
    buffer, buffer_from_literal, ones, ones_like, scalar, tensor, tensor_bool, tensor_f32,
    tensor_i32, tensor_str, zeros, zeros_like,
};
pub use reduction::sum;
pub use transform::{concat, pad, reshape, reshape_infer, slice, tile};
pub use unary::{atan, cast, exp, floor, identity, log, neg, rsqrt, sqrt, square};
