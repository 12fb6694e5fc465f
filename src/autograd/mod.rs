//! Tape-based autograd engine
//!
//! - **registry**: kernel name → forward implementation and gradient config
//! - **engine**: kernel dispatch, tidy scopes, refcounted buffers
//! - **tape**: the record of forward kernels while gradients are requested
//! - **backward**: reverse traversal with broadcast reduction
//! - **thunk**: lazily computed per-input gradients

mod backward;
mod engine;
mod registry;
mod scope;
mod store;
mod tape;
mod thunk;


pub use backward::{backpropagate, filter_nodes_x_to_y, reduce_to_shape};
pub use engine::{Engine, Gradients, MemoryInfo};
pub use registry::{
    AttrValue, Attrs, ForwardFn, GradConfig, GradFunc, GradInputs, GradMap, KernelArgs,
    KernelConfig, KernelInput, KernelOutput, KernelRegistry, TensorMap,
};
pub use scope::TensorContainer;
pub use store::DataStore;
pub use tape::{Tape, TapeNode, TapeState};
pub use thunk::Thunk;

use crate::error::{Error, Result};
use crate::tensor::Tensor;

fn first_grad(grads: Vec<Tensor>) -> Result<Tensor> {
    grads
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidGradient("no gradient was produced".to_string()))
}

/// Gradient of a single-input function.
///
/// The returned closure computes `df/dx`, seeded with `dy` when given.
/// The value of `f(x)` is disposed.
pub fn grad<F>(f: F) -> impl Fn(&mut Engine, &Tensor, Option<&Tensor>) -> Result<Tensor>
where
    F: Fn(&mut Engine, &Tensor) -> Result<Tensor>,
{
    move |engine, x, dy| {
        engine.tidy("grad", |engine| {
            let result = engine.gradients(|e| f(e, x), std::slice::from_ref(x), dy)?;
            first_grad(result.grads)
        })
    }
}

/// Gradients of a multi-input function, one per input.
pub fn grads<F>(f: F) -> impl Fn(&mut Engine, &[Tensor], Option<&Tensor>) -> Result<Vec<Tensor>>
where
    F: Fn(&mut Engine, &[Tensor]) -> Result<Tensor>,
{
    move |engine, xs, dy| {
        engine.tidy("grads", |engine| {
            let result = engine.gradients(|e| f(e, xs), xs, dy)?;
            Ok(result.grads)
        })
    }
}

/// Like [`grad`], but also returns `f(x)`.
pub fn value_and_grad<F>(
    f: F,
) -> impl Fn(&mut Engine, &Tensor, Option<&Tensor>) -> Result<(Tensor, Tensor)>
where
    F: Fn(&mut Engine, &Tensor) -> Result<Tensor>,
{
    move |engine, x, dy| {
        engine.tidy("value_and_grad", |engine| {
            let result = engine.gradients(|e| f(e, x), std::slice::from_ref(x), dy)?;
            Ok((result.value, first_grad(result.grads)?))
        })
    }
}

/// Like [`grads`], but also returns `f(xs)`.
pub fn value_and_grads<F>(
    f: F,
) -> impl Fn(&mut Engine, &[Tensor], Option<&Tensor>) -> Result<Gradients>
where
    F: Fn(&mut Engine, &[Tensor]) -> Result<Tensor>,
{
    move |engine, xs, dy| {
        engine.tidy("value_and_grads", |engine| {
            engine.gradients(|e| f(e, xs), xs, dy)
        })
    }
}
