//! Deferred gradient computations

use super::Engine;
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use std::fmt;

type Producer = Box<dyn FnOnce(&mut Engine) -> Result<Tensor>>;

/// A gradient that is only computed when the backward pass needs it.
///
/// Gradient functions hand back one thunk per input; the backward pass
/// forces only the thunks of inputs that lead back to the requested
/// tensors.
pub enum Thunk {
    Pending(Producer),
    Forced(Tensor),
    /// A previous `force` failed part way through
    Poisoned,
}

impl Thunk {
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce(&mut Engine) -> Result<Tensor> + 'static,
    {
        Thunk::Pending(Box::new(producer))
    }

    /// Run the producer once; later calls return the cached tensor.
    pub fn force(&mut self, engine: &mut Engine) -> Result<Tensor> {
        match std::mem::replace(self, Thunk::Poisoned) {
            Thunk::Pending(producer) => {
                let tensor = producer(engine)?;
                *self = Thunk::Forced(tensor.clone());
                Ok(tensor)
            }
            Thunk::Forced(tensor) => {
                *self = Thunk::Forced(tensor.clone());
                Ok(tensor)
            }
            Thunk::Poisoned => Err(Error::InvalidGradient(
                "gradient thunk failed on an earlier force".to_string(),
            )),
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, Thunk::Forced(_))
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thunk::Pending(_) => f.write_str("Thunk::Pending"),
            Thunk::Forced(t) => f.debug_tuple("Thunk::Forced").field(&t.id()).finish(),
            Thunk::Poisoned => f.write_str("Thunk::Poisoned"),
        }
    }
}
