//! # tensorgrad: tape-based automatic differentiation
//!
//! An execution engine that dispatches named kernels through a registry,
//! records them on a gradient tape, and walks the tape backward to
//! accumulate gradients. Tensor buffers are reference counted and tidy
//! scopes release temporaries automatically.
//!
//! ## Architecture
//!
//! - **shape**: Shape, stride and broadcast arithmetic
//! - **tensor**: Tensor handles, dtypes and the mutable `TensorBuffer`
//! - **autograd**: Kernel registry, execution engine, tape and backward pass
//! - **kernels**: Built-in CPU kernels
//! - **gradients**: Gradient configs for the built-in kernels
//! - **ops**: Tensor construction and op functions
//! - **io**: Progress monitoring over batches of futures
//! - **config**: Declarative YAML engine configuration
//! - **logging**: Tracing subscriber setup
//! - **test_util**: Array comparison helpers
//!
//! ## Example
//!
//! ```
//! use tensorgrad::{autograd, ops, Engine};
//!
//! let mut engine = Engine::new();
//! let x = ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0], &[3]).unwrap();
//!
//! // d/dx sum(x^2) = 2x
//! let df = autograd::grad(|e, x| {
//!     let squared = ops::square(e, x)?;
//!     ops::sum(e, &squared, &[], false)
//! });
//! let dx = df(&mut engine, &x, None).unwrap();
//!
//! assert_eq!(engine.read_sync(&dx).unwrap().as_f32(), Some(&[2.0, 4.0, 6.0][..]));
//! ```

pub mod autograd;
pub mod config;
mod gradients;
pub mod io;
pub mod kernels;
pub mod logging;
pub mod ops;
pub mod shape;
pub mod tensor;
pub mod test_util;

pub mod error;

// Re-export commonly used types
pub use autograd::{Engine, Gradients, MemoryInfo};
pub use error::{Error, Result};
pub use tensor::{DType, Tensor, TensorBuffer, TensorData, Value};
