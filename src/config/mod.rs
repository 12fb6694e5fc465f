//! Declarative YAML configuration
//!
//! # Example
//!
//! ```yaml
//! debug: true
//! kernel_collision: overwrite
//! test_epsilon: 0.001
//! ```
//!
//! Every field is optional and falls back to [`EngineConfig::default`].

mod load;
mod schema;
mod validate;

#[cfg(test)]
mod tests;

pub use load::load_config;
pub use schema::{CollisionPolicy, EngineConfig};
pub use validate::{validate_config, ValidationError};
