//! Element types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float32,
    Int32,
    Bool,
    Complex64,
    String,
}

impl DType {
    /// Canonical lowercase name (`float32`, `int32`, ...).
    pub fn name(self) -> &'static str {
        match self {
            DType::Float32 => "float32",
            DType::Int32 => "int32",
            DType::Bool => "bool",
            DType::Complex64 => "complex64",
            DType::String => "string",
        }
    }

    /// Bytes per logical element; strings are accounted per character.
    pub fn bytes_per_element(self) -> usize {
        match self {
            DType::Float32 | DType::Int32 => 4,
            DType::Bool => 1,
            DType::Complex64 => 8,
            DType::String => 0,
        }
    }

    /// Whether arithmetic kernels can consume this dtype.
    pub fn is_numeric(self) -> bool {
        match self {
            DType::Float32 | DType::Int32 | DType::Bool => true,
            DType::Complex64 | DType::String => false,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
