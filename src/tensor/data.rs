//! Backing storage for tensor values

use super::DType;
use crate::error::{Error, Result};

/// Flat, row-major values of one tensor, one variant per dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float32(Vec<f32>),
    Int32(Vec<i32>),
    /// 0/1 per element
    Bool(Vec<u8>),
    /// Interleaved real/imaginary parts
    Complex64(Vec<f32>),
    /// `None` marks an unset cell
    String(Vec<Option<String>>),
}

impl TensorData {
    /// Zero-initialized storage holding `size` elements of `dtype`.
    pub fn zeros(dtype: DType, size: usize) -> Self {
        match dtype {
            DType::Float32 => TensorData::Float32(vec![0.0; size]),
            DType::Int32 => TensorData::Int32(vec![0; size]),
            DType::Bool => TensorData::Bool(vec![0; size]),
            DType::Complex64 => TensorData::Complex64(vec![0.0; size * 2]),
            DType::String => TensorData::String(vec![None; size]),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            TensorData::Float32(_) => DType::Float32,
            TensorData::Int32(_) => DType::Int32,
            TensorData::Bool(_) => DType::Bool,
            TensorData::Complex64(_) => DType::Complex64,
            TensorData::String(_) => DType::String,
        }
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        match self {
            TensorData::Float32(v) => v.len(),
            TensorData::Int32(v) => v.len(),
            TensorData::Bool(v) => v.len(),
            TensorData::Complex64(v) => v.len() / 2,
            TensorData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate heap footprint in bytes.
    pub fn byte_size(&self) -> usize {
        match self {
            TensorData::String(v) => v.iter().flatten().map(String::len).sum(),
            other => other.len() * other.dtype().bytes_per_element(),
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            TensorData::Float32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            TensorData::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[u8]> {
        match self {
            TensorData::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match self {
            TensorData::String(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric values widened to `f32`.
    ///
    /// Fails for complex and string storage.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>> {
        match self {
            TensorData::Float32(v) => Ok(v.clone()),
            TensorData::Int32(v) => Ok(v.iter().map(|&x| x as f32).collect()),
            TensorData::Bool(v) => Ok(v.iter().map(|&x| x as f32).collect()),
            TensorData::Complex64(_) | TensorData::String(_) => Err(Error::InvalidArgument(
                format!("Cannot convert {} values to float32", self.dtype()),
            )),
        }
    }

    /// Build new storage by picking `(source, flat index)` pairs out of
    /// `sources`, which must all share one dtype.
    pub fn gather_from(sources: &[&TensorData], picks: &[(usize, usize)]) -> Result<TensorData> {
        let Some(first) = sources.first() else {
            return Err(Error::InvalidArgument("gather needs at least one source".to_string()));
        };
        let dtype = first.dtype();
        if let Some(other) = sources.iter().find(|s| s.dtype() != dtype) {
            return Err(Error::DtypeMismatch {
                x: dtype,
                y: other.dtype(),
            });
        }

        let mut out = TensorData::zeros(dtype, picks.len());
        for (i, &(source, index)) in picks.iter().enumerate() {
            let value = sources
                .get(source)
                .and_then(|s| s.get(index))
                .ok_or_else(|| Error::IndexOutOfRange {
                    indices: vec![index],
                    shape: vec![sources.get(source).map_or(0, |s| s.len())],
                })?;
            out.set(i, value)?;
        }
        Ok(out)
    }

    /// Read the element at flat `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            TensorData::Float32(v) => v.get(index).map(|&x| Value::Float(x)),
            TensorData::Int32(v) => v.get(index).map(|&x| Value::Int(x)),
            TensorData::Bool(v) => v.get(index).map(|&x| Value::Bool(x != 0)),
            TensorData::Complex64(v) => {
                let re = v.get(index * 2)?;
                let im = v.get(index * 2 + 1)?;
                Some(Value::Complex(*re, *im))
            }
            TensorData::String(v) => v.get(index).map(|s| Value::Str(s.clone())),
        }
    }

    /// Write `value` at flat `index`, converting it to this storage's dtype.
    ///
    /// Floats written into int32 storage are truncated toward zero.
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let dtype = self.dtype();
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange {
                indices: vec![index],
                shape: vec![len],
            });
        }

        match self {
            TensorData::Float32(v) => v[index] = value.to_f32(dtype)?,
            TensorData::Int32(v) => v[index] = value.to_f32(dtype)? as i32,
            TensorData::Bool(v) => v[index] = u8::from(value.to_f32(dtype)? != 0.0),
            TensorData::Complex64(v) => {
                let (re, im) = match value {
                    Value::Complex(re, im) => (re, im),
                    other => (other.to_f32(dtype)?, 0.0),
                };
                v[index * 2] = re;
                v[index * 2 + 1] = im;
            }
            TensorData::String(v) => match value {
                Value::Str(s) => v[index] = s,
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "Cannot store {other:?} in a string tensor"
                    )))
                }
            },
        }
        Ok(())
    }
}

impl From<Vec<f32>> for TensorData {
    fn from(values: Vec<f32>) -> Self {
        TensorData::Float32(values)
    }
}

impl From<Vec<i32>> for TensorData {
    fn from(values: Vec<i32>) -> Self {
        TensorData::Int32(values)
    }
}

impl From<Vec<bool>> for TensorData {
    fn from(values: Vec<bool>) -> Self {
        TensorData::Bool(values.into_iter().map(u8::from).collect())
    }
}

impl From<Vec<&str>> for TensorData {
    fn from(values: Vec<&str>) -> Self {
        TensorData::String(values.into_iter().map(|s| Some(s.to_string())).collect())
    }
}

/// A single element read from or written to a buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    Complex(f32, f32),
    Str(Option<String>),
}

impl Value {
    fn to_f32(&self, target: DType) -> Result<f32> {
        match self {
            Value::Float(x) => Ok(*x),
            Value::Int(x) => Ok(*x as f32),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Complex(re, _) => Ok(*re),
            Value::Str(_) => Err(Error::InvalidArgument(format!(
                "Cannot store a string in a {target} tensor"
            ))),
        }
    }

    /// Numeric view of this value; `None` for strings.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Str(_) => None,
            other => other.to_f32(DType::Float32).ok(),
        }
    }

    /// Truthiness: non-zero numbers, `true`, and set strings are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Float(x) => *x != 0.0,
            Value::Int(x) => *x != 0,
            Value::Bool(b) => *b,
            Value::Complex(re, im) => *re != 0.0 || *im != 0.0,
            Value::Str(s) => s.as_deref().is_some_and(|s| !s.is_empty()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => s.as_deref(),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x)
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Int(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Some(s.to_string()))
    }
}
