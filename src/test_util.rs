//! Array comparison helpers for tests
//!
//! Typed storage ([`TensorData`]) and nested arrays (`ndarray::ArrayD<f64>`,
//! plain slices) can be compared with each other. Failures are returned as
//! [`Error::AssertionFailed`] with a message naming the first differing
//! element.

use crate::autograd::Engine;
use crate::error::{Error, Result};
use crate::tensor::{DType, Tensor, TensorData};
use ndarray::ArrayD;
use std::fmt;

/// Tolerance used when none is configured.
pub const DEFAULT_TEST_EPSILON: f64 = 1e-3;

/// One flattened element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Num(f64),
    Str(Option<String>),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Num(x) => write!(f, "{x}"),
            Element::Str(Some(s)) => f.write_str(s),
            Element::Str(None) => f.write_str("null"),
        }
    }
}

/// Something that can be compared element by element.
pub trait ArrayLike {
    /// Class name of typed storage; `None` for nested arrays.
    fn typed_class(&self) -> Option<&'static str>;

    /// Shape of a nested array; `None` for flat typed storage.
    fn nested_shape(&self) -> Option<Vec<usize>>;

    fn flat(&self) -> Vec<Element>;
}

impl ArrayLike for TensorData {
    fn typed_class(&self) -> Option<&'static str> {
        Some(match self.dtype() {
            DType::Float32 | DType::Complex64 => "Float32Array",
            DType::Int32 => "Int32Array",
            DType::Bool => "Uint8Array",
            DType::String => return None,
        })
    }

    fn nested_shape(&self) -> Option<Vec<usize>> {
        None
    }

    fn flat(&self) -> Vec<Element> {
        match self {
            TensorData::Float32(v) | TensorData::Complex64(v) => {
                v.iter().map(|&x| Element::Num(f64::from(x))).collect()
            }
            TensorData::Int32(v) => v.iter().map(|&x| Element::Num(f64::from(x))).collect(),
            TensorData::Bool(v) => v.iter().map(|&x| Element::Num(f64::from(x))).collect(),
            TensorData::String(v) => v.iter().cloned().map(Element::Str).collect(),
        }
    }
}

impl ArrayLike for ArrayD<f64> {
    fn typed_class(&self) -> Option<&'static str> {
        None
    }

    fn nested_shape(&self) -> Option<Vec<usize>> {
        Some(self.shape().to_vec())
    }

    fn flat(&self) -> Vec<Element> {
        self.iter().map(|&x| Element::Num(x)).collect()
    }
}

impl ArrayLike for [f32] {
    fn typed_class(&self) -> Option<&'static str> {
        None
    }

    fn nested_shape(&self) -> Option<Vec<usize>> {
        Some(vec![self.len()])
    }

    fn flat(&self) -> Vec<Element> {
        self.iter().map(|&x| Element::Num(f64::from(x))).collect()
    }
}

impl ArrayLike for [&str] {
    fn typed_class(&self) -> Option<&'static str> {
        None
    }

    fn nested_shape(&self) -> Option<Vec<usize>> {
        Some(vec![self.len()])
    }

    fn flat(&self) -> Vec<Element> {
        self.iter().map(|s| Element::Str(Some(s.to_string()))).collect()
    }
}

fn join(values: &[Element]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn join_dims(dims: &[usize]) -> String {
    dims.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn expect_arrays_predicate<A, B, P>(actual: &A, expected: &B, predicate: P) -> Result<()>
where
    A: ArrayLike + ?Sized,
    B: ArrayLike + ?Sized,
    P: Fn(&Element, &Element) -> bool,
{
    if let (Some(a), Some(b)) = (actual.typed_class(), expected.typed_class()) {
        if a != b {
            return Err(Error::AssertionFailed(format!(
                "Arrays are of different type. Actual: {a}. Expected: {b}"
            )));
        }
    }

    if let (Some(a), Some(b)) = (actual.nested_shape(), expected.nested_shape()) {
        if a != b {
            return Err(Error::AssertionFailed(format!(
                "Arrays have different shapes. Actual: [{}]. Expected: [{}]",
                join_dims(&a),
                join_dims(&b)
            )));
        }
    }

    let actual_flat = actual.flat();
    let expected_flat = expected.flat();
    if actual_flat.len() != expected_flat.len() {
        return Err(Error::AssertionFailed(format!(
            "Arrays have different lengths actual: {} vs expected: {}.\nActual:   {}.\nExpected: {}.",
            actual_flat.len(),
            expected_flat.len(),
            join(&actual_flat),
            join(&expected_flat)
        )));
    }

    for (i, (a, e)) in actual_flat.iter().zip(&expected_flat).enumerate() {
        if !predicate(a, e) {
            return Err(Error::AssertionFailed(format!(
                "Arrays differ: actual[{i}] = {a}, expected[{i}] = {e}.\nActual:   {}.\nExpected: {}.",
                join(&actual_flat),
                join(&expected_flat)
            )));
        }
    }
    Ok(())
}

/// Two infinities (of any sign) or two NaNs count as close; one NaN never
/// does.
fn are_close(a: &Element, e: &Element, epsilon: f64) -> bool {
    match (a, e) {
        (Element::Num(a), Element::Num(e)) => {
            if !a.is_finite() && !e.is_finite() {
                return true;
            }
            !(a.is_nan() || e.is_nan() || (a - e).abs() > epsilon)
        }
        (Element::Str(a), Element::Str(e)) => a == e,
        _ => false,
    }
}

/// Elementwise comparison within `epsilon`.
pub fn expect_arrays_close<A, B>(actual: &A, expected: &B, epsilon: f64) -> Result<()>
where
    A: ArrayLike + ?Sized,
    B: ArrayLike + ?Sized,
{
    expect_arrays_predicate(actual, expected, |a, e| are_close(a, e, epsilon))
}

/// Exact comparison; strings compare by value.
pub fn expect_arrays_equal<A, B>(actual: &A, expected: &B) -> Result<()>
where
    A: ArrayLike + ?Sized,
    B: ArrayLike + ?Sized,
{
    expect_arrays_predicate(actual, expected, |a, e| are_close(a, e, 0.0))
}

/// Compare a tensor's values using the engine's configured tolerance.
pub fn expect_tensor_close<B>(engine: &Engine, actual: &Tensor, expected: &B) -> Result<()>
where
    B: ArrayLike + ?Sized,
{
    let values = engine.read_sync(actual)?;
    expect_arrays_close(&values, expected, engine.config().test_epsilon)
}
