//! Kernel and gradient registry
//!
//! Maps a kernel name to its forward implementation and, optionally, to a
//! gradient config. The registry is owned by one [`Engine`](super::Engine)
//! and populated once at construction; there is no global state.

use super::Thunk;
use crate::config::CollisionPolicy;
use crate::error::{Error, Result};
use crate::tensor::{DType, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Named tensor inputs of one kernel invocation, in parameter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorMap(Vec<(String, Tensor)>);

impl TensorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, tensor: &Tensor) -> Self {
        self.insert(name, tensor);
        self
    }

    /// Insert or replace `name`.
    pub fn insert(&mut self, name: &str, tensor: &Tensor) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = tensor.clone(),
            None => self.0.push((name.to_string(), tensor.clone())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.0.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the entries accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Tensor) -> bool) {
        self.0.retain(|(n, t)| keep(n, t));
    }
}

/// A single kernel attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Ints(Vec<i64>),
    Str(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<usize> for AttrValue {
    fn from(v: usize) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<&[usize]> for AttrValue {
    fn from(v: &[usize]) -> Self {
        AttrValue::Ints(v.iter().map(|&x| x as i64).collect())
    }
}

impl From<DType> for AttrValue {
    fn from(v: DType) -> Self {
        AttrValue::Str(v.name().to_string())
    }
}

/// Named attributes of one kernel invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs(BTreeMap<String, AttrValue>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    fn require(&self, name: &str) -> Result<&AttrValue> {
        self.get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("Missing attribute '{name}'")))
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            AttrValue::Int(v) => Ok(*v),
            other => Err(wrong_attr(name, "an integer", other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            AttrValue::Float(v) => Ok(*v),
            AttrValue::Int(v) => Ok(*v as f64),
            other => Err(wrong_attr(name, "a number", other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            AttrValue::Bool(v) => Ok(*v),
            other => Err(wrong_attr(name, "a bool", other)),
        }
    }

    /// Integer list; a single integer is accepted as a one-element list.
    pub fn ints(&self, name: &str) -> Result<Vec<i64>> {
        match self.require(name)? {
            AttrValue::Ints(v) => Ok(v.clone()),
            AttrValue::Int(v) => Ok(vec![*v]),
            other => Err(wrong_attr(name, "an integer list", other)),
        }
    }

    /// Non-negative integer list.
    pub fn dims(&self, name: &str) -> Result<Vec<usize>> {
        self.ints(name)?
            .into_iter()
            .map(|v| {
                usize::try_from(v).map_err(|_| {
                    Error::InvalidArgument(format!(
                        "Attribute '{name}' must hold non-negative integers but got {v}"
                    ))
                })
            })
            .collect()
    }

    pub fn dtype(&self, name: &str) -> Result<DType> {
        match self.require(name)? {
            AttrValue::Str(s) => match s.as_str() {
                "float32" => Ok(DType::Float32),
                "int32" => Ok(DType::Int32),
                "bool" => Ok(DType::Bool),
                "complex64" => Ok(DType::Complex64),
                "string" => Ok(DType::String),
                _ => Err(Error::InvalidArgument(format!("Unknown dtype '{s}'"))),
            },
            other => Err(wrong_attr(name, "a dtype name", other)),
        }
    }
}

fn wrong_attr(name: &str, expected: &str, got: &AttrValue) -> Error {
    Error::InvalidArgument(format!(
        "Attribute '{name}' must be {expected} but got {got:?}"
    ))
}

/// Read-only view of one kernel input.
#[derive(Debug)]
pub struct KernelInput<'a> {
    pub name: &'a str,
    pub shape: &'a [usize],
    pub data: &'a TensorData,
}

impl KernelInput<'_> {
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }
}

/// Everything a forward kernel sees.
#[derive(Debug)]
pub struct KernelArgs<'a> {
    pub kernel_name: &'a str,
    pub inputs: Vec<KernelInput<'a>>,
    pub attrs: &'a Attrs,
}

impl<'a> KernelArgs<'a> {
    pub fn input(&self, name: &str) -> Result<&KernelInput<'a>> {
        self.inputs.iter().find(|i| i.name == name).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Kernel '{}' is missing input '{name}'",
                self.kernel_name
            ))
        })
    }

    pub fn optional(&self, name: &str) -> Option<&KernelInput<'a>> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn unsupported(&self, dtype: DType) -> Error {
        Error::UnsupportedDtype {
            kernel: self.kernel_name.to_string(),
            dtype,
        }
    }
}

/// One output produced by a forward kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelOutput {
    /// Freshly computed values.
    Values { data: TensorData, shape: Vec<usize> },
    /// Share the buffer of input `input` under a new shape.
    Alias { input: usize, shape: Vec<usize> },
}

impl KernelOutput {
    pub fn values(data: impl Into<TensorData>, shape: &[usize]) -> Self {
        KernelOutput::Values {
            data: data.into(),
            shape: shape.to_vec(),
        }
    }
}

pub type ForwardFn = fn(&KernelArgs<'_>) -> Result<Vec<KernelOutput>>;

#[derive(Clone)]
pub struct KernelConfig {
    pub kernel_name: String,
    pub forward: ForwardFn,
}

impl KernelConfig {
    pub fn new(kernel_name: &str, forward: ForwardFn) -> Self {
        Self {
            kernel_name: kernel_name.to_string(),
            forward,
        }
    }
}

/// What a gradient function receives.
#[derive(Debug, Clone)]
pub struct GradInputs {
    /// One upstream gradient per kernel output.
    pub dys: Vec<Tensor>,
    /// Saved inputs (in `inputs_to_save` order) followed by saved outputs.
    /// An optional input that was not supplied is `None`.
    pub saved: Vec<Option<Tensor>>,
    pub attrs: Attrs,
}

impl GradInputs {
    pub fn dy(&self) -> Result<Tensor> {
        self.dys
            .first()
            .cloned()
            .ok_or_else(|| Error::InvalidGradient("no upstream gradient".to_string()))
    }

    pub fn saved(&self, index: usize) -> Result<Tensor> {
        self.saved_opt(index).ok_or_else(|| {
            Error::InvalidGradient(format!("saved tensor {index} was not recorded"))
        })
    }

    pub fn saved_opt(&self, index: usize) -> Option<Tensor> {
        self.saved.get(index).cloned().flatten()
    }
}

/// Lazy gradient per input name.
pub type GradMap = BTreeMap<String, Thunk>;

pub type GradFunc = fn(&GradInputs) -> Result<GradMap>;

/// Backward rule of a kernel plus what it needs saved from the forward pass.
#[derive(Clone)]
pub struct GradConfig {
    pub kernel_name: String,
    pub inputs_to_save: Vec<String>,
    pub save_all_inputs: bool,
    pub outputs_to_save: Vec<bool>,
    pub grad_func: GradFunc,
}

impl fmt::Debug for KernelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelConfig")
            .field("kernel_name", &self.kernel_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for GradConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradConfig")
            .field("kernel_name", &self.kernel_name)
            .field("inputs_to_save", &self.inputs_to_save)
            .field("save_all_inputs", &self.save_all_inputs)
            .field("outputs_to_save", &self.outputs_to_save)
            .finish_non_exhaustive()
    }
}

impl GradConfig {
    pub fn new(kernel_name: &str, grad_func: GradFunc) -> Self {
        Self {
            kernel_name: kernel_name.to_string(),
            inputs_to_save: Vec::new(),
            save_all_inputs: false,
            outputs_to_save: Vec::new(),
            grad_func,
        }
    }

    pub fn save_inputs(mut self, names: &[&str]) -> Self {
        self.inputs_to_save = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn save_all_inputs(mut self) -> Self {
        self.save_all_inputs = true;
        self
    }

    pub fn save_outputs(mut self, mask: &[bool]) -> Self {
        self.outputs_to_save = mask.to_vec();
        self
    }
}

/// Name → behavior lookup for kernels and their gradients.
#[derive(Debug)]
pub struct KernelRegistry {
    kernels: HashMap<String, KernelConfig>,
    gradients: HashMap<String, GradConfig>,
    policy: CollisionPolicy,
}

impl KernelRegistry {
    /// Empty registry.
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            kernels: HashMap::new(),
            gradients: HashMap::new(),
            policy,
        }
    }

    /// Registry holding every built-in kernel, then every built-in gradient.
    pub fn with_builtins(policy: CollisionPolicy) -> Self {
        let mut registry = Self::new(policy);
        crate::kernels::register_all(&mut registry);
        crate::gradients::register_all(&mut registry);
        registry
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub fn register_kernel(&mut self, config: KernelConfig) -> Result<()> {
        if self.kernels.contains_key(&config.kernel_name) {
            match self.policy {
                CollisionPolicy::Error => {
                    return Err(Error::KernelAlreadyRegistered(config.kernel_name))
                }
                CollisionPolicy::Overwrite => {
                    warn!(kernel = %config.kernel_name, "overwriting registered kernel");
                }
            }
        }
        self.insert_kernel(config);
        Ok(())
    }

    pub fn register_gradient(&mut self, config: GradConfig) -> Result<()> {
        if self.gradients.contains_key(&config.kernel_name) {
            match self.policy {
                CollisionPolicy::Error => {
                    return Err(Error::GradientAlreadyRegistered(config.kernel_name))
                }
                CollisionPolicy::Overwrite => {
                    warn!(kernel = %config.kernel_name, "overwriting registered gradient");
                }
            }
        }
        self.insert_gradient(config);
        Ok(())
    }

    pub(crate) fn insert_kernel(&mut self, config: KernelConfig) {
        debug!(kernel = %config.kernel_name, "register kernel");
        self.kernels.insert(config.kernel_name.clone(), config);
    }

    pub(crate) fn insert_gradient(&mut self, config: GradConfig) {
        debug!(kernel = %config.kernel_name, "register gradient");
        self.gradients.insert(config.kernel_name.clone(), config);
    }

    pub fn unregister_kernel(&mut self, name: &str) -> Option<KernelConfig> {
        self.kernels.remove(name)
    }

    pub fn unregister_gradient(&mut self, name: &str) -> Option<GradConfig> {
        self.gradients.remove(name)
    }

    pub fn kernel(&self, name: &str) -> Result<&KernelConfig> {
        self.kernels
            .get(name)
            .ok_or_else(|| Error::UnknownKernel(name.to_string()))
    }

    pub fn gradient(&self, name: &str) -> Option<&GradConfig> {
        self.gradients.get(name)
    }

    pub fn has_kernel(&self, name: &str) -> bool {
        self.kernels.contains_key(name)
    }

    /// Sorted names of every registered kernel.
    pub fn kernel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kernels.keys().cloned().collect();
        names.sort();
        names
    }
}
