//! Execution engine
//!
//! Owns the kernel registry, the buffer store, the tidy scope stack and the
//! active gradient tapes. Every tensor is created through an engine, and
//! only the engine touches buffer reference counts.

use super::backward::{backpropagate, filter_nodes_x_to_y};
use super::registry::{Attrs, KernelArgs, KernelInput, KernelOutput, KernelRegistry, TensorMap};
use super::scope::{Scope, TensorContainer};
use super::store::DataStore;
use super::tape::Tape;
use crate::config::{validate_config, EngineConfig};
use crate::error::{Error, Result};
use crate::ops;
use crate::shape::size_from_shape;
use crate::tensor::{DType, DataId, Tensor, TensorBuffer, TensorData, TensorId};
use futures::future::{ready, Ready};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Snapshot of what the engine currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryInfo {
    pub num_tensors: usize,
    pub num_data_buffers: usize,
    pub num_bytes: usize,
}

/// Result of a gradient computation.
#[derive(Debug, Clone)]
pub struct Gradients {
    /// `y = f(xs)`
    pub value: Tensor,
    /// One gradient per requested `x`, in request order.
    pub grads: Vec<Tensor>,
}

impl TensorContainer for Gradients {
    fn collect_ids(&self, out: &mut Vec<TensorId>) {
        out.push(self.value.id());
        self.grads.collect_ids(out);
    }
}

pub struct Engine {
    registry: KernelRegistry,
    config: EngineConfig,
    store: DataStore,
    live: HashMap<TensorId, DataId>,
    next_tensor_id: TensorId,
    scopes: Vec<Scope>,
    kept: HashSet<TensorId>,
    tapes: Vec<Tape>,
    recording_paused: usize,
}

impl Engine {
    /// Engine with the default configuration and every built-in kernel.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        validate_config(&config).map_err(|e| Error::ConfigError(format!("Invalid config: {}", e)))?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            registry: KernelRegistry::with_builtins(config.kernel_collision),
            config,
            store: DataStore::new(),
            live: HashMap::new(),
            next_tensor_id: 0,
            scopes: Vec::new(),
            kept: HashSet::new(),
            tapes: Vec::new(),
            recording_paused: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut KernelRegistry {
        &mut self.registry
    }

    /// Store `values` as a new tensor of `shape`.
    pub fn make_tensor(&mut self, values: TensorData, shape: &[usize]) -> Result<Tensor> {
        let size = size_from_shape(shape);
        if values.len() != size {
            return Err(Error::ShapeMismatch {
                expected: vec![size],
                got: vec![values.len()],
            });
        }
        let dtype = values.dtype();
        let data_id = self.store.insert(values);
        Ok(self.new_handle(data_id, shape.to_vec(), dtype))
    }

    fn new_handle(&mut self, data_id: DataId, shape: Vec<usize>, dtype: DType) -> Tensor {
        let id = self.next_tensor_id;
        self.next_tensor_id += 1;
        self.live.insert(id, data_id);
        if let Some(scope) = self.scopes.last_mut() {
            scope.tracked.push(id);
        }
        Tensor::new(id, data_id, shape, dtype)
    }

    fn ensure_live(&self, tensor: &Tensor) -> Result<()> {
        if self.live.contains_key(&tensor.id()) {
            Ok(())
        } else {
            Err(Error::TensorDisposed { id: tensor.id() })
        }
    }

    /// Run a registered kernel, recording it on the innermost tape.
    pub fn run_kernel(
        &mut self,
        kernel_name: &str,
        inputs: &TensorMap,
        attrs: &Attrs,
    ) -> Result<Vec<Tensor>> {
        let forward = self.registry.kernel(kernel_name)?.forward;
        for (_, tensor) in inputs.iter() {
            self.ensure_live(tensor)?;
        }

        let outputs = {
            let mut views = Vec::with_capacity(inputs.len());
            for (name, tensor) in inputs.iter() {
                let data = self
                    .store
                    .get(tensor.data_id())
                    .ok_or(Error::TensorDisposed { id: tensor.id() })?;
                views.push(KernelInput {
                    name,
                    shape: tensor.shape(),
                    data,
                });
            }
            let args = KernelArgs {
                kernel_name,
                inputs: views,
                attrs,
            };
            forward(&args)?
        };

        let sources: Vec<&Tensor> = inputs.iter().map(|(_, t)| t).collect();
        let mut results = Vec::with_capacity(outputs.len());
        for output in outputs {
            let tensor = match output {
                KernelOutput::Values { data, shape } => {
                    if self.config.debug {
                        check_numerics(kernel_name, &data)?;
                    }
                    self.make_tensor(data, &shape)?
                }
                KernelOutput::Alias { input, shape } => {
                    let source = sources.get(input).copied().ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "Kernel '{kernel_name}' aliased missing input {input}"
                        ))
                    })?;
                    if size_from_shape(&shape) != source.size() {
                        return Err(Error::ShapeMismatch {
                            expected: source.shape().to_vec(),
                            got: shape,
                        });
                    }
                    self.store.inc_ref(source.data_id());
                    self.new_handle(source.data_id(), shape, source.dtype())
                }
            };
            results.push(tensor);
        }

        debug!(kernel = kernel_name, outputs = results.len(), "run kernel");
        self.record(kernel_name, inputs, &results, attrs)?;
        Ok(results)
    }

    /// Like [`Engine::run_kernel`] for kernels with exactly one output.
    pub fn run_kernel_single(
        &mut self,
        kernel_name: &str,
        inputs: &TensorMap,
        attrs: &Attrs,
    ) -> Result<Tensor> {
        self.run_kernel(kernel_name, inputs, attrs)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::InvalidArgument(format!("Kernel '{kernel_name}' produced no outputs"))
            })
    }

    pub fn is_recording(&self) -> bool {
        self.recording_paused == 0 && self.tapes.last().is_some_and(Tape::is_recording)
    }

    fn record(
        &mut self,
        kernel_name: &str,
        inputs: &TensorMap,
        outputs: &[Tensor],
        attrs: &Attrs,
    ) -> Result<()> {
        if !self.is_recording() {
            return Ok(());
        }

        let to_save: Vec<Option<Tensor>> = match self.registry.gradient(kernel_name) {
            Some(config) => {
                let mut to_save: Vec<Option<Tensor>> = if config.save_all_inputs {
                    inputs.iter().map(|(_, t)| Some(t.clone())).collect()
                } else {
                    config
                        .inputs_to_save
                        .iter()
                        .map(|name| inputs.get(name).cloned())
                        .collect()
                };
                to_save.extend(
                    outputs
                        .iter()
                        .zip(&config.outputs_to_save)
                        .filter(|(_, save)| **save)
                        .map(|(t, _)| Some(t.clone())),
                );
                to_save
            }
            None => Vec::new(),
        };

        let mut saved = Vec::with_capacity(to_save.len());
        for tensor in to_save {
            saved.push(match tensor {
                Some(t) => {
                    let copy = self.clone_tensor(&t)?;
                    Some(self.keep(&copy))
                }
                None => None,
            });
        }

        if let Some(tape) = self.tapes.last_mut() {
            let node = tape.record(
                kernel_name,
                inputs.clone(),
                outputs.to_vec(),
                saved,
                attrs.clone(),
            );
            debug!(kernel = kernel_name, node = ?node, "record tape node");
        }
        Ok(())
    }

    /// Run `f` in a new scope. Every tensor created inside that is neither
    /// returned nor kept is disposed when the scope exits, including when
    /// `f` fails.
    pub fn tidy<T, F>(&mut self, name: &str, f: F) -> Result<T>
    where
        T: TensorContainer,
        F: FnOnce(&mut Engine) -> Result<T>,
    {
        self.scopes.push(Scope::new(name));
        let result = f(self);

        let Some(scope) = self.scopes.pop() else {
            return result;
        };

        let returned: HashSet<TensorId> = match &result {
            Ok(value) => value.tensor_ids().into_iter().collect(),
            Err(_) => HashSet::new(),
        };

        let mut disposed = 0usize;
        let mut survivors = Vec::new();
        for id in scope.tracked {
            if returned.contains(&id) {
                survivors.push(id);
            } else if !self.kept.contains(&id) && self.dispose_id(id) {
                disposed += 1;
            }
        }

        if let Some(parent) = self.scopes.last_mut() {
            parent.tracked.extend(survivors);
        }

        debug!(scope = %scope.name, disposed, "end tidy scope");
        result
    }

    /// Exempt `tensor` from disposal by any tidy scope.
    pub fn keep(&mut self, tensor: &Tensor) -> Tensor {
        self.kept.insert(tensor.id());
        tensor.clone()
    }

    /// Release `tensor`. Disposing twice is a no-op.
    pub fn dispose(&mut self, tensor: &Tensor) {
        self.dispose_id(tensor.id());
    }

    pub fn dispose_all<T: TensorContainer>(&mut self, container: &T) {
        for id in container.tensor_ids() {
            self.dispose_id(id);
        }
    }

    fn dispose_id(&mut self, id: TensorId) -> bool {
        match self.live.remove(&id) {
            Some(data_id) => {
                self.kept.remove(&id);
                self.store.dec_ref(data_id);
                true
            }
            None => false,
        }
    }

    pub fn is_disposed(&self, tensor: &Tensor) -> bool {
        !self.live.contains_key(&tensor.id())
    }

    /// New handle sharing `tensor`'s buffer.
    pub fn clone_tensor(&mut self, tensor: &Tensor) -> Result<Tensor> {
        self.ensure_live(tensor)?;
        self.store.inc_ref(tensor.data_id());
        Ok(self.new_handle(
            tensor.data_id(),
            tensor.shape().to_vec(),
            tensor.dtype(),
        ))
    }

    /// Copy of the values behind `tensor`.
    pub fn read_sync(&self, tensor: &Tensor) -> Result<TensorData> {
        self.ensure_live(tensor)?;
        self.store
            .get(tensor.data_id())
            .cloned()
            .ok_or(Error::TensorDisposed { id: tensor.id() })
    }

    /// Asynchronous read-out. All computation is synchronous, so the
    /// future is already resolved.
    pub fn data(&self, tensor: &Tensor) -> Ready<Result<TensorData>> {
        ready(self.read_sync(tensor))
    }

    /// Mutable copy of `tensor` as a [`TensorBuffer`].
    pub fn buffer(&self, tensor: &Tensor) -> Result<TensorBuffer> {
        TensorBuffer::from_values(tensor.shape(), self.read_sync(tensor)?)
    }

    pub fn memory(&self) -> MemoryInfo {
        MemoryInfo {
            num_tensors: self.live.len(),
            num_data_buffers: self.store.len(),
            num_bytes: self.store.num_bytes(),
        }
    }

    /// Reference count of the buffer behind `tensor`.
    pub fn ref_count(&self, tensor: &Tensor) -> usize {
        self.store.ref_count(tensor.data_id())
    }

    /// Compute `y = f()` and the gradients of `y` with respect to `xs`.
    ///
    /// `dy` seeds the backward pass and must have `y`'s shape; it defaults
    /// to ones. An `x` that `y` does not depend on gets a zero gradient,
    /// but at least one `x` must be connected to `y`.
    pub fn gradients<F>(&mut self, f: F, xs: &[Tensor], dy: Option<&Tensor>) -> Result<Gradients>
    where
        F: FnOnce(&mut Engine) -> Result<Tensor>,
    {
        if xs.is_empty() {
            return Err(Error::InvalidArgument(
                "gradients() received an empty list of xs.".to_string(),
            ));
        }
        for x in xs {
            self.ensure_live(x)?;
        }

        self.tapes.push(Tape::new());
        let forward = self.tidy("gradients.forward", f);
        let Some(mut tape) = self.tapes.pop() else {
            return Err(Error::InvalidArgument("gradient tape stack is empty".to_string()));
        };
        tape.freeze();

        let outcome = match forward {
            Ok(y) => match self.backward(&tape, xs, &y, dy) {
                Ok(grads) => Ok(Gradients { value: y, grads }),
                Err(e) => {
                    self.dispose(&y);
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };

        for saved in tape.saved_tensors() {
            self.dispose(&saved);
        }
        tape.finish();

        if outcome.is_ok() {
            info!(nodes = tape.len(), xs = xs.len(), "computed gradients");
        }
        outcome
    }

    #[cfg(test)]
    pub(crate) fn start_tape(&mut self) {
        self.tapes.push(Tape::new());
    }

    #[cfg(test)]
    pub(crate) fn take_tape(&mut self) -> Option<Tape> {
        self.tapes.pop()
    }

    fn backward(
        &mut self,
        tape: &Tape,
        xs: &[Tensor],
        y: &Tensor,
        dy: Option<&Tensor>,
    ) -> Result<Vec<Tensor>> {
        if let Some(dy) = dy {
            self.ensure_live(dy)?;
            if dy.shape() != y.shape() {
                return Err(Error::ShapeMismatch {
                    expected: y.shape().to_vec(),
                    got: dy.shape().to_vec(),
                });
            }
        }

        let filtered = filter_nodes_x_to_y(tape.nodes(), xs, y);
        if filtered.is_empty() {
            return Err(Error::NoGradientPath);
        }

        self.recording_paused += 1;
        let grads = self.tidy("gradients.backward", |engine| {
            let seed = match dy {
                Some(dy) => dy.clone(),
                None => ops::ones(engine, y.shape(), DType::Float32)?,
            };
            let mut accumulated = HashMap::from([(y.id(), seed)]);
            backpropagate(engine, &mut accumulated, &filtered)?;

            xs.iter()
                .map(|x| match accumulated.get(&x.id()) {
                    Some(grad) => engine.clone_tensor(grad),
                    None => ops::zeros(engine, x.shape(), DType::Float32),
                })
                .collect::<Result<Vec<_>>>()
        });
        self.recording_paused -= 1;
        grads
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("memory", &self.memory())
            .field("scopes", &self.scopes.len())
            .field("tapes", &self.tapes.len())
            .field("config", &self.config)
            .finish()
    }
}

fn check_numerics(kernel_name: &str, data: &TensorData) -> Result<()> {
    let has_nan = match data {
        TensorData::Float32(v) | TensorData::Complex64(v) => v.iter().any(|x| x.is_nan()),
        _ => false,
    };
    if has_nan {
        return Err(Error::NumericError {
            kernel: kernel_name.to_string(),
        });
    }
    Ok(())
}
