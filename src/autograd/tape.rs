//! Gradient tape

use super::{Attrs, TensorMap};
use crate::tensor::Tensor;

/// Lifecycle of one tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeState {
    /// Forward kernels are appended as they run
    Recording,
    /// Frozen and being walked in reverse
    Traversing,
    Done,
}

/// One recorded forward kernel invocation.
#[derive(Debug, Clone)]
pub struct TapeNode {
    pub id: usize,
    pub kernel_name: String,
    /// Every tensor input. Only ids and shapes are read during backprop;
    /// the values live in `saved`.
    pub inputs: TensorMap,
    pub outputs: Vec<Tensor>,
    pub saved: Vec<Option<Tensor>>,
    pub attrs: Attrs,
}

#[derive(Debug)]
pub struct Tape {
    state: TapeState,
    nodes: Vec<TapeNode>,
    next_node_id: usize,
}

impl Tape {
    pub fn new() -> Self {
        Self {
            state: TapeState::Recording,
            nodes: Vec::new(),
            next_node_id: 0,
        }
    }

    pub fn state(&self) -> TapeState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == TapeState::Recording
    }

    /// Append a node, returning its id. Ignored unless recording.
    pub fn record(
        &mut self,
        kernel_name: &str,
        inputs: TensorMap,
        outputs: Vec<Tensor>,
        saved: Vec<Option<Tensor>>,
        attrs: Attrs,
    ) -> Option<usize> {
        if !self.is_recording() {
            return None;
        }
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.push(TapeNode {
            id,
            kernel_name: kernel_name.to_string(),
            inputs,
            outputs,
            saved,
            attrs,
        });
        Some(id)
    }

    /// Freeze the tape for the backward walk.
    pub fn freeze(&mut self) {
        self.state = TapeState::Traversing;
    }

    pub fn finish(&mut self) {
        self.state = TapeState::Done;
    }

    pub fn nodes(&self) -> &[TapeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every tensor saved for backward, for disposal once gradients are done.
    pub fn saved_tensors(&self) -> Vec<Tensor> {
        self.nodes
            .iter()
            .flat_map(|n| n.saved.iter().flatten().cloned())
            .collect()
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}
