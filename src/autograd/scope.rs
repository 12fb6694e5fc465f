//! Tidy scopes and the values they may return

use crate::tensor::{Tensor, TensorBuffer, TensorData, TensorId};

/// Anything a tidy scope can return. The tensors it reports survive the
/// scope and are handed to the enclosing one.
pub trait TensorContainer {
    fn collect_ids(&self, out: &mut Vec<TensorId>);

    fn tensor_ids(&self) -> Vec<TensorId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }
}

impl TensorContainer for Tensor {
    fn collect_ids(&self, out: &mut Vec<TensorId>) {
        out.push(self.id());
    }
}

impl TensorContainer for () {
    fn collect_ids(&self, _out: &mut Vec<TensorId>) {}
}

impl TensorContainer for f32 {
    fn collect_ids(&self, _out: &mut Vec<TensorId>) {}
}

impl TensorContainer for TensorData {
    fn collect_ids(&self, _out: &mut Vec<TensorId>) {}
}

impl TensorContainer for TensorBuffer {
    fn collect_ids(&self, _out: &mut Vec<TensorId>) {}
}

impl<T: TensorContainer> TensorContainer for Option<T> {
    fn collect_ids(&self, out: &mut Vec<TensorId>) {
        if let Some(inner) = self {
            inner.collect_ids(out);
        }
    }
}

impl<T: TensorContainer> TensorContainer for Vec<T> {
    fn collect_ids(&self, out: &mut Vec<TensorId>) {
        for item in self {
            item.collect_ids(out);
        }
    }
}

impl<A: TensorContainer, B: TensorContainer> TensorContainer for (A, B) {
    fn collect_ids(&self, out: &mut Vec<TensorId>) {
        self.0.collect_ids(out);
        self.1.collect_ids(out);
    }
}

impl<A: TensorContainer, B: TensorContainer, C: TensorContainer> TensorContainer for (A, B, C) {
    fn collect_ids(&self, out: &mut Vec<TensorId>) {
        self.0.collect_ids(out);
        self.1.collect_ids(out);
        self.2.collect_ids(out);
    }
}

/// Tensors created while one tidy scope was innermost.
#[derive(Debug)]
pub(crate) struct Scope {
    pub name: String,
    pub tracked: Vec<TensorId>,
}

impl Scope {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tracked: Vec::new(),
        }
    }
}
