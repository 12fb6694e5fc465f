//! Reverse-mode traversal of a recorded tape

use super::registry::GradInputs;
use super::tape::TapeNode;
use super::Engine;
use crate::error::{Error, Result};
use crate::ops;
use crate::shape::{assert_and_get_broadcast_shape, get_reduction_axes, size_from_shape};
use crate::tensor::{DType, Tensor, TensorId};
use std::collections::{HashMap, HashSet};
use tracing::debug_span;

/// Keep only the nodes that lie on a path from `xs` to `y`.
///
/// Each kept node's inputs are pruned to those reachable from `xs`, so the
/// backward pass never computes gradients nobody asked for.
pub fn filter_nodes_x_to_y(tape: &[TapeNode], xs: &[Tensor], y: &Tensor) -> Vec<TapeNode> {
    let mut tensors_from_x: HashSet<TensorId> = xs.iter().map(Tensor::id).collect();
    let mut nodes_from_x: HashSet<usize> = HashSet::new();

    for node in tape {
        if node
            .inputs
            .iter()
            .any(|(_, input)| tensors_from_x.contains(&input.id()))
        {
            tensors_from_x.extend(node.outputs.iter().map(Tensor::id));
            nodes_from_x.insert(node.id);
        }
    }

    let mut tensors_lead_to_y: HashSet<TensorId> = HashSet::from([y.id()]);
    let mut nodes_to_y: HashSet<usize> = HashSet::new();

    for node in tape.iter().rev() {
        if node
            .outputs
            .iter()
            .any(|output| tensors_lead_to_y.contains(&output.id()))
        {
            tensors_lead_to_y.extend(node.inputs.iter().map(|(_, input)| input.id()));
            nodes_to_y.insert(node.id);
        }
    }

    tape.iter()
        .filter(|node| nodes_from_x.contains(&node.id) && nodes_to_y.contains(&node.id))
        .map(|node| {
            let mut pruned = node.clone();
            pruned
                .inputs
                .retain(|_, input| tensors_from_x.contains(&input.id()));
            pruned
        })
        .collect()
}

/// Walk `nodes` in reverse, accumulating gradients into `accumulated`.
///
/// `accumulated` must already hold the seed gradient of `y`.
pub fn backpropagate(
    engine: &mut Engine,
    accumulated: &mut HashMap<TensorId, Tensor>,
    nodes: &[TapeNode],
) -> Result<()> {
    for node in nodes.iter().rev() {
        let _span = debug_span!("backprop", kernel = %node.kernel_name, node = node.id).entered();

        if node
            .outputs
            .iter()
            .all(|output| !accumulated.contains_key(&output.id()))
        {
            continue;
        }

        let grad_func = engine
            .registry()
            .gradient(&node.kernel_name)
            .map(|config| config.grad_func)
            .ok_or_else(|| Error::MissingGradient(node.kernel_name.clone()))?;

        let mut dys = Vec::with_capacity(node.outputs.len());
        for output in &node.outputs {
            dys.push(match accumulated.get(&output.id()) {
                Some(grad) => grad.clone(),
                None => ops::zeros(engine, output.shape(), DType::Float32)?,
            });
        }

        let mut input_grads = grad_func(&GradInputs {
            dys,
            saved: node.saved.clone(),
            attrs: node.attrs.clone(),
        })?;

        for (name, input) in node.inputs.iter() {
            let available: Vec<String> = input_grads.keys().cloned().collect();
            let thunk = input_grads
                .get_mut(name)
                .ok_or_else(|| Error::MissingInputGradient {
                    kernel: node.kernel_name.clone(),
                    input: name.to_string(),
                    available,
                })?;

            let dx = engine.tidy("backprop.input", |engine| thunk.force(engine))?;
            if dx.dtype() != DType::Float32 {
                return Err(Error::InvalidGradient(format!(
                    "Error in gradient for op {}. The gradient of input {} must have 'float32' dtype, but has '{}'",
                    node.kernel_name,
                    name,
                    dx.dtype()
                )));
            }

            let dx = reduce_to_shape(engine, &node.kernel_name, name, dx, input.shape())?;
            let next = match accumulated.get(&input.id()) {
                Some(current) => ops::add(engine, current, &dx)?,
                None => dx,
            };
            accumulated.insert(input.id(), next);
        }
    }
    Ok(())
}

/// Collapse a broadcast gradient back onto its input's shape.
///
/// Sums over the broadcast axes, then reshapes. A gradient whose shape is
/// not a broadcast of `shape` is rejected.
pub fn reduce_to_shape(
    engine: &mut Engine,
    kernel_name: &str,
    input_name: &str,
    dx: Tensor,
    shape: &[usize],
) -> Result<Tensor> {
    if dx.shape() == shape {
        return Ok(dx);
    }

    let mismatch = || Error::GradientShapeMismatch {
        kernel: kernel_name.to_string(),
        input: input_name.to_string(),
        expected: shape.to_vec(),
        got: dx.shape().to_vec(),
    };

    match assert_and_get_broadcast_shape(shape, dx.shape()) {
        Ok(broadcast) if broadcast == dx.shape() => {}
        _ => return Err(mismatch()),
    }

    // Broadcast against an empty axis: nothing flowed back.
    if dx.size() == 0 {
        return ops::zeros(engine, shape, DType::Float32);
    }

    let axes: Vec<i64> = get_reduction_axes(shape, dx.shape())
        .into_iter()
        .map(|axis| axis as i64)
        .collect();
    let summed = if axes.is_empty() {
        dx.clone()
    } else {
        ops::sum(engine, &dx, &axes, false)?
    };

    if summed.size() != size_from_shape(shape) {
        return Err(mismatch());
    }
    ops::reshape(engine, &summed, shape)
}
