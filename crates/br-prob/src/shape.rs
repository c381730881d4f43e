//! Shape and broadcast utilities for canonical tensors.
//!
//! Probability laws expect either a single batch axis or plain elementwise
//! broadcasting. Distributions in this crate speak the richer
//! `(samples, datapoints, *event)` layout instead, so every call crosses this
//! module twice: once to align parameters (and data) before the law runs, and
//! once to restore the canonical layout afterwards.
//!
//! All functions are pure: inputs are borrowed, outputs are freshly owned.

use br_core::{Error, Result, SampleShape, Tensor, TensorMap};
use ndarray::{Axis, IxDyn};

/// Reshape `tensor` into `shape`, reading elements in row-major order.
pub fn reshape(tensor: &Tensor, shape: &[usize]) -> Result<Tensor> {
    let n: usize = shape.iter().product();
    if n != tensor.len() {
        return Err(Error::Shape(format!(
            "cannot reshape tensor of shape {:?} ({} elements) into {:?}",
            tensor.shape(),
            tensor.len(),
            shape
        )));
    }
    Ok(Tensor::from_shape_vec(IxDyn(shape), tensor.iter().copied().collect())?)
}

/// Insert a size-1 axis at position `axis`.
pub fn unsqueeze(tensor: Tensor, axis: usize) -> Result<Tensor> {
    if axis > tensor.ndim() {
        return Err(Error::Shape(format!(
            "cannot insert axis {} into tensor of rank {}",
            axis,
            tensor.ndim()
        )));
    }
    Ok(tensor.insert_axis(Axis(axis)))
}

/// Common shape of `shapes` under right-aligned elementwise broadcasting.
pub fn broadcast_shape(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let rank = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; rank];
    for shape in shapes {
        let offset = rank - shape.len();
        for (i, &dim) in shape.iter().enumerate() {
            let slot = &mut out[offset + i];
            if *slot == 1 {
                *slot = dim;
            } else if dim != 1 && dim != *slot {
                return Err(Error::Shape(format!(
                    "shapes {:?} cannot be broadcast together (axis {} has sizes {} and {})",
                    shapes,
                    offset + i,
                    *slot,
                    dim
                )));
            }
        }
    }
    Ok(out)
}

/// Expand `tensor` to `shape`, copying broadcast values.
pub fn broadcast_to(tensor: &Tensor, shape: &[usize]) -> Result<Tensor> {
    tensor.broadcast(IxDyn(shape)).map(|view| view.to_owned()).ok_or_else(|| {
        Error::Shape(format!("tensor of shape {:?} cannot be broadcast to {:?}", tensor.shape(), shape))
    })
}

/// Pad every tensor whose rank is exactly one below the maximum rank with a
/// trailing size-1 axis.
///
/// Tensors short by more than one axis are returned unchanged; the caller is
/// responsible for shaping them.
pub fn uniform_shapes(tensors: &[Tensor]) -> Vec<Tensor> {
    let max_rank = tensors.iter().map(|t| t.ndim()).max().unwrap_or(0);
    tensors
        .iter()
        .map(|t| {
            if t.ndim() + 1 == max_rank {
                t.clone().insert_axis(Axis(t.ndim()))
            } else {
                if t.ndim() + 1 < max_rank {
                    log::warn!(
                        "uniform_shapes: tensor of shape {:?} is {} axes short of rank {}; left unpadded",
                        t.shape(),
                        max_rank - t.ndim(),
                        max_rank
                    );
                }
                t.clone()
            }
        })
        .collect()
}

fn event_size(tensor: &Tensor) -> usize {
    tensor.shape().iter().skip(2).product()
}

/// Broadcast every tensor to one common shape.
///
/// When all tensors carry a single-element event, their trailing axes are
/// first collapsed to the canonical scalar-event shape `(*, *, 1, 1)`.
pub fn broadcast_and_squeeze(tensors: &[Tensor]) -> Result<Vec<Tensor>> {
    let squeezed: Vec<Tensor> = if tensors.iter().all(|t| event_size(t) == 1) {
        tensors
            .iter()
            .map(|t| {
                let mut shape: Vec<usize> = t.shape().iter().take(2).copied().collect();
                shape.extend([1, 1]);
                reshape(t, &shape)
            })
            .collect::<Result<_>>()?
    } else {
        tensors.to_vec()
    };

    let uniformed = uniform_shapes(&squeezed);
    let shapes: Vec<&[usize]> = uniformed.iter().map(|t| t.shape()).collect();
    let target = broadcast_shape(&shapes)?;
    uniformed.iter().map(|t| broadcast_to(t, &target)).collect()
}

/// [`broadcast_and_squeeze`] over positional tensors and named tensors at
/// once, returning both groups in their original association.
pub fn broadcast_and_squeeze_mixed(
    positional: &[Tensor],
    named: &TensorMap,
) -> Result<(Vec<Tensor>, TensorMap)> {
    let mut all: Vec<Tensor> = Vec::with_capacity(positional.len() + named.len());
    all.extend(positional.iter().cloned());
    all.extend(named.values().cloned());

    let mut broadcasted = broadcast_and_squeeze(&all)?.into_iter();
    let positional_out: Vec<Tensor> = broadcasted.by_ref().take(positional.len()).collect();
    let named_out: TensorMap = named.keys().cloned().zip(broadcasted).collect();
    Ok((positional_out, named_out))
}

/// Broadcast only the sample and datapoint axes (0 and 1) to their maximum
/// sizes, leaving event axes untouched.
pub fn partial_broadcast(tensors: &[Tensor]) -> Result<Vec<Tensor>> {
    for t in tensors {
        if t.ndim() < 2 {
            return Err(Error::Shape(format!(
                "partial broadcast needs (samples, datapoints, ...) tensors, got shape {:?}",
                t.shape()
            )));
        }
    }
    let s0 = tensors.iter().map(|t| t.shape()[0]).max().unwrap_or(1);
    let s1 = tensors.iter().map(|t| t.shape()[1]).max().unwrap_or(1);

    tensors
        .iter()
        .map(|t| {
            let (d0, d1) = (t.shape()[0], t.shape()[1]);
            if (d0 != 1 && d0 != s0) || (d1 != 1 && d1 != s1) {
                return Err(Error::Shape(format!(
                    "leading axes ({}, {}) of tensor {:?} cannot be broadcast to ({}, {})",
                    d0,
                    d1,
                    t.shape(),
                    s0,
                    s1
                )));
            }
            let mut target = vec![s0, s1];
            target.extend_from_slice(&t.shape()[2..]);
            broadcast_to(t, &target)
        })
        .collect()
}

/// Partial-broadcast `tensors` and fold axes 0 and 1 into one batch axis of
/// size `samples * datapoints`.
pub(crate) fn flatten_batch(tensors: &[Tensor]) -> Result<(Vec<Tensor>, SampleShape)> {
    let broadcasted = partial_broadcast(tensors)?;
    let first = broadcasted
        .first()
        .ok_or_else(|| Error::Validation("no tensors to broadcast".to_string()))?;
    let shape = SampleShape::new(first.shape()[0], first.shape()[1]);

    let flattened = broadcasted
        .iter()
        .map(|t| {
            let mut target = vec![shape.batch_size()];
            target.extend_from_slice(&t.shape()[2..]);
            reshape(t, &target)
        })
        .collect::<Result<Vec<_>>>()?;
    log::debug!(
        "flattened {} tensors to batch of {} ({} samples x {} datapoints)",
        flattened.len(),
        shape.batch_size(),
        shape.number_samples,
        shape.number_datapoints
    );
    Ok((flattened, shape))
}

/// Partial-broadcast a mapping of parent values and flatten their batch axes.
///
/// Each tensor goes from `(S, D, *event)` to `(S * D, *event)`. The recorded
/// [`SampleShape`] lets callers undo the flattening with [`reshape`].
pub fn broadcast_parent_values(values: &TensorMap) -> Result<(TensorMap, SampleShape)> {
    let tensors: Vec<Tensor> = values.values().cloned().collect();
    let (flattened, shape) = flatten_batch(&tensors)?;
    Ok((values.keys().cloned().zip(flattened).collect(), shape))
}

/// Sorted distinct values present in `tensor`.
pub fn tensor_range(tensor: &Tensor) -> Vec<f64> {
    let mut values: Vec<f64> = tensor.iter().copied().collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// Sum out every axis from `dim` onwards.
pub fn sum_from_dim(tensor: &Tensor, dim: usize) -> Tensor {
    let mut out = tensor.clone();
    for axis in (dim..tensor.ndim()).rev() {
        out = out.sum_axis(Axis(axis));
    }
    out
}

/// Sum out the event axes, leaving one value per (sample, datapoint).
pub fn sum_data_dimensions(tensor: &Tensor) -> Tensor {
    sum_from_dim(tensor, 2)
}

/// Diagonals of a batch of square matrices: `(S, D, M, M) -> (S, D, M)`.
pub fn get_diagonal(tensor: &Tensor) -> Result<Tensor> {
    let shape = tensor.shape();
    if shape.len() != 4 || shape[2] != shape[3] {
        return Err(Error::Shape(format!(
            "get_diagonal expects a (samples, datapoints, M, M) tensor, got {:?}",
            shape
        )));
    }
    let (s, d, m) = (shape[0], shape[1], shape[2]);
    let mut out = Tensor::zeros(IxDyn(&[s, d, m]));
    for i in 0..s {
        for j in 0..d {
            for k in 0..m {
                out[[i, j, k].as_slice()] = tensor[[i, j, k, k].as_slice()];
            }
        }
    }
    Ok(out)
}

/// Repeat `tensor` along axis 0 so that it holds `number_samples` samples.
pub fn tile_parameter(tensor: &Tensor, number_samples: usize) -> Result<Tensor> {
    let lead = tensor.shape().first().copied().ok_or_else(|| {
        Error::Shape("cannot tile a rank-0 tensor along the sample axis".to_string())
    })?;
    if lead == number_samples {
        return Ok(tensor.clone());
    }
    if lead == 1 {
        let mut target = tensor.shape().to_vec();
        target[0] = number_samples;
        return broadcast_to(tensor, &target);
    }
    Err(Error::Shape(format!(
        "parameter with {} samples cannot be broadcast to the required {} samples",
        lead, number_samples
    )))
}

/// Concatenate sample maps along axis 0, keeping only keys shared by all maps.
pub fn concatenate_samples(samples: &[TensorMap]) -> Result<TensorMap> {
    match samples {
        [] => Ok(TensorMap::new()),
        [single] => Ok(single.clone()),
        [first, rest @ ..] => {
            let mut out = TensorMap::new();
            for key in first.keys() {
                if !rest.iter().all(|m| m.contains_key(key)) {
                    continue;
                }
                let views: Vec<_> = samples.iter().map(|m| m[key].view()).collect();
                out.insert(key.clone(), ndarray::concatenate(Axis(0), &views)?);
            }
            Ok(out)
        }
    }
}
