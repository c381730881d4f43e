//! Common data types for brancher
//!
//! Every tensor that reaches a distribution follows the canonical
//! `(samples, datapoints, *event_shape)` layout: axis 0 indexes Monte Carlo
//! draws, axis 1 indexes i.i.d. datapoints, and the remaining axes describe a
//! single event (none for scalars, one for vectors, two for matrices).

use std::collections::BTreeMap;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Dynamic-rank floating tensor in canonical layout.
pub type Tensor = ArrayD<f64>;

/// Named tensors, ordered by name.
pub type TensorMap = BTreeMap<String, Tensor>;

/// Parameter mapping handed to a distribution at call time.
pub type Parameters = BTreeMap<String, Value>;

/// Index sets used to resample an empirical dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleIndices {
    /// One index array per sample (axis 0 of the dataset).
    PerSample(Vec<Vec<usize>>),
    /// A single index list shared by every sample.
    Shared(Vec<usize>),
}

impl SampleIndices {
    /// `true` when no index is present at the top level.
    pub fn is_empty(&self) -> bool {
        match self {
            SampleIndices::PerSample(v) => v.is_empty(),
            SampleIndices::Shared(v) => v.is_empty(),
        }
    }
}

/// A single entry of a parameter mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Numeric data in canonical layout.
    Tensor(Tensor),
    /// Discrete collection treated as opaque symbols.
    Symbols(Vec<String>),
    /// Structured index literal.
    Indices(SampleIndices),
}

impl Value {
    /// Borrow the tensor, or fail naming the parameter.
    pub fn as_tensor(&self, name: &str) -> Result<&Tensor> {
        match self {
            Value::Tensor(t) => Ok(t),
            other => Err(Error::Validation(format!(
                "parameter '{}' must be a tensor, got {}",
                name,
                other.kind()
            ))),
        }
    }

    /// Take the tensor by value, or fail naming the parameter.
    pub fn into_tensor(self, name: &str) -> Result<Tensor> {
        match self {
            Value::Tensor(t) => Ok(t),
            other => Err(Error::Validation(format!(
                "parameter '{}' must be a tensor, got {}",
                name,
                other.kind()
            ))),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Tensor(_) => "tensor",
            Value::Symbols(_) => "symbols",
            Value::Indices(_) => "indices",
        }
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::Tensor(t)
    }
}

impl From<Vec<String>> for Value {
    fn from(symbols: Vec<String>) -> Self {
        Value::Symbols(symbols)
    }
}

impl From<SampleIndices> for Value {
    fn from(indices: SampleIndices) -> Self {
        Value::Indices(indices)
    }
}

/// The `(number_samples, number_datapoints)` pair shared by every tensor of
/// one distribution call after broadcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleShape {
    /// Size of axis 0.
    pub number_samples: usize,
    /// Size of axis 1.
    pub number_datapoints: usize,
}

impl SampleShape {
    /// Create a new shape descriptor
    pub fn new(number_samples: usize, number_datapoints: usize) -> Self {
        Self { number_samples, number_datapoints }
    }

    /// Size of the flattened batch axis (`samples * datapoints`).
    pub fn batch_size(&self) -> usize {
        self.number_samples * self.number_datapoints
    }
}

/// Build a parameter mapping from `(name, value)` pairs.
pub fn parameters<I, K, V>(entries: I) -> Parameters
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
