//! Empirical distribution: resampling from a fixed dataset.
//!
//! The dataset is a tensor in canonical layout or a collection of symbols.
//! Each draw picks `batch_size` entries without replacement, optionally
//! weighted. The distribution has no tractable density; its log-probability
//! is identically zero.

use br_core::{Error, Parameters, Result, SampleIndices, Tensor, TensorMap, Value};
use ndarray::{Axis, IxDyn};
use rand::RngCore;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::distribution::{Distribution, ShapeStrategy, Support};
use crate::params::{Requirement, get, tensor_parameters};

/// Settings fixed when an [`Empirical`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmpiricalConfig {
    /// Number of entries drawn per sample.
    pub batch_size: usize,
    /// Observed datasets index datapoints on axis 1, latent ones on axis 2.
    pub is_observed: bool,
}

impl Default for EmpiricalConfig {
    fn default() -> Self {
        Self { batch_size: 1, is_observed: false }
    }
}

impl EmpiricalConfig {
    fn datapoint_axis(&self) -> usize {
        if self.is_observed { 1 } else { 2 }
    }
}

/// Resampling distribution over a dataset passed as the `dataset` parameter.
///
/// Optional parameters: `weights` (one non-negative weight per dataset entry)
/// and `indices` (explicit index sets, bypassing random selection).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Empirical {
    config: EmpiricalConfig,
}

impl Empirical {
    /// Empirical drawing `batch_size` entries per sample.
    pub fn new(batch_size: usize, is_observed: bool) -> Self {
        Self::from_config(EmpiricalConfig { batch_size, is_observed })
    }

    /// Empirical built from a configuration.
    pub fn from_config(config: EmpiricalConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &EmpiricalConfig {
        &self.config
    }

    fn draw_indices(
        &self,
        dataset_size: usize,
        weights: Option<&[f64]>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<usize>> {
        let batch_size = self.config.batch_size;
        if batch_size > dataset_size {
            return Err(Error::InfeasibleSampling { batch_size, dataset_size });
        }
        log::debug!(
            "drawing {} of {} dataset entries ({})",
            batch_size,
            dataset_size,
            if weights.is_some() { "weighted" } else { "uniform" }
        );
        match weights {
            Some(w) => {
                let nonzero = w.iter().filter(|&&v| v > 0.0).count();
                if batch_size > nonzero {
                    return Err(Error::InfeasibleSampling { batch_size, dataset_size: nonzero });
                }
                index::sample_weighted(rng, dataset_size, |i| w[i], batch_size)
                .map(|picked| picked.into_vec())
                .map_err(|e| {
                    Error::Validation(format!(
                        "cannot draw {} weighted entries without replacement: {}",
                        batch_size, e
                    ))
                })
            }
            None => Ok(index::sample(rng, dataset_size, batch_size).into_vec()),
        }
    }

    fn sample_tensor_dataset(
        &self,
        dataset: &Tensor,
        weights: Option<&Value>,
        indices: Option<&Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Tensor> {
        let axis = self.config.datapoint_axis();
        if dataset.ndim() <= axis {
            return Err(Error::Shape(format!(
                "dataset of shape {:?} has no datapoint axis {}",
                dataset.shape(),
                axis
            )));
        }
        let dataset_size = dataset.shape()[axis];
        let number_samples = dataset.shape()[0];

        let indices = match indices {
            Some(value) => parse_indices(value)?,
            None => {
                let weights = weights.map(|w| normalized_weights(w, dataset_size)).transpose()?;
                let per_sample = (0..number_samples)
                    .map(|_| self.draw_indices(dataset_size, weights.as_deref(), &mut *rng))
                    .collect::<Result<Vec<_>>>()?;
                SampleIndices::PerSample(per_sample)
            }
        };

        match indices {
            SampleIndices::Shared(idx) => {
                check_bounds(&idx, dataset_size)?;
                Ok(dataset.select(Axis(axis), &idx))
            }
            SampleIndices::PerSample(rows) => {
                if rows.len() != number_samples && number_samples != 1 {
                    return Err(Error::InvalidIndices(format!(
                        "{} index sets for a dataset with {} samples",
                        rows.len(),
                        number_samples
                    )));
                }
                let parts = rows
                    .iter()
                    .enumerate()
                    .map(|(n, idx)| {
                        check_bounds(idx, dataset_size)?;
                        let sample = dataset.index_axis(Axis(0), n.min(number_samples - 1));
                        Ok(sample.select(Axis(axis - 1), idx).insert_axis(Axis(0)))
                    })
                    .collect::<Result<Vec<Tensor>>>()?;
                let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
                Ok(ndarray::concatenate(Axis(0), &views)?)
            }
        }
    }

    fn sample_symbols(
        &self,
        dataset: &[String],
        weights: Option<&Value>,
        indices: Option<&Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<String>> {
        let idx = match indices.map(parse_indices).transpose()? {
            Some(SampleIndices::Shared(idx)) => idx,
            Some(SampleIndices::PerSample(_)) => {
                return Err(Error::InvalidIndices(
                    "a discrete dataset takes a single flat index list".to_string(),
                ));
            }
            None => {
                let weights = weights.map(|w| normalized_weights(w, dataset.len())).transpose()?;
                self.draw_indices(dataset.len(), weights.as_deref(), rng)?
            }
        };
        check_bounds(&idx, dataset.len())?;
        Ok(idx.iter().map(|&i| dataset[i].clone()).collect())
    }
}

fn check_bounds(idx: &[usize], dataset_size: usize) -> Result<()> {
    match idx.iter().find(|&&i| i >= dataset_size) {
        Some(i) => Err(Error::InvalidIndices(format!(
            "index {} out of range for a dataset of {} entries",
            i, dataset_size
        ))),
        None => Ok(()),
    }
}

fn as_index(value: f64) -> Result<usize> {
    if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
        return Err(Error::InvalidIndices(format!(
            "indices must be non-negative integers, got {}",
            value
        )));
    }
    Ok(value as usize)
}

/// Interpret an `indices` parameter.
///
/// Accepts a structured [`SampleIndices`] literal, a rank-1 tensor (one list
/// shared by every sample) or a rank-2 tensor (one row per sample).
fn parse_indices(value: &Value) -> Result<SampleIndices> {
    let indices = match value {
        Value::Indices(indices) => indices.clone(),
        Value::Tensor(t) if t.ndim() == 1 => {
            SampleIndices::Shared(t.iter().map(|&v| as_index(v)).collect::<Result<_>>()?)
        }
        Value::Tensor(t) if t.ndim() == 2 => SampleIndices::PerSample(
            t.outer_iter()
                .map(|row| row.iter().map(|&v| as_index(v)).collect::<Result<Vec<_>>>())
                .collect::<Result<_>>()?,
        ),
        Value::Tensor(t) => {
            return Err(Error::InvalidIndices(format!(
                "expected a list of integers or a list of index arrays, got a tensor of shape {:?}",
                t.shape()
            )));
        }
        Value::Symbols(_) => {
            return Err(Error::InvalidIndices("indices cannot be symbols".to_string()));
        }
    };
    if indices.is_empty() {
        return Err(Error::InvalidIndices("empty index list".to_string()));
    }
    Ok(indices)
}

/// Flatten and normalise `weights` into a probability vector over the dataset.
fn normalized_weights(value: &Value, dataset_size: usize) -> Result<Vec<f64>> {
    let weights = value.as_tensor("weights")?;
    if weights.len() != dataset_size {
        return Err(Error::Validation(format!(
            "weights has {} entries for a dataset of {} entries",
            weights.len(),
            dataset_size
        )));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::Validation(format!("weights must be finite and >= 0, got {}", bad)));
    }
    let total: f64 = weights.sum();
    if total <= 0.0 {
        return Err(Error::Validation("weights must have a positive sum".to_string()));
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

impl Distribution for Empirical {
    fn name(&self) -> &'static str {
        "Empirical"
    }

    fn required_parameters(&self) -> &'static [Requirement] {
        &[Requirement::One("dataset")]
    }

    fn optional_parameters(&self) -> &'static [&'static str] {
        &["indices", "weights"]
    }

    fn shape_strategy(&self) -> ShapeStrategy {
        ShapeStrategy::Implicit
    }

    fn support(&self) -> Support {
        Support::Discrete
    }

    fn log_prob_law(&self, _x: &Tensor, _parameters: &TensorMap) -> Result<Tensor> {
        Ok(Tensor::zeros(IxDyn(&[1, 1])))
    }

    fn sample_law(&self, parameters: &TensorMap, rng: &mut dyn RngCore) -> Result<Tensor> {
        let dataset = get(parameters, self.name(), "dataset")?;
        let weights = parameters.get("weights").cloned().map(Value::Tensor);
        let indices = parameters.get("indices").cloned().map(Value::Tensor);
        self.sample_tensor_dataset(dataset, weights.as_ref(), indices.as_ref(), rng)
    }

    fn get_sample(&self, parameters: &Parameters, rng: &mut dyn RngCore) -> Result<Value> {
        self.check_parameters(parameters)?;
        let weights = parameters.get("weights");
        let indices = parameters.get("indices");
        let dataset = parameters.get("dataset").ok_or_else(|| Error::MissingParameter {
            distribution: self.name(),
            missing: "'dataset'".to_string(),
        })?;
        match dataset {
            Value::Tensor(dataset) => match indices {
                // Structured index literals have no tensor form.
                Some(Value::Indices(_) | Value::Symbols(_)) => {
                    self.sample_tensor_dataset(dataset, weights, indices, rng).map(Value::Tensor)
                }
                _ => self.sample_law(&tensor_parameters(parameters)?, rng).map(Value::Tensor),
            },
            Value::Symbols(dataset) => {
                self.sample_symbols(dataset, weights, indices, rng).map(Value::Symbols)
            }
            other => Err(Error::Validation(format!(
                "parameter 'dataset' must be a tensor or symbols, got {}",
                other.kind()
            ))),
        }
    }
}
