//! The distribution abstraction.
//!
//! Every distribution answers two questions through one fixed pipeline:
//!
//! 1. validate the parameter mapping against the distribution's schema;
//! 2. align data and parameters according to its [`ShapeStrategy`];
//! 3. run the probability law;
//! 4. restore the canonical `(samples, datapoints, ...)` layout and, for
//!    log-probabilities, sum out the event axes.
//!
//! Concrete laws only implement step 3 ([`Distribution::log_prob_law`] and
//! [`Distribution::sample_law`]); the strategy and schema are declared data.

use br_core::{Error, Parameters, Result, SampleShape, Tensor, TensorMap, Value};
use rand::RngCore;

use crate::params::{Requirement, check_parameters, tensor_parameters};
use crate::shape::{
    broadcast_and_squeeze_mixed, broadcast_parent_values, flatten_batch, reshape,
    sum_data_dimensions,
};

/// Whether a distribution is defined over a continuum or a countable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Real-valued outcomes; sampling is reparameterised where possible.
    Continuous,
    /// Integer, categorical, or resampled outcomes.
    Discrete,
}

/// How a distribution aligns tensors before and after its law runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeStrategy {
    /// Scalar events: every tensor is broadcast to one common shape.
    Univariate,
    /// Vector events: the sample and datapoint axes are folded into a single
    /// batch axis around the law call. The listed parameters carry event
    /// structure and are flattened to `(batch, event_size)` for sampling.
    Vector {
        /// Parameters whose trailing axes describe the event.
        vector_parameters: &'static [&'static str],
    },
    /// No tractable density; tensors pass through untouched.
    Implicit,
}

/// Output of [`ShapeStrategy::preprocess_log_prob`].
#[derive(Debug, Clone)]
pub struct PreparedLogProb {
    /// Data aligned with the parameters.
    pub x: Tensor,
    /// Aligned parameters.
    pub parameters: TensorMap,
    /// Batch shape to restore, when the strategy flattened it.
    pub shape: Option<SampleShape>,
}

/// Output of [`ShapeStrategy::preprocess_sampling`].
#[derive(Debug, Clone)]
pub struct PreparedSampling {
    /// Aligned parameters.
    pub parameters: TensorMap,
    /// Full `(samples, datapoints, *event)` shape to restore, when flattened.
    pub sample_shape: Option<Vec<usize>>,
}

impl ShapeStrategy {
    /// Align `x` and `parameters` for a log-probability evaluation.
    pub fn preprocess_log_prob(&self, x: &Tensor, parameters: &TensorMap) -> Result<PreparedLogProb> {
        match self {
            ShapeStrategy::Univariate => {
                let (positional, parameters) =
                    broadcast_and_squeeze_mixed(std::slice::from_ref(x), parameters)?;
                let x = positional
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::Shape("broadcast dropped the data tensor".to_string()))?;
                Ok(PreparedLogProb { x, parameters, shape: None })
            }
            ShapeStrategy::Vector { .. } => {
                let mut all = Vec::with_capacity(parameters.len() + 1);
                all.push(x.clone());
                all.extend(parameters.values().cloned());
                let (flattened, shape) = flatten_batch(&all)?;
                let mut flattened = flattened.into_iter();
                let x = flattened
                    .next()
                    .ok_or_else(|| Error::Shape("broadcast dropped the data tensor".to_string()))?;
                let parameters = parameters.keys().cloned().zip(flattened).collect();
                Ok(PreparedLogProb { x, parameters, shape: Some(shape) })
            }
            ShapeStrategy::Implicit => {
                Ok(PreparedLogProb { x: x.clone(), parameters: parameters.clone(), shape: None })
            }
        }
    }

    /// Align `parameters` for sampling.
    pub fn preprocess_sampling(&self, parameters: &TensorMap) -> Result<PreparedSampling> {
        match self {
            ShapeStrategy::Univariate => {
                let (_, parameters) = broadcast_and_squeeze_mixed(&[], parameters)?;
                Ok(PreparedSampling { parameters, sample_shape: None })
            }
            ShapeStrategy::Vector { vector_parameters } => {
                let (flattened, shape) = broadcast_parent_values(parameters)?;
                let mut event_shape: Option<Vec<usize>> = None;
                let mut reshaped = TensorMap::new();
                for (name, value) in flattened {
                    if vector_parameters.contains(&name.as_str()) {
                        if event_shape.is_none() {
                            event_shape = Some(value.shape()[1..].to_vec());
                        }
                        let event_size: usize = value.shape()[1..].iter().product();
                        let value = reshape(&value, &[shape.batch_size(), event_size])?;
                        reshaped.insert(name, value);
                    } else {
                        reshaped.insert(name, value);
                    }
                }
                let event_shape = event_shape.ok_or_else(|| {
                    Error::Validation(format!(
                        "no vector parameter among {:?} was supplied",
                        vector_parameters
                    ))
                })?;
                let mut sample_shape = vec![shape.number_samples, shape.number_datapoints];
                sample_shape.extend(event_shape);
                Ok(PreparedSampling { parameters: reshaped, sample_shape: Some(sample_shape) })
            }
            ShapeStrategy::Implicit => {
                Ok(PreparedSampling { parameters: parameters.clone(), sample_shape: None })
            }
        }
    }

    /// Restore the canonical layout of a raw sample.
    pub fn postprocess_sample(&self, sample: Tensor, sample_shape: Option<&[usize]>) -> Result<Tensor> {
        match (self, sample_shape) {
            (ShapeStrategy::Vector { .. }, Some(shape)) => reshape(&sample, shape),
            _ => Ok(sample),
        }
    }

    /// Restore the `(samples, datapoints)` layout of a raw log-probability.
    pub fn postprocess_log_prob(&self, log_prob: Tensor, shape: Option<SampleShape>) -> Result<Tensor> {
        match (self, shape) {
            (ShapeStrategy::Vector { .. }, Some(s)) => {
                reshape(&log_prob, &[s.number_samples, s.number_datapoints])
            }
            _ => Ok(log_prob),
        }
    }
}

/// A probability distribution over canonical tensors.
pub trait Distribution {
    /// Display name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Required-parameter schema.
    fn required_parameters(&self) -> &'static [Requirement];

    /// Names accepted in addition to the required ones.
    fn optional_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    /// Shape handling applied around the law.
    fn shape_strategy(&self) -> ShapeStrategy;

    /// Continuous or discrete outcomes.
    fn support(&self) -> Support;

    /// Raw log-probability of aligned data under aligned parameters.
    fn log_prob_law(&self, x: &Tensor, parameters: &TensorMap) -> Result<Tensor>;

    /// Raw draw from aligned parameters.
    fn sample_law(&self, parameters: &TensorMap, rng: &mut dyn RngCore) -> Result<Tensor>;

    /// Validate `parameters` against [`Distribution::required_parameters`].
    fn check_parameters(&self, parameters: &Parameters) -> Result<()> {
        check_parameters(self.name(), self.required_parameters(), parameters)
    }

    /// Log-density of `x`, one value per (sample, datapoint) pair.
    fn calculate_log_probability(&self, x: &Tensor, parameters: &Parameters) -> Result<Tensor> {
        self.check_parameters(parameters)?;
        let strategy = self.shape_strategy();
        let tensors = match strategy {
            ShapeStrategy::Implicit => TensorMap::new(),
            _ => tensor_parameters(parameters)?,
        };
        let prepared = strategy.preprocess_log_prob(x, &tensors)?;
        let log_prob = self.log_prob_law(&prepared.x, &prepared.parameters)?;
        let log_prob = strategy.postprocess_log_prob(log_prob, prepared.shape)?;
        Ok(sum_data_dimensions(&log_prob))
    }

    /// Draw one sample in canonical layout.
    fn get_sample(&self, parameters: &Parameters, rng: &mut dyn RngCore) -> Result<Value> {
        self.check_parameters(parameters)?;
        let strategy = self.shape_strategy();
        let tensors = tensor_parameters(parameters)?;
        let prepared = strategy.preprocess_sampling(&tensors)?;
        let sample = self.sample_law(&prepared.parameters, rng)?;
        let sample = strategy.postprocess_sample(sample, prepared.sample_shape.as_deref())?;
        Ok(Value::Tensor(sample))
    }

    /// [`Distribution::get_sample`] for distributions that always return tensors.
    fn sample_tensor(&self, parameters: &Parameters, rng: &mut dyn RngCore) -> Result<Tensor> {
        self.get_sample(parameters, rng)?.into_tensor("sample")
    }
}

fn check_same_shape(tensors: &[&Tensor]) -> Result<()> {
    if let Some(first) = tensors.first() {
        if let Some(other) = tensors.iter().find(|t| t.shape() != first.shape()) {
            return Err(Error::Shape(format!(
                "law inputs must share one shape, got {:?} and {:?}",
                first.shape(),
                other.shape()
            )));
        }
    }
    Ok(())
}

/// Apply a fallible scalar function across three equally-shaped tensors.
pub(crate) fn try_map3(
    a: &Tensor,
    b: &Tensor,
    c: &Tensor,
    f: impl Fn(f64, f64, f64) -> Result<f64>,
) -> Result<Tensor> {
    check_same_shape(&[a, b, c])?;
    let values = a
        .iter()
        .zip(b.iter())
        .zip(c.iter())
        .map(|((&a, &b), &c)| f(a, b, c))
        .collect::<Result<Vec<_>>>()?;
    Ok(Tensor::from_shape_vec(a.raw_dim(), values)?)
}

/// Draw one value per element of two equally-shaped parameter tensors.
pub(crate) fn sample_map2(
    a: &Tensor,
    b: &Tensor,
    rng: &mut dyn RngCore,
    mut f: impl FnMut(f64, f64, &mut dyn RngCore) -> Result<f64>,
) -> Result<Tensor> {
    check_same_shape(&[a, b])?;
    let mut values = Vec::with_capacity(a.len());
    for (&a, &b) in a.iter().zip(b.iter()) {
        values.push(f(a, b, &mut *rng)?);
    }
    Ok(Tensor::from_shape_vec(a.raw_dim(), values)?)
}
