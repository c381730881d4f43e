//! Categorical distribution over the first event axis.
//!
//! Parameters arrive as `(samples, datapoints, classes, ...)` tensors. Only
//! the first slice of any axis past the class axis takes part in scoring.
//! Data may be one-hot rows or integer class labels; see
//! [`CategoricalEncoding`].

use br_core::{Error, Result, Tensor, TensorMap};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::distribution::{Distribution, ShapeStrategy, Support};
use crate::math::{argmax, log_softmax};
use crate::params::Requirement;
use crate::shape::tensor_range;

/// How observed data encodes the class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalEncoding {
    /// Decide from the data. Probability parameters always imply one-hot
    /// data. With logits, data is one-hot when its shape equals the logits'
    /// shape and its distinct values are exactly `{0, 1}`; otherwise it holds
    /// class indices. Integer labels drawn only from `{0, 1}` and shaped like
    /// the logits are therefore read as one-hot.
    #[default]
    Infer,
    /// Rows are one-hot vectors; the hot position is the class.
    OneHot,
    /// The first element of each row is an integer class index.
    Index,
}

/// Class weights of a Categorical, resolved once per call.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoricalParameters {
    /// Non-negative class weights, normalised per row.
    Probs(Tensor),
    /// Unnormalised log-weights.
    Logits(Tensor),
}

impl CategoricalParameters {
    /// Pick the parameterisation; `p` takes precedence over `softmax_p`.
    pub fn resolve(parameters: &TensorMap) -> Result<Self> {
        match (parameters.get("p"), parameters.get("softmax_p")) {
            (Some(p), logits) => {
                if logits.is_some() {
                    log::warn!("Categorical received both 'p' and 'softmax_p'; using 'p'");
                }
                Ok(CategoricalParameters::Probs(p.clone()))
            }
            (None, Some(logits)) => Ok(CategoricalParameters::Logits(logits.clone())),
            (None, None) => Err(Error::MissingParameter {
                distribution: "Categorical",
                missing: "'p' or 'softmax_p'".to_string(),
            }),
        }
    }

    fn tensor(&self) -> &Tensor {
        match self {
            CategoricalParameters::Probs(t) | CategoricalParameters::Logits(t) => t,
        }
    }

    /// Per-row log-probabilities of each class.
    fn log_mass_rows(&self) -> Result<Vec<Vec<f64>>> {
        if self.tensor().shape().get(1) == Some(&0) {
            return Err(Error::Shape(format!(
                "class axis is empty in parameters of shape {:?}",
                self.tensor().shape()
            )));
        }
        match self {
            CategoricalParameters::Probs(p) => first_slice_rows(p)
                .into_iter()
                .map(|row| -> Result<Vec<f64>> {
                    Ok(normalized(&row)?.into_iter().map(f64::ln).collect())
                })
                .collect(),
            CategoricalParameters::Logits(l) => first_slice_rows(l)
                .iter()
                .map(|row| {
                    check_logits(row)?;
                    Ok(log_softmax(row))
                })
                .collect(),
        }
    }
}

/// Rows of `tensor` along axis 1, taking index 0 on every later axis.
///
/// A rank-1 tensor yields one single-element row per entry.
fn first_slice_rows(tensor: &Tensor) -> Vec<Vec<f64>> {
    let shape = tensor.shape();
    let batch = shape.first().copied().unwrap_or(1);
    let width = shape.get(1).copied().unwrap_or(1);
    let stride: usize = shape.iter().skip(2).product();
    let data: Vec<f64> = tensor.iter().copied().collect();
    (0..batch)
        .map(|b| (0..width).map(|i| data[(b * width + i) * stride]).collect())
        .collect()
}

fn normalized(row: &[f64]) -> Result<Vec<f64>> {
    if let Some(bad) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(Error::Validation(format!(
            "p must be finite and >= 0, got {}",
            bad
        )));
    }
    let total: f64 = row.iter().sum();
    if total <= 0.0 {
        return Err(Error::Validation("p must have a positive sum in every row".to_string()));
    }
    Ok(row.iter().map(|v| v / total).collect())
}

fn check_logits(row: &[f64]) -> Result<()> {
    if let Some(bad) = row.iter().find(|v| v.is_nan() || **v == f64::INFINITY) {
        return Err(Error::Validation(format!("softmax_p must be finite or -inf, got {}", bad)));
    }
    if !row.iter().any(|v| v.is_finite()) {
        return Err(Error::Validation(
            "softmax_p must have a finite entry in every row".to_string(),
        ));
    }
    Ok(())
}

fn class_index(value: f64, classes: usize) -> Result<usize> {
    if value.fract() != 0.0 || value < 0.0 || value >= classes as f64 {
        return Err(Error::Validation(format!(
            "class index must be an integer in [0, {}), got {}",
            classes, value
        )));
    }
    Ok(value as usize)
}

/// Inverse-CDF draw of a class from a normalised probability row.
fn draw_class(probs: &[f64], rng: &mut dyn RngCore) -> usize {
    let u: f64 = rng.random();
    let mut cumulative = 0.0;
    for (i, p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return i;
        }
    }
    // Rounding left `u` above the total mass.
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

/// Categorical with class weights `p` or logits `softmax_p`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorical {
    /// Encoding of observed data.
    pub encoding: CategoricalEncoding,
}

impl Categorical {
    /// Categorical reading data with the given encoding.
    pub fn new(encoding: CategoricalEncoding) -> Self {
        Self { encoding }
    }

    fn reads_one_hot(&self, x: &Tensor, resolved: &CategoricalParameters) -> bool {
        match (self.encoding, resolved) {
            (CategoricalEncoding::OneHot, _) => true,
            (CategoricalEncoding::Index, _) => false,
            (CategoricalEncoding::Infer, CategoricalParameters::Probs(_)) => true,
            (CategoricalEncoding::Infer, CategoricalParameters::Logits(logits)) => {
                let one_hot = x.shape() == logits.shape() && tensor_range(x) == [0.0, 1.0];
                log::debug!(
                    "Categorical inferred {} encoding for data of shape {:?}",
                    if one_hot { "one-hot" } else { "index" },
                    x.shape()
                );
                one_hot
            }
        }
    }
}

impl Distribution for Categorical {
    fn name(&self) -> &'static str {
        "Categorical"
    }

    fn required_parameters(&self) -> &'static [Requirement] {
        &[Requirement::AnyOf(&["p", "softmax_p"])]
    }

    fn shape_strategy(&self) -> ShapeStrategy {
        ShapeStrategy::Vector { vector_parameters: &["p", "softmax_p"] }
    }

    fn support(&self) -> Support {
        Support::Discrete
    }

    fn log_prob_law(&self, x: &Tensor, parameters: &TensorMap) -> Result<Tensor> {
        let resolved = CategoricalParameters::resolve(parameters)?;
        let one_hot = self.reads_one_hot(x, &resolved);
        let log_mass = resolved.log_mass_rows()?;
        let data = first_slice_rows(x);
        if data.len() != log_mass.len() {
            return Err(Error::Shape(format!(
                "data batch {} does not match parameter batch {}",
                data.len(),
                log_mass.len()
            )));
        }

        let scores = data
            .iter()
            .zip(&log_mass)
            .map(|(row, log_mass)| {
                let classes = log_mass.len();
                let class = if one_hot {
                    if row.len() != classes {
                        return Err(Error::Shape(format!(
                            "one-hot rows have {} entries but there are {} classes",
                            row.len(),
                            classes
                        )));
                    }
                    argmax(row).ok_or_else(|| Error::Shape("empty class axis".to_string()))?
                } else {
                    let first = row
                        .first()
                        .ok_or_else(|| Error::Shape("empty data row".to_string()))?;
                    class_index(*first, classes)?
                };
                Ok(log_mass[class])
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Tensor::from_shape_vec(ndarray::IxDyn(&[scores.len()]), scores)?)
    }

    fn sample_law(&self, parameters: &TensorMap, rng: &mut dyn RngCore) -> Result<Tensor> {
        let resolved = CategoricalParameters::resolve(parameters)?;
        let rows = resolved.log_mass_rows()?;
        let batch = resolved.tensor().shape().first().copied().unwrap_or(1);
        let classes = rows.first().map_or(0, Vec::len);

        let mut values = vec![0.0; batch * classes];
        for (b, log_mass) in rows.iter().enumerate() {
            let probs: Vec<f64> = log_mass.iter().map(|v| v.exp()).collect();
            let class = draw_class(&probs, &mut *rng);
            values[b * classes + class] = 1.0;
        }
        Ok(Tensor::from_shape_vec(ndarray::IxDyn(&[batch, classes]), values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use br_core::parameters;
    use ndarray::IxDyn;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tensor(shape: &[usize], values: Vec<f64>) -> Tensor {
        Tensor::from_shape_vec(IxDyn(shape), values).unwrap()
    }

    #[test]
    fn test_first_slice_rows() {
        let t = tensor(&[2, 3, 2], (0..12).map(f64::from).collect());
        assert_eq!(first_slice_rows(&t), vec![vec![0.0, 2.0, 4.0], vec![6.0, 8.0, 10.0]]);
        let t = tensor(&[2], vec![1.0, 2.0]);
        assert_eq!(first_slice_rows(&t), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_probs_are_normalised() {
        let p = tensor(&[1, 1, 3, 1], vec![2.0, 1.0, 1.0]);
        let x = tensor(&[1, 1, 3, 1], vec![1.0, 0.0, 0.0]);
        let lp = Categorical::default()
            .calculate_log_probability(&x, &parameters([("p", p)]))
            .unwrap();
        assert_eq!(lp.shape(), &[1, 1]);
        assert_relative_eq!(lp[[0, 0].as_slice()], 0.5f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_encoding_overrides_inference() {
        // Binary labels shaped like the logits would be inferred as one-hot.
        let logits = tensor(&[1, 2, 2, 1], vec![0.0, 1.0, 2.0, 0.0]);
        let x = tensor(&[1, 2, 2, 1], vec![1.0, 0.0, 1.0, 0.0]);
        let params = parameters([("softmax_p", logits)]);

        let inferred = Categorical::default().calculate_log_probability(&x, &params).unwrap();
        let one_hot = Categorical::new(CategoricalEncoding::OneHot)
            .calculate_log_probability(&x, &params)
            .unwrap();
        assert_eq!(inferred, one_hot);

        let index = Categorical::new(CategoricalEncoding::Index)
            .calculate_log_probability(&x, &params)
            .unwrap();
        // Index path reads class 1 for both datapoints.
        let l0 = log_softmax(&[0.0, 1.0]);
        let l1 = log_softmax(&[2.0, 0.0]);
        assert_relative_eq!(index[[0, 0].as_slice()], l0[1], epsilon = 1e-12);
        assert_relative_eq!(index[[0, 1].as_slice()], l1[1], epsilon = 1e-12);
    }

    #[test]
    fn test_index_out_of_range() {
        let logits = tensor(&[1, 1, 3, 1], vec![0.0, 0.0, 0.0]);
        let x = tensor(&[1, 1, 1, 1], vec![3.0]);
        let err = Categorical::default()
            .calculate_log_probability(&x, &parameters([("softmax_p", logits)]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_invalid_probs() {
        let p = tensor(&[1, 1, 2, 1], vec![-1.0, 2.0]);
        let x = tensor(&[1, 1, 2, 1], vec![0.0, 1.0]);
        assert!(Categorical::default().calculate_log_probability(&x, &parameters([("p", p)])).is_err());
    }

    #[test]
    fn test_empty_class_axis() {
        let mut rng = StdRng::seed_from_u64(37);
        for name in ["softmax_p", "p"] {
            let params = parameters([(name, Tensor::zeros(IxDyn(&[1, 1, 0])))]);
            let err = Categorical::default().sample_tensor(&params, &mut rng).unwrap_err();
            assert!(matches!(err, Error::Shape(_)), "{} -> {:?}", name, err);
        }
    }

    #[test]
    fn test_degenerate_logits() {
        let mut rng = StdRng::seed_from_u64(41);
        let rows = [
            vec![f64::NEG_INFINITY; 3],
            vec![0.0, f64::NAN, 1.0],
            vec![0.0, f64::INFINITY, 1.0],
        ];
        for row in rows {
            let params = parameters([("softmax_p", tensor(&[1, 1, 3], row))]);
            let err = Categorical::default().sample_tensor(&params, &mut rng).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        // A single -inf logit only rules out its class.
        let row = vec![f64::NEG_INFINITY, 0.0, f64::NEG_INFINITY];
        let params = parameters([("softmax_p", tensor(&[1, 1, 3], row))]);
        let s = Categorical::default().sample_tensor(&params, &mut rng).unwrap();
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_sample_is_one_hot_with_event_shape() {
        let p = tensor(&[2, 1, 3, 1], vec![0.0, 1.0, 0.0, 0.2, 0.3, 0.5]);
        let mut rng = StdRng::seed_from_u64(29);
        let s = Categorical::default().sample_tensor(&parameters([("p", p)]), &mut rng).unwrap();
        assert_eq!(s.shape(), &[2, 1, 3, 1]);
        for row in first_slice_rows(&s.into_shape_with_order(IxDyn(&[2, 3])).unwrap()) {
            assert_eq!(row.iter().sum::<f64>(), 1.0);
        }
    }

    #[test]
    fn test_sample_frequencies() {
        let logits = tensor(&[1, 1, 3], vec![0.0, 1.0, 2.0]);
        let expected: Vec<f64> = log_softmax(&[0.0, 1.0, 2.0]).iter().map(|v| v.exp()).collect();
        let mut rng = StdRng::seed_from_u64(31);
        let params = parameters([("softmax_p", logits)]);
        let mut counts = [0usize; 3];
        let n = 6000;
        for _ in 0..n {
            let s = Categorical::default().sample_tensor(&params, &mut rng).unwrap();
            let class = argmax(s.as_slice().unwrap()).unwrap();
            counts[class] += 1;
        }
        for (c, e) in counts.iter().zip(&expected) {
            assert!((*c as f64 / n as f64 - e).abs() < 0.03);
        }
    }

    #[test]
    fn test_draw_class_skips_zero_mass() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(draw_class(&[0.0, 1.0, 0.0], &mut rng), 1);
        }
    }

    #[test]
    fn test_encoding_serde() {
        let json = serde_json::to_string(&CategoricalEncoding::OneHot).unwrap();
        assert_eq!(json, "\"one_hot\"");
        let back: Categorical = serde_json::from_str("{\"encoding\":\"index\"}").unwrap();
        assert_eq!(back.encoding, CategoricalEncoding::Index);
    }
}
