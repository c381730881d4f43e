//! Binomial distribution.
//!
//! The count `n` and outcome `k` are real-valued tensors; the normaliser
//! uses `ln Γ` so non-integer values evaluate smoothly.

use br_core::{Error, Result, Tensor, TensorMap};
use rand::RngCore;
use rand_distr::Distribution as _;

use crate::distribution::{Distribution, ShapeStrategy, Support, sample_map2, try_map3};
use crate::math::{ln_choose, log_sigmoid, sigmoid};
use crate::params::{Requirement, get};

fn check_count(k: f64, n: f64) -> Result<()> {
    if !n.is_finite() || n < 0.0 {
        return Err(Error::Validation(format!("n must be finite and >= 0, got {}", n)));
    }
    if !(0.0..=n).contains(&k) {
        return Err(Error::Validation(format!("k must be in [0, n], got k={} n={}", k, n)));
    }
    Ok(())
}

/// Log-PMF of a Binomial distribution `Binom(n, p)` at count `k`.
pub fn logpmf(k: f64, n: f64, p: f64) -> Result<f64> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("p must be finite and in [0,1], got {}", p)));
    }
    check_count(k, n)?;

    if p == 0.0 {
        return Ok(if k == 0.0 { 0.0 } else { f64::NEG_INFINITY });
    }
    if p == 1.0 {
        return Ok(if k == n { 0.0 } else { f64::NEG_INFINITY });
    }
    Ok(ln_choose(n, k) + k * p.ln() + (n - k) * (-p).ln_1p())
}

/// Log-PMF of a Binomial distribution with probability in logit space.
pub fn logpmf_logit(k: f64, n: f64, logit_p: f64) -> Result<f64> {
    check_count(k, n)?;
    if !logit_p.is_finite() {
        return Err(Error::Validation(format!("logit_p must be finite, got {}", logit_p)));
    }
    Ok(ln_choose(n, k) + k * log_sigmoid(logit_p) + (n - k) * log_sigmoid(-logit_p))
}

/// Negative log-likelihood for Binomial.
pub fn nll(k: f64, n: f64, p: f64) -> Result<f64> {
    Ok(-logpmf(k, n, p)?)
}

fn draw(n: f64, p: f64, rng: &mut dyn RngCore) -> Result<f64> {
    if !n.is_finite() || n < 0.0 {
        return Err(Error::Validation(format!("n must be finite and >= 0, got {}", n)));
    }
    let law = rand_distr::Binomial::new(n.round() as u64, p)
        .map_err(|e| Error::Validation(format!("Binomial(n={}, p={}): {}", n, p, e)))?;
    Ok(law.sample(rng) as f64)
}

/// Success parameter of a Binomial, resolved once per call.
#[derive(Debug, Clone, PartialEq)]
pub enum BinomialSuccess {
    /// Success probabilities in `[0, 1]`.
    Probs(Tensor),
    /// Success log-odds.
    Logits(Tensor),
}

impl BinomialSuccess {
    /// Pick the success parameterisation from aligned parameters.
    ///
    /// `p` takes precedence over `logit_p` when both are present.
    pub fn resolve(parameters: &TensorMap) -> Result<Self> {
        match (parameters.get("p"), parameters.get("logit_p")) {
            (Some(p), logits) => {
                if logits.is_some() {
                    log::warn!("Binomial received both 'p' and 'logit_p'; using 'p'");
                }
                Ok(BinomialSuccess::Probs(p.clone()))
            }
            (None, Some(logits)) => Ok(BinomialSuccess::Logits(logits.clone())),
            (None, None) => Err(Error::MissingParameter {
                distribution: "Binomial",
                missing: "'p' or 'logit_p'".to_string(),
            }),
        }
    }
}

/// Binomial with count `n` and success `p` or `logit_p`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Binomial;

impl Distribution for Binomial {
    fn name(&self) -> &'static str {
        "Binomial"
    }

    fn required_parameters(&self) -> &'static [Requirement] {
        &[Requirement::One("n"), Requirement::AnyOf(&["p", "logit_p"])]
    }

    fn shape_strategy(&self) -> ShapeStrategy {
        ShapeStrategy::Univariate
    }

    fn support(&self) -> Support {
        Support::Discrete
    }

    fn log_prob_law(&self, x: &Tensor, parameters: &TensorMap) -> Result<Tensor> {
        let n = get(parameters, self.name(), "n")?;
        match BinomialSuccess::resolve(parameters)? {
            BinomialSuccess::Probs(p) => try_map3(x, n, &p, logpmf),
            BinomialSuccess::Logits(logits) => try_map3(x, n, &logits, logpmf_logit),
        }
    }

    fn sample_law(&self, parameters: &TensorMap, rng: &mut dyn RngCore) -> Result<Tensor> {
        let n = get(parameters, self.name(), "n")?;
        let p = match BinomialSuccess::resolve(parameters)? {
            BinomialSuccess::Probs(p) => p,
            BinomialSuccess::Logits(logits) => logits.mapv(sigmoid),
        };
        sample_map2(n, &p, rng, draw)
    }
}
