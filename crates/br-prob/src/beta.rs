//! Beta distribution.
//!
//! Parameters follow the modelling convention where `alpha` weights the
//! `1 - x` side and `beta` weights the `x` side:
//! `p(x) ∝ x^(beta-1) (1-x)^(alpha-1)`.

use br_core::{Error, Result, Tensor, TensorMap};
use rand::RngCore;
use rand_distr::Distribution as _;

use crate::distribution::{Distribution, ShapeStrategy, Support, sample_map2, try_map3};
use crate::math::ln_beta;
use crate::params::{Requirement, check_positive, get};

/// Log-PDF of a Beta(`a`, `b`) distribution at `x`, in the textbook
/// parameterisation `p(x) ∝ x^(a-1) (1-x)^(b-1)`.
///
/// Support: `0 <= x <= 1`.
pub fn logpdf(x: f64, a: f64, b: f64) -> Result<f64> {
    check_positive("a", a)?;
    check_positive("b", b)?;
    if !(0.0..=1.0).contains(&x) {
        return Ok(f64::NEG_INFINITY);
    }

    let ln_norm = -ln_beta(a, b);
    let edge = |shape: f64| {
        if shape < 1.0 {
            f64::INFINITY
        } else if shape > 1.0 {
            f64::NEG_INFINITY
        } else {
            ln_norm
        }
    };
    if x == 0.0 {
        return Ok(edge(a));
    }
    if x == 1.0 {
        return Ok(edge(b));
    }

    Ok(ln_norm + (a - 1.0) * x.ln() + (b - 1.0) * (1.0 - x).ln())
}

/// Beta with parameters `alpha` and `beta`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Beta;

impl Distribution for Beta {
    fn name(&self) -> &'static str {
        "Beta"
    }

    fn required_parameters(&self) -> &'static [Requirement] {
        &[Requirement::One("alpha"), Requirement::One("beta")]
    }

    fn shape_strategy(&self) -> ShapeStrategy {
        ShapeStrategy::Univariate
    }

    fn support(&self) -> Support {
        Support::Continuous
    }

    fn log_prob_law(&self, x: &Tensor, parameters: &TensorMap) -> Result<Tensor> {
        let alpha = get(parameters, self.name(), "alpha")?;
        let beta = get(parameters, self.name(), "beta")?;
        try_map3(x, alpha, beta, |x, alpha, beta| {
            check_positive("alpha", alpha)?;
            check_positive("beta", beta)?;
            logpdf(x, beta, alpha)
        })
    }

    fn sample_law(&self, parameters: &TensorMap, rng: &mut dyn RngCore) -> Result<Tensor> {
        let alpha = get(parameters, self.name(), "alpha")?;
        let beta = get(parameters, self.name(), "beta")?;
        sample_map2(alpha, beta, rng, |alpha, beta, rng| {
            check_positive("alpha", alpha)?;
            check_positive("beta", beta)?;
            let law = rand_distr::Beta::new(beta, alpha)
                .map_err(|e| Error::Validation(format!("Beta(alpha={}, beta={}): {}", alpha, beta, e)))?;
            Ok(law.sample(rng))
        })
    }
}
