//! Cauchy distribution.

use std::f64::consts::PI;

use br_core::{Result, Tensor, TensorMap};
use rand::distr::Open01;
use rand::{Rng, RngCore};

use crate::distribution::{Distribution, ShapeStrategy, Support, sample_map2, try_map3};
use crate::params::{Requirement, check_positive, get};

/// Log-PDF of `Cauchy(loc, scale)` at `x`.
///
/// `log p(x) = -ln(π) - ln(scale) - ln(1 + ((x-loc)/scale)^2)`
pub fn logpdf(x: f64, loc: f64, scale: f64) -> Result<f64> {
    check_positive("scale", scale)?;
    let z = (x - loc) / scale;
    Ok(-PI.ln() - scale.ln() - z.mul_add(z, 1.0).ln())
}

/// Inverse-CDF draw: `loc + scale * tan(π (u - 1/2))` with `u ~ U(0, 1)`.
fn draw(loc: f64, scale: f64, rng: &mut dyn RngCore) -> Result<f64> {
    check_positive("scale", scale)?;
    let u: f64 = rng.sample(Open01);
    Ok(loc + scale * (PI * (u - 0.5)).tan())
}

/// Cauchy with parameters `loc` and `scale`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cauchy;

impl Distribution for Cauchy {
    fn name(&self) -> &'static str {
        "Cauchy"
    }

    fn required_parameters(&self) -> &'static [Requirement] {
        &[Requirement::One("loc"), Requirement::One("scale")]
    }

    fn shape_strategy(&self) -> ShapeStrategy {
        ShapeStrategy::Univariate
    }

    fn support(&self) -> Support {
        Support::Continuous
    }

    fn log_prob_law(&self, x: &Tensor, parameters: &TensorMap) -> Result<Tensor> {
        let loc = get(parameters, self.name(), "loc")?;
        let scale = get(parameters, self.name(), "scale")?;
        try_map3(x, loc, scale, logpdf)
    }

    fn sample_law(&self, parameters: &TensorMap, rng: &mut dyn RngCore) -> Result<Tensor> {
        let loc = get(parameters, self.name(), "loc")?;
        let scale = get(parameters, self.name(), "scale")?;
        sample_map2(loc, scale, rng, draw)
    }
}
