//! Normal distribution.

use br_core::{Result, Tensor, TensorMap};
use rand::RngCore;
use rand_distr::{Distribution as _, StandardNormal};

use crate::distribution::{Distribution, ShapeStrategy, Support, sample_map2, try_map3};
use crate::math::LN_SQRT_2PI;
use crate::params::{Requirement, check_positive, get};

/// Log-PDF of a Normal distribution `N(loc, scale)` at `x`.
///
/// `log p(x) = -0.5 * ((x-loc)/scale)^2 - ln(scale) - ln(sqrt(2π))`
pub fn logpdf(x: f64, loc: f64, scale: f64) -> Result<f64> {
    check_positive("scale", scale)?;
    let z = (x - loc) / scale;
    Ok(-0.5 * z * z - scale.ln() - LN_SQRT_2PI)
}

/// Negative log-likelihood for a Normal distribution `N(loc, scale)` at `x`.
pub fn nll(x: f64, loc: f64, scale: f64) -> Result<f64> {
    Ok(-logpdf(x, loc, scale)?)
}

/// Location-scale reparameterised draw: `loc + scale * eps` with `eps ~ N(0, 1)`.
pub(crate) fn draw(loc: f64, scale: f64, rng: &mut dyn RngCore) -> Result<f64> {
    check_positive("scale", scale)?;
    let eps: f64 = StandardNormal.sample(rng);
    Ok(loc + scale * eps)
}

/// Univariate Normal with parameters `loc` and `scale`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normal;

impl Distribution for Normal {
    fn name(&self) -> &'static str {
        "Normal"
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
