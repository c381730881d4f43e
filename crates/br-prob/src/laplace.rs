//! Laplace distribution.

use br_core::{Result, Tensor, TensorMap};
use rand::distr::Open01;
use rand::{Rng, RngCore};

use crate::distribution::{Distribution, ShapeStrategy, Support, sample_map2, try_map3};
use crate::params::{Requirement, check_positive, get};

/// Log-PDF of `Laplace(loc, scale)` at `x`.
///
/// `log p(x) = -ln(2 scale) - |x - loc| / scale`
pub fn logpdf(x: f64, loc: f64, scale: f64) -> Result<f64> {
    check_positive("scale", scale)?;
    Ok(-(2.0 * scale).ln() - (x - loc).abs() / scale)
}

/// Inverse-CDF draw with `u ~ U(-1/2, 1/2)`.
fn draw(loc: f64, scale: f64, rng: &mut dyn RngCore) -> Result<f64> {
    check_positive("scale", scale)?;
    let u: f64 = rng.sample::<f64, _>(Open01) - 0.5;
    Ok(loc - scale * u.signum() * (-2.0 * u.abs()).ln_1p())
}

/// Laplace with parameters `loc` and `scale`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Laplace;

impl Distribution for Laplace {
    fn name(&self) -> &'static str {
        "Laplace"
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
