//! Log-normal distribution.

use br_core::{Result, Tensor, TensorMap};
use rand::RngCore;

use crate::distribution::{Distribution, ShapeStrategy, Support, sample_map2, try_map3};
use crate::params::{Requirement, get};

/// Log-PDF of `LogNormal(loc, scale)` at `x`: the Normal density of `ln x`
/// minus the Jacobian term `ln x`.
///
/// Support: `x > 0`; returns `-inf` elsewhere.
pub fn logpdf(x: f64, loc: f64, scale: f64) -> Result<f64> {
    if x <= 0.0 {
        crate::params::check_positive("scale", scale)?;
        return Ok(f64::NEG_INFINITY);
    }
    let ln_x = x.ln();
    Ok(crate::normal::logpdf(ln_x, loc, scale)? - ln_x)
}

/// Log-normal with parameters `loc` and `scale` of the underlying Normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogNormal;

impl Distribution for LogNormal {
    fn name(&self) -> &'static str {
        "LogNormal"
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
        sample_map2(loc, scale, rng, |m, s, rng| Ok(crate::normal::draw(m, s, rng)?.exp()))
    }
}
