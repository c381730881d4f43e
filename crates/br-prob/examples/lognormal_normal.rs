//! Normal model with a LogNormal scale prior.
//!
//! Draws synthetic observations from `Normal(-2, 1)`, samples the priors
//! `mu ~ Normal(0, 10)` and `nu ~ LogNormal(0, 1)`, scores minibatches of
//! the data under every prior draw and reports importance-weighted posterior
//! means.
//!
//! Run with `cargo run -p br-prob --example lognormal_normal`.

use br_core::{Result, Tensor, parameters};
use br_prob::{Distribution, Empirical, LogNormal, Normal, coerce_to_dtype};
use ndarray::{Axis, IxDyn};
use rand::SeedableRng;
use rand::rngs::StdRng;

const MU_REAL: f64 = -2.0;
const NU_REAL: f64 = 1.0;
const NUMBER_DATAPOINTS: usize = 50;
const NUMBER_SAMPLES: usize = 5000;
const BATCH_SIZE: usize = 20;

fn scalar(v: f64) -> Tensor {
    Tensor::from_elem(IxDyn(&[1, 1, 1, 1]), v)
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(2018);

    // Observations: one sample of NUMBER_DATAPOINTS draws from the real model.
    let real = parameters([
        ("loc", scalar(MU_REAL)),
        ("scale", Tensor::from_elem(IxDyn(&[1, NUMBER_DATAPOINTS, 1, 1]), NU_REAL)),
    ]);
    let draws = Normal.sample_tensor(&real, &mut rng)?;
    let observed = coerce_to_dtype(draws.index_axis(Axis(0), 0).to_owned(), true)?;

    // Prior draws laid out along the sample axis.
    let mu_prior = parameters([
        ("loc", scalar(0.0)),
        ("scale", Tensor::from_elem(IxDyn(&[NUMBER_SAMPLES, 1, 1, 1]), 10.0)),
    ]);
    let nu_prior = parameters([
        ("loc", scalar(0.0)),
        ("scale", Tensor::from_elem(IxDyn(&[NUMBER_SAMPLES, 1, 1, 1]), 1.0)),
    ]);
    let mu = Normal.sample_tensor(&mu_prior, &mut rng)?;
    let nu = LogNormal.sample_tensor(&nu_prior, &mut rng)?;

    // Score a minibatch of the observations under every prior draw.
    let minibatch = Empirical::new(BATCH_SIZE, true)
        .sample_tensor(&parameters([("dataset", observed)]), &mut rng)?;
    let likelihood = parameters([("loc", mu.clone()), ("scale", nu.clone())]);
    let log_lik = Normal.calculate_log_probability(&minibatch, &likelihood)?;
    let rescale = NUMBER_DATAPOINTS as f64 / BATCH_SIZE as f64;
    let log_weights: Vec<f64> = log_lik.sum_axis(Axis(1)).iter().map(|l| l * rescale).collect();

    let max = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = log_weights.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    let posterior_mean = |values: &Tensor| -> f64 {
        values.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>() / total
    };

    let mean_log_lik = log_lik.mean().unwrap_or(f64::NAN);
    let ess = total * total / weights.iter().map(|w| w * w).sum::<f64>();
    println!("mean minibatch log-likelihood per datapoint: {:.4}", mean_log_lik);
    println!("effective sample size: {:.1} of {}", ess, NUMBER_SAMPLES);
    println!("posterior mean mu: {:.3} (real {})", posterior_mean(&mu), MU_REAL);
    println!("posterior mean nu: {:.3} (real {})", posterior_mean(&nu), NU_REAL);
    Ok(())
}
