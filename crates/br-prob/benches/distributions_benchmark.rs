use br_core::{Tensor, parameters};
use br_prob::{Categorical, Distribution, Normal};
use criterion::{Criterion, criterion_group, criterion_main};
use ndarray::IxDyn;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

fn bench_scalar_laws(c: &mut Criterion) {
    let xs: Vec<f64> = (0..10_000).map(|i| (i as f64) * 0.001 - 5.0).collect();

    c.bench_function("normal_logpdf_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += br_prob::normal::logpdf(x, 0.0, 1.3).unwrap();
            }
            black_box(acc)
        })
    });

    let ks: Vec<f64> = (0..10_000).map(|i| (i % 30) as f64).collect();
    c.bench_function("binomial_logpmf_logit_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &k in &ks {
                acc += br_prob::binomial::logpmf_logit(k, 30.0, -0.4).unwrap();
            }
            black_box(acc)
        })
    });

    let betas: Vec<f64> = (0..10_000).map(|i| ((i as f64) + 0.5) / 10_000.0).collect();
    c.bench_function("beta_logpdf_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &betas {
                acc += br_prob::beta::logpdf(x, 2.2, 3.3).unwrap();
            }
            black_box(acc)
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let (s, d) = (100, 100);
    let normal_params = parameters([
        ("loc", Tensor::zeros(IxDyn(&[s, 1, 1, 1]))),
        ("scale", Tensor::ones(IxDyn(&[1, d, 1, 1]))),
    ]);
    let mut rng = StdRng::seed_from_u64(0);
    let x = Normal.sample_tensor(&normal_params, &mut rng).unwrap();

    c.bench_function("normal_sample_100x100", |b| {
        b.iter(|| black_box(Normal.sample_tensor(&normal_params, &mut rng).unwrap()))
    });
    c.bench_function("normal_log_prob_100x100", |b| {
        b.iter(|| black_box(Normal.calculate_log_probability(&x, &normal_params).unwrap()))
    });

    let classes = 10;
    let logits = Tensor::from_shape_fn(IxDyn(&[s, d, classes, 1]), |ix| (ix[2] as f64) * 0.1);
    let categorical_params = parameters([("softmax_p", logits)]);
    let labels = Tensor::from_shape_fn(IxDyn(&[1, d, 1, 1]), |ix| (ix[1] % classes) as f64);

    c.bench_function("categorical_sample_100x100x10", |b| {
        b.iter(|| {
            black_box(Categorical::default().sample_tensor(&categorical_params, &mut rng).unwrap())
        })
    });
    c.bench_function("categorical_log_prob_index_100x100x10", |b| {
        b.iter(|| {
            black_box(
                Categorical::default()
                    .calculate_log_probability(&labels, &categorical_params)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_scalar_laws, bench_pipeline);
criterion_main!(benches);
