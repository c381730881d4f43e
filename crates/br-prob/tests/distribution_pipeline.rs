//! End-to-end checks of the sample / log-probability pipeline.

use approx::assert_relative_eq;
use br_core::{Error, Tensor, Value, parameters};
use br_prob::{
    Beta, Binomial, Categorical, Cauchy, Distribution, Laplace, LogNormal, Normal, coerce_to_dtype,
};
use ndarray::{IxDyn, array};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn filled(shape: &[usize], v: f64) -> Tensor {
    Tensor::from_elem(IxDyn(shape), v)
}

fn tensor(shape: &[usize], values: Vec<f64>) -> Tensor {
    Tensor::from_shape_vec(IxDyn(shape), values).unwrap()
}

#[test]
fn test_continuous_sample_and_log_prob_shapes() {
    let (s, d) = (4, 3);
    let location_scale: [(Box<dyn Distribution>, &str, &str); 5] = [
        (Box::new(Normal), "loc", "scale"),
        (Box::new(LogNormal), "loc", "scale"),
        (Box::new(Cauchy), "loc", "scale"),
        (Box::new(Laplace), "loc", "scale"),
        (Box::new(Beta), "alpha", "beta"),
    ];
    let mut rng = StdRng::seed_from_u64(2024);
    for (dist, first, second) in location_scale {
        let params = parameters([
            (first, filled(&[s, 1, 1, 1], 2.0)),
            (second, filled(&[1, d, 1, 1], 3.0)),
        ]);
        let sample = dist.sample_tensor(&params, &mut rng).unwrap();
        assert_eq!(sample.shape(), &[s, d, 1, 1], "{}", dist.name());

        let lp = dist.calculate_log_probability(&sample, &params).unwrap();
        assert_eq!(lp.shape(), &[s, d], "{}", dist.name());
        assert!(lp.iter().all(|v| v.is_finite()), "{}", dist.name());
    }
}

#[test]
fn test_normal_end_to_end() {
    let params = parameters([
        ("loc", filled(&[1, 1, 1, 1], 0.0)),
        ("scale", filled(&[1000, 1, 1, 1], 1.0)),
    ]);
    let mut rng = StdRng::seed_from_u64(42);
    let sample = Normal.sample_tensor(&params, &mut rng).unwrap();
    assert_eq!(sample.shape(), &[1000, 1, 1, 1]);

    let n = sample.len() as f64;
    let mean = sample.sum() / n;
    let var = sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    assert!(mean.abs() < 0.1, "mean {}", mean);
    assert!((var - 1.0).abs() < 0.15, "var {}", var);

    let x = coerce_to_dtype(0.0, true).unwrap().into_tensor("x").unwrap();
    let unit = parameters([("loc", filled(&[1, 1], 0.0)), ("scale", filled(&[1, 1], 1.0))]);
    let lp = Normal.calculate_log_probability(&x, &unit).unwrap();
    assert_eq!(lp.shape(), &[1, 1]);
    let expected = -0.5 * (2.0 * std::f64::consts::PI).ln();
    assert_relative_eq!(lp.sum(), expected, epsilon = 1e-12);
    assert_relative_eq!(lp.sum(), -0.9189, epsilon = 1e-4);
}

#[test]
fn test_observed_data_scores_against_sampled_parameters() {
    let observed = coerce_to_dtype(array![0.5, -1.0, 2.0].into_dyn(), true)
        .unwrap()
        .into_tensor("x")
        .unwrap();
    assert_eq!(observed.shape(), &[1, 3, 1, 1]);

    let params = parameters([
        ("loc", tensor(&[2, 1, 1, 1], vec![0.0, 1.0])),
        ("scale", filled(&[1, 1, 1, 1], 1.0)),
    ]);
    let lp = Normal.calculate_log_probability(&observed, &params).unwrap();
    assert_eq!(lp.shape(), &[2, 3]);
    let expected = br_prob::normal::logpdf(2.0, 1.0, 1.0).unwrap();
    assert_relative_eq!(lp[[1, 2].as_slice()], expected, epsilon = 1e-12);
}

#[test]
fn test_missing_parameters_fail_before_computation() {
    let x = filled(&[1, 1], 0.0);
    let err = Normal
        .calculate_log_probability(&x, &parameters([("loc", filled(&[1, 1], 0.0))]))
        .unwrap_err();
    assert!(matches!(err, Error::MissingParameter { distribution: "Normal", .. }));
    assert!(err.to_string().contains("scale"));

    let mut rng = StdRng::seed_from_u64(0);
    let err = Categorical::default().get_sample(&parameters([("n", filled(&[1, 1], 1.0))]), &mut rng);
    assert!(matches!(err, Err(Error::MissingParameter { distribution: "Categorical", .. })));
}

#[test]
fn test_binomial_success_parameter_exclusivity() {
    let x = filled(&[1, 1, 1, 1], 3.0);
    let n = filled(&[1, 1, 1, 1], 10.0);

    let err = Binomial.calculate_log_probability(&x, &parameters([("n", n.clone())])).unwrap_err();
    assert!(matches!(err, Error::MissingParameter { distribution: "Binomial", .. }));

    let probs_only = parameters([("n", n.clone()), ("p", filled(&[1, 1, 1, 1], 0.3))]);
    let both = parameters([
        ("n", n.clone()),
        ("p", filled(&[1, 1, 1, 1], 0.3)),
        ("logit_p", filled(&[1, 1, 1, 1], 4.0)),
    ]);
    let lp_probs = Binomial.calculate_log_probability(&x, &probs_only).unwrap();
    let lp_both = Binomial.calculate_log_probability(&x, &both).unwrap();
    assert_eq!(lp_probs, lp_both);

    let expected = (120.0 * 0.3f64.powi(3) * 0.7f64.powi(7)).ln();
    assert_relative_eq!(lp_both.sum(), expected, epsilon = 1e-10);
}

#[test]
fn test_categorical_one_hot_and_index_paths_agree() {
    // Two datapoints, three classes, logits (1, 2, 3) for both.
    let logits = tensor(&[1, 2, 3, 1], vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    let params = parameters([("softmax_p", logits)]);
    let log_norm = (1f64.exp() + 2f64.exp() + 3f64.exp()).ln();

    // Classes 1 and 2 as one-hot rows.
    let one_hot = tensor(&[1, 2, 3, 1], vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    let lp_one_hot = Categorical::default().calculate_log_probability(&one_hot, &params).unwrap();

    // The same classes as integer labels.
    let labels = tensor(&[1, 2, 1, 1], vec![1.0, 2.0]);
    let lp_index = Categorical::default().calculate_log_probability(&labels, &params).unwrap();

    assert_eq!(lp_one_hot.shape(), &[1, 2]);
    assert_eq!(lp_index.shape(), &[1, 2]);
    assert_relative_eq!(lp_one_hot[[0, 0].as_slice()], 2.0 - log_norm, epsilon = 1e-12);
    assert_relative_eq!(lp_one_hot[[0, 1].as_slice()], 3.0 - log_norm, epsilon = 1e-12);
    for (a, b) in lp_one_hot.iter().zip(lp_index.iter()) {
        assert!(a.is_finite() && b.is_finite());
        assert!(*a < 0.0 && *b < 0.0);
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }

    // Labels 0..=2 read as indices even though the value set includes {0, 1}.
    let labels = tensor(&[1, 3, 1, 1], vec![0.0, 1.0, 2.0]);
    let logits = tensor(&[1, 1, 3, 1], vec![1.0, 2.0, 3.0]);
    let lp = Categorical::default()
        .calculate_log_probability(&labels, &parameters([("softmax_p", logits)]))
        .unwrap();
    let expected: Vec<f64> = [1.0, 2.0, 3.0].iter().map(|l| l - log_norm).collect();
    for (got, want) in lp.iter().zip(&expected) {
        assert_relative_eq!(*got, *want, epsilon = 1e-12);
    }
}

#[test]
fn test_symbols_rejected_where_tensors_are_required() {
    let params = parameters([
        ("loc", Value::Symbols(vec!["a".into()])),
        ("scale", Value::Tensor(filled(&[1, 1], 1.0))),
    ]);
    let err = Normal.calculate_log_probability(&filled(&[1, 1], 0.0), &params).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("loc"));
}

#[test]
fn test_distributions_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Normal>();
    assert_send_sync::<Categorical>();
    assert_send_sync::<br_prob::Empirical>();
    assert_send_sync::<Box<dyn Distribution + Send + Sync>>();
}
