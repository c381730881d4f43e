//! Probability building blocks for brancher.
//!
//! This crate hosts the distribution layer:
//! - shape utilities that align tensors in `(samples, datapoints, *event)` layout
//! - dtype coercion of raw user data into canonical tensors
//! - the [`Distribution`] trait and its shape strategies
//! - concrete laws (Normal, LogNormal, Cauchy, Laplace, Beta, Binomial,
//!   Categorical) and the resampling [`Empirical`] distribution
//!
//! Sampling always takes an explicit `&mut dyn RngCore`; seed a
//! `rand::rngs::StdRng` for reproducible draws.

pub mod math;
pub mod shape;
pub mod dtype;
pub mod params;
pub mod distribution;

pub mod beta;
pub mod binomial;
pub mod categorical;
pub mod cauchy;
pub mod empirical;
pub mod laplace;
pub mod lognormal;
pub mod normal;

pub use beta::Beta;
pub use binomial::{Binomial, BinomialSuccess};
pub use categorical::{Categorical, CategoricalEncoding, CategoricalParameters};
pub use cauchy::Cauchy;
pub use distribution::{Distribution, ShapeStrategy, Support};
pub use dtype::{RawData, coerce_json_str, coerce_to_dtype};
pub use empirical::{Empirical, EmpiricalConfig};
pub use laplace::Laplace;
pub use lognormal::LogNormal;
pub use normal::Normal;
pub use params::Requirement;
