//! # br-core
//!
//! Shared types for brancher: the error taxonomy and the canonical data
//! carried between the model graph and the distribution layer.

#![warn(missing_docs)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Parameters, SampleIndices, SampleShape, Tensor, TensorMap, Value, parameters};
