//! Error types for brancher

use thiserror::Error;

/// brancher error type
#[derive(Error, Debug)]
pub enum Error {
    /// A required parameter, or every alternative of a required group, is absent.
    #[error("Missing parameter for {distribution}: expected {missing}")]
    MissingParameter {
        /// Distribution that rejected the call.
        distribution: &'static str,
        /// Human-readable description of the missing parameter group.
        missing: String,
    },

    /// Dtype coercion received an input kind it cannot represent.
    #[error(
        "Invalid input dtype {0} - expected float, integer, numeric array, tensor or discrete collection"
    )]
    InvalidDtype(String),

    /// Empirical sampling indices of an unrecognized shape or content.
    #[error("Invalid indices: {0}")]
    InvalidIndices(String),

    /// Sampling without replacement asked for more items than exist.
    #[error(
        "Infeasible sampling request: batch size {batch_size} exceeds dataset size {dataset_size} (sampling is without replacement)"
    )]
    InfeasibleSampling {
        /// Requested number of draws.
        batch_size: usize,
        /// Number of available datapoints.
        dataset_size: usize,
    },

    /// Tensors that cannot be broadcast or reshaped together.
    #[error("Shape error: {0}")]
    Shape(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
