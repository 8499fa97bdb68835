//! Error types for gmx

use thiserror::Error;

/// gmx error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed flat parameter vector.
    #[error("invalid parameter shape: {0}")]
    InvalidParameterShape(String),

    /// Query point dimensionality disagrees with the model dimensionality.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Component list and weight vector lengths disagree.
    #[error("component count mismatch: {components} components vs {weights} weights")]
    ComponentCountMismatch {
        /// Number of components.
        components: usize,
        /// Number of weights.
        weights: usize,
    },

    /// A mixture requires at least one component.
    #[error("mixture must contain at least one component")]
    EmptyMixture,

    /// Mixing weights are not a valid probability vector.
    #[error("invalid mixture weights: {0}")]
    InvalidMixtureWeights(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
