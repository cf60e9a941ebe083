//! Error types for the sweep harness

use thiserror::Error;

/// Result type alias for sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Main error type for the sweep harness
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Dataset is not supported: {0}")]
    UnsupportedDataset(String),

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate configuration key: {0}")]
    DuplicateKey(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for SweepError {
    fn from(err: polars::error::PolarsError) -> Self {
        SweepError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        SweepError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SweepError {
    fn from(err: ndarray::ShapeError) -> Self {
        SweepError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
