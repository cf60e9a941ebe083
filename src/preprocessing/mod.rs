//! Data preprocessing module
//!
//! Prepares a raw feature matrix for the sweep:
//! - Per-column symmetric min-max scaling into [-1, 1]
//! - A single random row permutation applied to features and target alike

mod config;
mod pipeline;
mod scaler;

pub use config::PreprocessingConfig;
pub use pipeline::{shuffle_rows, Preprocessed, Preprocessor};
pub use scaler::SymmetricScaler;
