//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// Configuration for the sweep preprocessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Whether to permute the rows after scaling
    pub shuffle: bool,

    /// Scale the caller's buffers instead of allocating new ones.
    /// Only honoured by `Preprocessor::run`, which takes ownership.
    pub in_place: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            shuffle: true,
            in_place: false,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable or disable the row permutation
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Builder method to reuse the caller's buffers
    pub fn with_in_place(mut self, in_place: bool) -> Self {
        self.in_place = in_place;
        self
    }
}
