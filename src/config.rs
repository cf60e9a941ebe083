//! Sweep configuration

use crate::error::{Result, SweepError};
use crate::preprocessing::PreprocessingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one sweep run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Dataset name (`boston` or `abalone`)
    pub dataset: String,

    /// Seed for the row permutation and every estimator seed derived from it
    pub seed: u64,

    /// Directory holding the dataset files
    pub data_dir: PathBuf,

    /// Directory the results table is written to
    pub results_dir: PathBuf,

    /// Cross-validation folds used by the evaluation engine
    pub cv_folds: usize,

    /// Members per bagged ensemble entry
    pub ensemble_size: usize,

    /// Trees per random forest
    pub forest_size: usize,

    /// Shuffle rows during preprocessing
    pub shuffle: bool,

    /// Scale the loaded arrays in place instead of copying them
    pub in_place: bool,

    /// Worker threads for evaluation (`None` = rayon default)
    pub n_jobs: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            seed: 0,
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            cv_folds: 5,
            ensemble_size: 10,
            forest_size: 100,
            shuffle: true,
            in_place: false,
            n_jobs: None,
        }
    }
}

impl SweepConfig {
    /// Create a configuration for `dataset` with defaults everywhere else
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_ensemble_size(mut self, n: usize) -> Self {
        self.ensemble_size = n;
        self
    }

    pub fn with_forest_size(mut self, n: usize) -> Self {
        self.forest_size = n;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Preprocessing options carried by this configuration
    pub fn preprocessing(&self) -> PreprocessingConfig {
        PreprocessingConfig::new()
            .with_shuffle(self.shuffle)
            .with_in_place(self.in_place)
    }

    /// Reject values that would make the sweep meaningless
    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(SweepError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.ensemble_size == 0 {
            return Err(SweepError::ConfigError("ensemble_size must be positive".to_string()));
        }
        if self.forest_size == 0 {
            return Err(SweepError::ConfigError("forest_size must be positive".to_string()));
        }
        if self.n_jobs == Some(0) {
            return Err(SweepError::ConfigError("n_jobs must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SweepConfig::new("boston");
        assert_eq!(config.seed, 0);
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.ensemble_size, 10);
        assert_eq!(config.forest_size, 100);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.validate().is_ok());
        assert!(!config.preprocessing().in_place);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SweepConfig::new("boston").with_cv_folds(1).validate().is_err());
        assert!(SweepConfig::new("boston").with_ensemble_size(0).validate().is_err());
        assert!(SweepConfig::new("boston").with_forest_size(0).validate().is_err());
        assert!(SweepConfig::new("boston").with_n_jobs(Some(0)).validate().is_err());
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dataset": "abalone", "seed": 7, "cv_folds": 3}}"#).unwrap();
        let config = SweepConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.dataset, "abalone");
        assert_eq!(config.seed, 7);
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.ensemble_size, 10);
        assert!(config.shuffle);
    }

    #[test]
    fn test_from_json_file_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            SweepConfig::from_json_file(file.path()),
            Err(SweepError::SerializationError(_))
        ));
    }
}
