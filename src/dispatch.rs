//! Hands a complete configuration set to the evaluation engine

use crate::datasets::Dataset;
use crate::error::{Result, SweepError};
use crate::evaluation::{EvaluationEngine, EvaluationReport};
use crate::grid::ConfigurationSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Results file for a dataset: `<results_dir>/<dataset>.csv`
pub fn results_destination(results_dir: impl AsRef<Path>, dataset: Dataset) -> PathBuf {
    results_dir.as_ref().join(format!("{}.csv", dataset.name()))
}

/// Invokes the engine exactly once with the whole set
#[derive(Debug)]
pub struct Dispatcher<E: EvaluationEngine> {
    engine: E,
}

impl<E: EvaluationEngine> Dispatcher<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Dispatch `set`; an empty set means the grid was never built and is refused
    pub fn dispatch(&self, set: &ConfigurationSet, destination: &Path) -> Result<EvaluationReport> {
        if set.is_empty() {
            return Err(SweepError::ConfigError(
                "refusing to dispatch an empty configuration set".to_string(),
            ));
        }
        info!(
            entries = set.len(),
            destination = %destination.display(),
            "dispatching configuration set"
        );
        self.engine.evaluate_all(set, destination)
    }
}
