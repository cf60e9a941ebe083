//! Evaluation engine
//!
//! Consumes a whole configuration set in one call, fits and scores every
//! estimator, and persists the results table.

mod engine;
mod report;

pub use engine::CrossValidationEngine;
pub use report::{EvaluationReport, ResultRow};

use crate::error::Result;
use crate::grid::ConfigurationSet;
use std::path::Path;

/// Sink for a complete configuration set
pub trait EvaluationEngine {
    /// Evaluate every entry and write the results to `destination`
    fn evaluate_all(&self, set: &ConfigurationSet, destination: &Path) -> Result<EvaluationReport>;
}
