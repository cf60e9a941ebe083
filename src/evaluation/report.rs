//! Evaluation results and their CSV form

use crate::error::Result;
use crate::training::RegressionMetrics;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Outcome of evaluating one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub key: String,
    /// Estimator family name
    pub family: String,
    pub folds: usize,
    /// Training metrics averaged over folds (`None` when evaluation failed)
    pub train: Option<RegressionMetrics>,
    /// Held-out metrics averaged over folds
    pub test: Option<RegressionMetrics>,
    /// Total fit time over all folds
    pub fit_seconds: f64,
    pub error: Option<String>,
}

impl ResultRow {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Every result row of a sweep and where it was written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rows: Vec<ResultRow>,
    pub destination: PathBuf,
}

impl EvaluationReport {
    /// Rows sorted by key
    pub fn new(mut rows: Vec<ResultRow>, destination: impl Into<PathBuf>) -> Self {
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            rows,
            destination: destination.into(),
        }
    }

    pub fn n_failed(&self) -> usize {
        self.rows.iter().filter(|r| !r.succeeded()).count()
    }

    /// Row with the lowest held-out MSE
    pub fn best(&self) -> Option<&ResultRow> {
        self.rows
            .iter()
            .filter_map(|r| r.test.map(|m| (r, m.mse)))
            .filter(|(_, mse)| mse.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(r, _)| r)
    }

    /// Results as a table, one row per configuration
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let metric = |pick: fn(&ResultRow) -> Option<RegressionMetrics>,
                      f: fn(&RegressionMetrics) -> f64|
         -> Vec<Option<f64>> {
            self.rows.iter().map(|r| pick(r).map(|m| f(&m))).collect()
        };

        let df = DataFrame::new(vec![
            Series::new("key".into(), self.rows.iter().map(|r| r.key.clone()).collect::<Vec<_>>()).into(),
            Series::new("family".into(), self.rows.iter().map(|r| r.family.clone()).collect::<Vec<_>>()).into(),
            Series::new("folds".into(), self.rows.iter().map(|r| r.folds as u32).collect::<Vec<_>>()).into(),
            Series::new("train_mse".into(), metric(|r| r.train, |m| m.mse)).into(),
            Series::new("train_mae".into(), metric(|r| r.train, |m| m.mae)).into(),
            Series::new("train_r2".into(), metric(|r| r.train, |m| m.r2)).into(),
            Series::new("test_mse".into(), metric(|r| r.test, |m| m.mse)).into(),
            Series::new("test_mae".into(), metric(|r| r.test, |m| m.mae)).into(),
            Series::new("test_r2".into(), metric(|r| r.test, |m| m.r2)).into(),
            Series::new("fit_seconds".into(), self.rows.iter().map(|r| r.fit_seconds).collect::<Vec<_>>()).into(),
            Series::new(
                "error".into(),
                self.rows
                    .iter()
                    .map(|r| r.error.clone().unwrap_or_default())
                    .collect::<Vec<_>>(),
            )
            .into(),
        ])?;
        Ok(df)
    }

    /// Write the table as CSV to `path`, creating parent directories
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        Ok(())
    }
}
