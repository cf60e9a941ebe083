//! K-fold cross-validation engine

use super::report::{EvaluationReport, ResultRow};
use super::EvaluationEngine;
use crate::error::{Result, SweepError};
use crate::grid::{ConfigurationEntry, ConfigurationSet};
use crate::training::{KFold, RegressionMetrics};
use ndarray::Axis;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fits every configuration on K folds in parallel and writes one CSV row per key
#[derive(Debug, Clone)]
pub struct CrossValidationEngine {
    folds: usize,
    seed: u64,
    n_jobs: Option<usize>,
}

impl CrossValidationEngine {
    pub fn new(folds: usize) -> Self {
        Self {
            folds,
            seed: 0,
            n_jobs: None,
        }
    }

    /// Seed for the fold assignment
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Worker threads (`None` = rayon default)
    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Evaluate one entry. Estimator failures end up in the row, not in the return value.
    pub fn evaluate_entry(&self, entry: &ConfigurationEntry) -> ResultRow {
        let mut row = ResultRow {
            key: entry.key.clone(),
            family: entry.estimator.name().to_string(),
            folds: self.folds,
            train: None,
            test: None,
            fit_seconds: 0.0,
            error: None,
        };

        match self.cross_validate(entry, &mut row.fit_seconds) {
            Ok((train, test)) => {
                row.train = Some(train);
                row.test = Some(test);
            }
            Err(e) => {
                warn!(key = %entry.key, error = %e, "configuration failed");
                row.error = Some(e.to_string());
            }
        }
        row
    }

    fn cross_validate(
        &self,
        entry: &ConfigurationEntry,
        fit_seconds: &mut f64,
    ) -> Result<(RegressionMetrics, RegressionMetrics)> {
        let data = &entry.data;
        let splits = KFold::new(self.folds)
            .with_random_state(self.seed)
            .split(data.n_samples())?;

        let mut train_metrics = Vec::with_capacity(splits.len());
        let mut test_metrics = Vec::with_capacity(splits.len());

        for split in &splits {
            let x_train = data.x.select(Axis(0), &split.train_indices);
            let y_train = data.y.select(Axis(0), &split.train_indices);
            let x_test = data.x.select(Axis(0), &split.test_indices);
            let y_test = data.y.select(Axis(0), &split.test_indices);

            let mut model = entry.estimator.unfitted();
            let start = Instant::now();
            model.fit(&x_train, &y_train)?;
            *fit_seconds += start.elapsed().as_secs_f64();

            let train_pred = model.predict(&x_train)?;
            let test_pred = model.predict(&x_test)?;
            if test_pred.iter().any(|p| !p.is_finite()) {
                return Err(SweepError::ComputationError(
                    "non-finite predictions".to_string(),
                ));
            }
            train_metrics.push(RegressionMetrics::compute(&y_train, &train_pred));
            test_metrics.push(RegressionMetrics::compute(&y_test, &test_pred));
            debug!(key = %entry.key, fold = split.fold_idx, "fold done");
        }

        match (
            RegressionMetrics::mean(&train_metrics),
            RegressionMetrics::mean(&test_metrics),
        ) {
            (Some(train), Some(test)) => Ok((train, test)),
            _ => Err(SweepError::ComputationError("no folds evaluated".to_string())),
        }
    }

    fn evaluate_parallel(&self, set: &ConfigurationSet) -> Vec<ResultRow> {
        let entries: Vec<&ConfigurationEntry> = set.iter().collect();
        entries.par_iter().map(|e| self.evaluate_entry(e)).collect()
    }
}

impl EvaluationEngine for CrossValidationEngine {
    fn evaluate_all(&self, set: &ConfigurationSet, destination: &Path) -> Result<EvaluationReport> {
        if self.folds < 2 {
            return Err(SweepError::ConfigError(format!(
                "cv folds must be at least 2, got {}",
                self.folds
            )));
        }

        let start = Instant::now();
        let rows = match self.n_jobs {
            Some(n_workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n_workers)
                    .build()
                    .map_err(|e| SweepError::ConfigError(format!("Thread pool error: {}", e)))?;
                pool.install(|| self.evaluate_parallel(set))
            }
            None => self.evaluate_parallel(set),
        };

        let report = EvaluationReport::new(rows, destination);
        report.write_csv(destination)?;

        info!(
            entries = report.rows.len(),
            failed = report.n_failed(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            destination = %destination.display(),
            "evaluation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ConfigurationRegistry, Family, FamilySpec, SweepData};
    use ndarray::{Array1, Array2};

    fn linear_set() -> ConfigurationSet {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| ((i * 5 + j * 3) % 13) as f64 / 6.0 - 1.0);
        let y: Array1<f64> = x.column(0).mapv(|v| 2.0 * v) + &x.column(1) + 0.5;
        let families = vec![
            FamilySpec::fixed(Family::Ridge { alpha: 1e-5 }, "lr"),
            FamilySpec::fixed(Family::Ridge { alpha: 10.0 }, "ridge 10.0"),
        ];
        ConfigurationRegistry::new(families)
            .build(SweepData::new(x, y).unwrap())
            .unwrap()
    }

    #[test]
    fn test_evaluates_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("toy.csv");
        let report = CrossValidationEngine::new(3)
            .with_n_jobs(Some(2))
            .evaluate_all(&linear_set(), &dest)
            .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.n_failed(), 0);
        assert_eq!(report.best().unwrap().key, "lr");
        assert!(report.rows[0].test.unwrap().mse < 1e-6);
        assert!(dest.exists());
    }

    #[test]
    fn test_too_few_samples_is_recorded_not_fatal() {
        let families = vec![FamilySpec::fixed(Family::Ridge { alpha: 1.0 }, "lr")];
        let set = ConfigurationRegistry::new(families)
            .build(SweepData::new(Array2::zeros((2, 1)), Array1::zeros(2)).unwrap())
            .unwrap();
        let row = CrossValidationEngine::new(5).evaluate_entry(set.get("lr").unwrap());
        assert!(!row.succeeded());
        assert!(row.test.is_none());
    }

    #[test]
    fn test_single_fold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = CrossValidationEngine::new(1)
            .evaluate_all(&linear_set(), &dir.path().join("x.csv"))
            .unwrap_err();
        assert!(matches!(err, SweepError::ConfigError(_)));
    }
}
