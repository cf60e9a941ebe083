//! Regressor trait and regression metrics

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trait for the regressors swept over.
///
/// Estimators are opaque to the sweep: it only fits, predicts, and asks for
/// fresh unfitted copies so every fold starts from the same hyperparameters.
pub trait Regressor: Send + Sync + fmt::Debug {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Short family name used in logs
    fn name(&self) -> &'static str;

    /// A new, unfitted estimator with the same hyperparameters
    fn unfitted(&self) -> Box<dyn Regressor>;

    /// Whether `fit` has completed successfully
    fn is_fitted(&self) -> bool;
}

/// Metrics for one set of regression predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared
    pub r2: f64,
    /// Number of samples scored
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute metrics from targets and predictions
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;
        if y_true.is_empty() {
            return Self {
                mse: f64::NAN,
                mae: f64::NAN,
                r2: f64::NAN,
                n_samples: 0,
            };
        }

        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Self {
            mse,
            mae,
            r2,
            n_samples: y_true.len(),
        }
    }

    /// Element-wise mean of several metric sets
    pub fn mean(metrics: &[RegressionMetrics]) -> Option<Self> {
        if metrics.is_empty() {
            return None;
        }
        let k = metrics.len() as f64;
        Some(Self {
            mse: metrics.iter().map(|m| m.mse).sum::<f64>() / k,
            mae: metrics.iter().map(|m| m.mae).sum::<f64>() / k,
            r2: metrics.iter().map(|m| m.r2).sum::<f64>() / k,
            n_samples: metrics.iter().map(|m| m.n_samples).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![1.0, 2.0, 3.0, 5.0];
        let m = RegressionMetrics::compute(&y_true, &y_pred);
        assert!((m.mse - 0.25).abs() < 1e-12);
        assert!((m.mae - 0.25).abs() < 1e-12);
        assert!((m.r2 - 0.8).abs() < 1e-12);
        assert_eq!(m.n_samples, 4);
    }

    #[test]
    fn test_perfect_fit() {
        let y = array![3.0, 1.0, 2.0];
        let m = RegressionMetrics::compute(&y, &y);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_mean_of_metrics() {
        let a = RegressionMetrics { mse: 1.0, mae: 1.0, r2: 0.5, n_samples: 2 };
        let b = RegressionMetrics { mse: 3.0, mae: 2.0, r2: 0.7, n_samples: 3 };
        let m = RegressionMetrics::mean(&[a, b]).unwrap();
        assert_eq!(m.mse, 2.0);
        assert_eq!(m.mae, 1.5);
        assert!((m.r2 - 0.6).abs() < 1e-12);
        assert_eq!(m.n_samples, 5);
        assert!(RegressionMetrics::mean(&[]).is_none());
    }
}
