//! Support vector regression with an RBF kernel
//!
//! Trained with dual coordinate descent on the epsilon-insensitive loss.
//! The target is centred before training and the mean is used as the bias.

use super::Regressor;
use crate::error::{Result, SweepError};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Above this many samples kernel columns are computed on demand instead of cached
const MAX_CACHED_KERNEL_SAMPLES: usize = 2_000;

/// RBF kernel width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// `1 / n_features`, resolved when the model is fitted
    Auto,
    /// Explicit width
    Value(f64),
}

impl Gamma {
    /// Concrete gamma for data with `n_features` columns
    pub fn resolve(&self, n_features: usize) -> f64 {
        match self {
            Gamma::Auto => 1.0 / n_features.max(1) as f64,
            Gamma::Value(g) => *g,
        }
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Auto => f.write_str("auto"),
            Gamma::Value(g) => write!(f, "{:?}", g),
        }
    }
}

/// SVR configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// RBF kernel width
    pub gamma: Gamma,
    /// Epsilon (half-width of the insensitive tube)
    pub epsilon: f64,
    /// Stop when no dual coefficient moves more than this in an epoch
    pub tol: f64,
    /// Maximum number of epochs over the training set
    pub max_iter: usize,
}

impl Default for SvrConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: Gamma::Auto,
            epsilon: 0.1,
            tol: 1e-3,
            max_iter: 200,
        }
    }
}

/// Support Vector Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmRegressor {
    config: SvrConfig,
    support_vectors: Option<Array2<f64>>,
    /// Dual coefficients of the support vectors
    coefficients: Option<Array1<f64>>,
    gamma: f64,
    bias: f64,
}

impl SvmRegressor {
    pub fn new(config: SvrConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            coefficients: None,
            gamma: 0.0,
            bias: 0.0,
        }
    }

    pub fn config(&self) -> &SvrConfig {
        &self.config
    }

    /// Validate hyperparameters
    pub fn validate(&self) -> Result<()> {
        let c = &self.config;
        if !(c.c > 0.0) {
            return Err(SweepError::InvalidParameter {
                name: "C".to_string(),
                value: c.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if let Gamma::Value(g) = c.gamma {
            if !(g > 0.0) {
                return Err(SweepError::InvalidParameter {
                    name: "gamma".to_string(),
                    value: g.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        }
        if !(c.epsilon >= 0.0) {
            return Err(SweepError::InvalidParameter {
                name: "epsilon".to_string(),
                value: c.epsilon.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    fn rbf(gamma: f64, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let sq: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum();
        (-gamma * sq).exp()
    }

    fn kernel_column(&self, x: &Array2<f64>, i: usize) -> Array1<f64> {
        let xi = x.row(i);
        Array1::from_iter(x.rows().into_iter().map(|xj| Self::rbf(self.gamma, xi, xj)))
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let val = Self::rbf(self.gamma, x.row(i), x.row(j));
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }
}

impl Regressor for SvmRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.validate()?;
        let n = x.nrows();
        if n != y.len() {
            return Err(SweepError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n == 0 {
            return Err(SweepError::TrainingError("no training samples".to_string()));
        }

        self.gamma = self.config.gamma.resolve(x.ncols());
        self.bias = y.mean().unwrap_or(0.0);
        let y_c = y - self.bias;

        let cached = if n <= MAX_CACHED_KERNEL_SAMPLES {
            Some(self.compute_kernel_matrix(x))
        } else {
            None
        };

        let c = self.config.c;
        let eps = self.config.epsilon;
        let mut beta: Array1<f64> = Array1::zeros(n);
        // f = K * beta, maintained incrementally
        let mut f: Array1<f64> = Array1::zeros(n);

        for _epoch in 0..self.config.max_iter {
            let mut max_change: f64 = 0.0;

            for i in 0..n {
                let column = match &cached {
                    Some(k) => k.column(i).to_owned(),
                    None => self.kernel_column(x, i),
                };
                let k_ii = column[i].max(1e-12);
                let g = f[i] - y_c[i];

                // Closed-form minimiser of the one-dimensional subproblem
                let z = beta[i] - g / k_ii;
                let shrunk = z.signum() * (z.abs() - eps / k_ii).max(0.0);
                let new_beta = shrunk.clamp(-c, c);
                let delta = new_beta - beta[i];

                if delta != 0.0 {
                    f.scaled_add(delta, &column);
                    beta[i] = new_beta;
                    max_change = max_change.max(delta.abs());
                }
            }

            if max_change < self.config.tol {
                break;
            }
        }

        let support: Vec<usize> = beta
            .iter()
            .enumerate()
            .filter(|(_, b)| b.abs() > 1e-8)
            .map(|(i, _)| i)
            .collect();

        self.support_vectors = Some(x.select(ndarray::Axis(0), &support));
        self.coefficients = Some(Array1::from_iter(support.iter().map(|&i| beta[i])));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (sv, coef) = match (&self.support_vectors, &self.coefficients) {
            (Some(sv), Some(coef)) => (sv, coef),
            _ => return Err(SweepError::ModelNotFitted),
        };
        if sv.nrows() > 0 && x.ncols() != sv.ncols() {
            return Err(SweepError::ShapeError {
                expected: format!("{} features", sv.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(Array1::from_iter(x.rows().into_iter().map(|row| {
            self.bias
                + sv.rows()
                    .into_iter()
                    .zip(coef.iter())
                    .map(|(s, &b)| b * Self::rbf(self.gamma, s, row))
                    .sum::<f64>()
        })))
    }

    fn name(&self) -> &'static str {
        "svr"
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(SvmRegressor::new(self.config.clone()))
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}
