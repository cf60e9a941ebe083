//! Ridge regression, used for the linear baselines and for every plane of
//! the clusterwise regressors

use super::Regressor;
use crate::error::{Result, SweepError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Solve symmetric positive-definite system Ax = b using Cholesky decomposition.
/// Retries once with a small diagonal jitter if the matrix is not positive definite.
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }
    if let Some(x) = cholesky_solve_inner(a, b) {
        return Some(x);
    }

    let mut a_reg = a.clone();
    let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>().max(1e-12) / n as f64;
    for k in 0..n {
        a_reg[[k, k]] += ridge;
    }
    cholesky_solve_inner(&a_reg, b)
}

fn cholesky_solve_inner(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan elimination with partial pivoting (fallback for Cholesky)
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }
        if aug[[col, col]].abs() < 1e-12 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..=n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..=n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Ridge Regression (L2-regularized linear regression)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    pub fit_intercept: bool,
    /// L2 regularization strength
    pub alpha: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            alpha,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Validate hyperparameters
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha >= 0.0) || !self.alpha.is_finite() {
            return Err(SweepError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be finite and non-negative".to_string(),
            });
        }
        Ok(())
    }

    /// Fit with optional per-sample weights (weighted least squares + L2)
    pub fn fit_weighted(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        sample_weight: Option<&Array1<f64>>,
    ) -> Result<&mut Self> {
        self.validate()?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(SweepError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(SweepError::TrainingError("no training samples".to_string()));
        }

        let w = match sample_weight {
            Some(w) if w.len() != n_samples => {
                return Err(SweepError::ShapeError {
                    expected: format!("weight length = {}", n_samples),
                    actual: format!("weight length = {}", w.len()),
                })
            }
            Some(w) => w.clone(),
            None => Array1::ones(n_samples),
        };
        let w_sum = w.sum();
        if !(w_sum > 0.0) {
            return Err(SweepError::TrainingError("sample weights sum to zero".to_string()));
        }

        let (x_mean, y_mean) = if self.fit_intercept {
            let xm = x.t().dot(&w) / w_sum;
            let ym = y.dot(&w) / w_sum;
            (xm, ym)
        } else {
            (Array1::zeros(n_features), 0.0)
        };

        let x_c = x - &x_mean.clone().insert_axis(Axis(0));
        let y_c = y - y_mean;
        let sqrt_w = w.mapv(f64::sqrt);
        let x_w = &x_c * &sqrt_w.clone().insert_axis(Axis(1));
        let y_w = &y_c * &sqrt_w;

        let mut xtx = x_w.t().dot(&x_w);
        for i in 0..n_features {
            xtx[[i, i]] += self.alpha;
        }
        let xty = x_w.t().dot(&y_w);

        let coefficients = cholesky_solve(&xtx, &xty)
            .or_else(|| gauss_jordan_solve(&xtx, &xty))
            .ok_or_else(|| SweepError::ComputationError("Singular matrix".to_string()))?;

        self.intercept = Some(y_mean - coefficients.dot(&x_mean));
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    /// R² on the given data
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let p = Regressor::predict(self, x)?;
        let ym = y.mean().unwrap_or(0.0);
        let ss_res = (&p - y).mapv(|v| v * v).sum();
        let ss_tot = y.mapv(|v| (v - ym).powi(2)).sum();
        Ok(if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot })
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.fit_weighted(x, y, None)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(SweepError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(SweepError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    fn name(&self) -> &'static str {
        "ridge"
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        let mut fresh = RidgeRegression::new(self.alpha);
        fresh.fit_intercept = self.fit_intercept;
        Box::new(fresh)
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ridge_recovers_line() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 0.5]];
        let y = x.column(0).mapv(|v| 2.0 * v + 1.0) + &x.column(1).mapv(|v| -3.0 * v);
        let mut model = RidgeRegression::new(1e-8);
        Regressor::fit(&mut model, &x, &y).unwrap();
        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-5);
        assert!((coef[1] + 3.0).abs() < 1e-5);
        assert!((model.intercept.unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ridge_shrinks_with_alpha() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut weak = RidgeRegression::new(0.01);
        let mut strong = RidgeRegression::new(100.0);
        Regressor::fit(&mut weak, &x, &y).unwrap();
        Regressor::fit(&mut strong, &x, &y).unwrap();
        let cw = weak.coefficients.as_ref().unwrap()[0];
        let cs = strong.coefficients.as_ref().unwrap()[0];
        assert!(cs.abs() < cw.abs());
        assert!(weak.score(&x, &y).unwrap() > 0.99);
    }

    #[test]
    fn test_weighted_fit_ignores_zero_weight_rows() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 2.0, 100.0];
        let w = array![1.0, 1.0, 1.0, 0.0];
        let mut model = RidgeRegression::new(1e-10);
        model.fit_weighted(&x, &y, Some(&w)).unwrap();
        let p = Regressor::predict(&model, &array![[3.0]]).unwrap();
        assert!((p[0] - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = RidgeRegression::new(1.0);
        assert!(matches!(
            Regressor::predict(&model, &array![[1.0]]),
            Err(SweepError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let mut model = RidgeRegression::new(-1.0);
        assert!(model.fit_weighted(&array![[1.0]], &array![1.0], None).is_err());
    }

    #[test]
    fn test_gauss_jordan_solve() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 5.0];
        let x = gauss_jordan_solve(&a, &b).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-10);
        assert!((x[1] - 1.4).abs() < 1e-10);
    }

    #[test]
    fn test_unfitted_copy() {
        let mut model = RidgeRegression::new(0.5);
        Regressor::fit(&mut model, &array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        let fresh = model.unfitted();
        assert!(!fresh.is_fitted());
        assert!(model.is_fitted());
    }
}
