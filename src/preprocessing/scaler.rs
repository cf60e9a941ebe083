//! Symmetric min-max scaling into [-1, 1]

use crate::error::{Result, SweepError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column min-max scaler mapping each column's minimum to -1 and its
/// maximum to +1.
///
/// `x' = (x - min) / (range / 2) - 1`
///
/// A column with zero range has no defined scale and is rejected with
/// [`SweepError::DomainError`] instead of producing NaN or infinity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymmetricScaler {
    min: Option<Array1<f64>>,
    half_range: Option<Array1<f64>>,
}

impl SymmetricScaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the per-column minimum and half range
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(SweepError::DataError(
                "cannot fit scaler on a matrix with no rows".to_string(),
            ));
        }

        let mut min = Array1::zeros(x.ncols());
        let mut half_range = Array1::zeros(x.ncols());

        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let lo = column.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SweepError::DomainError(format!(
                    "column {} contains non-finite values",
                    j
                )));
            }
            let range = hi - lo;
            if range == 0.0 {
                return Err(SweepError::DomainError(format!(
                    "column {} has zero range (min = max = {})",
                    j, lo
                )));
            }
            min[j] = lo;
            half_range[j] = range / 2.0;
        }

        self.min = Some(min);
        self.half_range = Some(half_range);
        Ok(self)
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        match (&self.min, &self.half_range) {
            (Some(min), Some(half_range)) => Ok((min, half_range)),
            _ => Err(SweepError::ModelNotFitted),
        }
    }

    fn check_width(&self, x: &Array2<f64>, expected: usize) -> Result<()> {
        if x.ncols() != expected {
            return Err(SweepError::ShapeError {
                expected: format!("{} columns", expected),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(())
    }

    /// Scale into a new matrix
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut out = x.clone();
        self.transform_inplace(&mut out)?;
        Ok(out)
    }

    /// Scale the given matrix in place
    pub fn transform_inplace(&self, x: &mut Array2<f64>) -> Result<()> {
        let (min, half_range) = self.params()?;
        self.check_width(x, min.len())?;

        for (j, mut column) in x.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, h) = (min[j], half_range[j]);
            column.mapv_inplace(|v| (v - lo) / h - 1.0);
        }
        Ok(())
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (min, half_range) = self.params()?;
        self.check_width(x, min.len())?;

        let mut out = x.clone();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, h) = (min[j], half_range[j]);
            column.mapv_inplace(|v| (v + 1.0) * h + lo);
        }
        Ok(out)
    }

    /// Fitted column minima
    pub fn min(&self) -> Option<&Array1<f64>> {
        self.min.as_ref()
    }

    /// Fitted half ranges
    pub fn half_range(&self) -> Option<&Array1<f64>> {
        self.half_range.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_columns_map_to_unit_interval() {
        let x = array![[1.0, -5.0], [2.0, 5.0], [3.0, 0.0], [5.0, 1.0]];
        let mut scaler = SymmetricScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        for column in scaled.axis_iter(Axis(1)) {
            let lo = column.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert!((lo + 1.0).abs() < 1e-12);
            assert!((hi - 1.0).abs() < 1e-12);
        }
        assert!((scaled[[2, 1]] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_range_column_is_domain_error() {
        let x = array![[1.0, 4.0], [2.0, 4.0], [3.0, 4.0]];
        let mut scaler = SymmetricScaler::new();
        let err = scaler.fit(&x).unwrap_err();
        assert!(matches!(err, SweepError::DomainError(ref msg) if msg.contains("column 1")));
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[10.0, 0.5], [20.0, 1.5], [15.0, 1.0]];
        let mut scaler = SymmetricScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();
        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = SymmetricScaler::new();
        let err = scaler.transform(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, SweepError::ModelNotFitted));
    }

    #[test]
    fn test_width_mismatch() {
        let mut scaler = SymmetricScaler::new();
        scaler.fit(&array![[0.0, 1.0], [1.0, 0.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[0.0], [1.0]]),
            Err(SweepError::ShapeError { .. })
        ));
    }
}
