//! Sweep preprocessing: symmetric scaling followed by a joint row permutation

use super::{PreprocessingConfig, SymmetricScaler};
use crate::error::{Result, SweepError};
use crate::random::RandomSource;
use ndarray::{Array1, Array2, Axis};
use tracing::debug;

/// Apply one permutation of row indices to both the features and the target.
///
/// Row `i` of the output is row `perm[i]` of the input, for both arrays.
pub fn shuffle_rows(
    x: &Array2<f64>,
    y: &Array1<f64>,
    perm: &[usize],
) -> Result<(Array2<f64>, Array1<f64>)> {
    check_rows(x, y)?;
    if perm.len() != x.nrows() {
        return Err(SweepError::ShapeError {
            expected: format!("permutation of length {}", x.nrows()),
            actual: format!("length {}", perm.len()),
        });
    }
    if let Some(&bad) = perm.iter().find(|&&i| i >= x.nrows()) {
        return Err(SweepError::DataError(format!(
            "permutation index {} out of range for {} rows",
            bad,
            x.nrows()
        )));
    }
    Ok((x.select(Axis(0), perm), y.select(Axis(0), perm)))
}

fn check_rows(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(SweepError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    Ok(())
}

/// Output of one preprocessing pass
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    /// Original row index of each output row
    pub permutation: Vec<usize>,
    pub scaler: SymmetricScaler,
}

/// Scales every column into [-1, 1] and permutes rows with the run's random source
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessingConfig,
}

impl Preprocessor {
    /// Create a preprocessor with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Preprocess without touching the caller's arrays
    pub fn fit_transform(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut RandomSource,
    ) -> Result<Preprocessed> {
        check_rows(x, y)?;
        let mut scaler = SymmetricScaler::new();
        let scaled = scaler.fit_transform(x)?;
        self.permute(scaled, y.clone(), scaler, rng)
    }

    /// Preprocess owned arrays, scaling the feature buffer in place
    pub fn fit_transform_owned(
        &self,
        mut x: Array2<f64>,
        y: Array1<f64>,
        rng: &mut RandomSource,
    ) -> Result<Preprocessed> {
        check_rows(&x, &y)?;
        let mut scaler = SymmetricScaler::new();
        scaler.fit(&x)?;
        scaler.transform_inplace(&mut x)?;
        self.permute(x, y, scaler, rng)
    }

    /// Dispatch on `config.in_place`
    pub fn run(
        &self,
        x: Array2<f64>,
        y: Array1<f64>,
        rng: &mut RandomSource,
    ) -> Result<Preprocessed> {
        if self.config.in_place {
            self.fit_transform_owned(x, y, rng)
        } else {
            self.fit_transform(&x, &y, rng)
        }
    }

    fn permute(
        &self,
        x: Array2<f64>,
        y: Array1<f64>,
        scaler: SymmetricScaler,
        rng: &mut RandomSource,
    ) -> Result<Preprocessed> {
        if !self.config.shuffle {
            let permutation = (0..x.nrows()).collect();
            return Ok(Preprocessed { x, y, permutation, scaler });
        }

        let permutation = rng.permutation(x.nrows());
        let (x, y) = shuffle_rows(&x, &y, &permutation)?;
        debug!(rows = x.nrows(), cols = x.ncols(), "Preprocessed feature matrix");
        Ok(Preprocessed { x, y, permutation, scaler })
    }
}
