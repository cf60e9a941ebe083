//! Bagging ensemble for regressors

use crate::error::{Result, SweepError};
use crate::training::Regressor;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Bagged regressor: every member is a fresh copy of `base` fitted on its own
/// bootstrap resample, and the prediction is the mean over members
#[derive(Debug)]
pub struct BaggedRegressor {
    base: Box<dyn Regressor>,
    n_estimators: usize,
    random_state: u64,
    members: Vec<Box<dyn Regressor>>,
}

impl BaggedRegressor {
    pub fn new(base: Box<dyn Regressor>, n_estimators: usize) -> Result<Self> {
        if n_estimators == 0 {
            return Err(SweepError::ConfigError(
                "ensemble size must be positive".to_string(),
            ));
        }
        Ok(Self {
            base,
            n_estimators,
            random_state: 0,
            members: Vec::new(),
        })
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// The unfitted template every member is copied from
    pub fn base(&self) -> &dyn Regressor {
        self.base.as_ref()
    }

    fn bootstrap(&self, member: usize, n_samples: usize) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.wrapping_add(member as u64));
        (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
    }
}

impl Regressor for BaggedRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(SweepError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(SweepError::TrainingError("no training samples".to_string()));
        }

        let members = (0..self.n_estimators)
            .into_par_iter()
            .map(|member| {
                let indices = self.bootstrap(member, n_samples);
                let x_boot = x.select(Axis(0), &indices);
                let y_boot = y.select(Axis(0), &indices);
                let mut model = self.base.unfitted();
                model.fit(&x_boot, &y_boot)?;
                Ok(model)
            })
            .collect::<Result<Vec<_>>>()?;

        self.members = members;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.members.is_empty() {
            return Err(SweepError::ModelNotFitted);
        }
        let predictions = self
            .members
            .par_iter()
            .map(|m| m.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut mean = Array1::<f64>::zeros(x.nrows());
        for p in &predictions {
            mean += p;
        }
        Ok(mean / predictions.len() as f64)
    }

    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(BaggedRegressor {
            base: self.base.unfitted(),
            n_estimators: self.n_estimators,
            random_state: self.random_state,
            members: Vec::new(),
        })
    }

    fn is_fitted(&self) -> bool {
        !self.members.is_empty()
    }
}
