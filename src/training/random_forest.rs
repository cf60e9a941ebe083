//! Random Forest regressor

use super::decision_tree::DecisionTreeRegressor;
use super::Regressor;
use crate::error::{Result, SweepError};
use ndarray::{Array1, Array2, Axis};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum tree depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxDepth {
    /// Grow until leaves are pure or too small to split
    Unbounded,
    Limited(usize),
}

impl MaxDepth {
    pub fn as_option(&self) -> Option<usize> {
        match self {
            MaxDepth::Unbounded => None,
            MaxDepth::Limited(d) => Some(*d),
        }
    }
}

impl fmt::Display for MaxDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxDepth::Unbounded => f.write_str("None"),
            MaxDepth::Limited(d) => write!(f, "{}", d),
        }
    }
}

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// All features (the regression default)
    Auto,
    /// Fixed number, capped at the number of features
    Fixed(usize),
}

impl MaxFeatures {
    /// Concrete count for data with `n_features` columns
    pub fn resolve(&self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Auto => n_features,
            MaxFeatures::Fixed(n) => (*n).min(n_features),
        }
        .max(1)
    }
}

impl fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxFeatures::Auto => f.write_str("auto"),
            MaxFeatures::Fixed(n) => write!(f, "{}", n),
        }
    }
}

/// Random Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    pub max_depth: MaxDepth,
    pub max_features: MaxFeatures,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Bootstrap sampling
    pub bootstrap: bool,
    pub random_state: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: MaxDepth::Unbounded,
            max_features: MaxFeatures::Auto,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: 0,
        }
    }
}

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Validate hyperparameters
    pub fn validate(&self) -> Result<()> {
        let c = &self.config;
        let checks: [(&str, usize, usize); 3] = [
            ("n_estimators", c.n_estimators, 1),
            ("min_samples_split", c.min_samples_split, 2),
            ("min_samples_leaf", c.min_samples_leaf, 1),
        ];
        for (name, value, min) in checks {
            if value < min {
                return Err(SweepError::InvalidParameter {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason: format!("must be at least {}", min),
                });
            }
        }
        if c.max_depth == MaxDepth::Limited(0) {
            return Err(SweepError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if c.max_features == MaxFeatures::Fixed(0) {
            return Err(SweepError::InvalidParameter {
                name: "max_features".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Get number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.validate()?;
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

        let max_features = self.config.max_features.resolve(x.ncols());
        let base_seed = self.config.random_state;

        // Build trees in parallel
        let trees: Vec<DecisionTreeRegressor> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.config.bootstrap {
                    (0..n_samples)
                        .map(|_| (rng.next_u64() as usize) % n_samples)
                        .collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);

                let mut tree = DecisionTreeRegressor::new()
                    .with_max_depth(self.config.max_depth.as_option())
                    .with_min_samples_split(self.config.min_samples_split)
                    .with_min_samples_leaf(self.config.min_samples_leaf)
                    .with_max_features(Some(max_features))
                    .with_random_state(rng.next_u64());
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(SweepError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut mean = Array1::<f64>::zeros(x.nrows());
        for preds in &all_predictions {
            mean += preds;
        }
        Ok(mean / all_predictions.len() as f64)
    }

    fn name(&self) -> &'static str {
        "rf"
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(RandomForestRegressor::new(self.config.clone()))
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut rf = RandomForestRegressor::new(ForestConfig {
            n_estimators: 10,
            random_state: 42,
            ..ForestConfig::default()
        });
        rf.fit(&x, &y).unwrap();
        assert_eq!(rf.n_trees(), 10);

        let predictions = rf.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < 2.0, "MSE too high: {}", mse);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let x = Array2::from_shape_fn((30, 3), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let y = x.column(0).to_owned() + &x.column(2);
        let config = ForestConfig {
            n_estimators: 5,
            max_features: MaxFeatures::Fixed(2),
            random_state: 9,
            ..ForestConfig::default()
        };
        let mut a = RandomForestRegressor::new(config.clone());
        let mut b = RandomForestRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_display_of_tagged_options() {
        assert_eq!(MaxDepth::Unbounded.to_string(), "None");
        assert_eq!(MaxDepth::Limited(10).to_string(), "10");
        assert_eq!(MaxFeatures::Auto.to_string(), "auto");
        assert_eq!(MaxFeatures::Fixed(5).to_string(), "5");
        assert_eq!(MaxFeatures::Fixed(5).resolve(3), 3);
        assert_eq!(MaxFeatures::Auto.resolve(13), 13);
    }

    #[test]
    fn test_invalid_min_samples_split() {
        let rf = RandomForestRegressor::new(ForestConfig {
            min_samples_split: 1,
            ..ForestConfig::default()
        });
        assert!(matches!(rf.validate(), Err(SweepError::InvalidParameter { .. })));
    }
}
