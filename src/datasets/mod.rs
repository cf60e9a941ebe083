//! Named regression datasets
//!
//! The sweep runs on a closed set of datasets. Each one knows its file layout
//! and the index of the constraint column used by constraint-aware regressors.

mod loader;

pub use loader::{DatasetLoader, FileDatasetLoader};

use crate::error::{Result, SweepError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// Boston housing prices (13 features, median value target)
    Boston,
    /// Abalone age from physical measurements (rings target)
    Abalone,
}

impl Dataset {
    /// All supported datasets
    pub const ALL: [Dataset; 2] = [Dataset::Boston, Dataset::Abalone];

    /// Name used on the command line and for the results file
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Boston => "boston",
            Dataset::Abalone => "abalone",
        }
    }

    /// Feature index of the constraint column
    pub fn constraint_column(&self) -> usize {
        match self {
            // RAD, the highway accessibility index
            Dataset::Boston => 8,
            // binned height, appended after the one-hot sex columns
            Dataset::Abalone => 10,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| SweepError::UnsupportedDataset(s.to_string()))
    }
}

/// Metadata carried alongside a loaded dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub dataset: Dataset,
    pub n_samples: usize,
    pub n_features: usize,
    pub constraint_column: usize,
}

impl DatasetDescriptor {
    /// Describe a feature matrix loaded for `dataset`
    pub fn new(dataset: Dataset, x: &Array2<f64>) -> Self {
        Self {
            dataset,
            n_samples: x.nrows(),
            n_features: x.ncols(),
            constraint_column: dataset.constraint_column(),
        }
    }
}

/// Raw features, target and descriptor, before preprocessing
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub descriptor: DatasetDescriptor,
}

impl RawDataset {
    /// Bundle arrays for `dataset`, checking that rows line up
    pub fn new(dataset: Dataset, x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(SweepError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let descriptor = DatasetDescriptor::new(dataset, &x);
        if descriptor.constraint_column >= descriptor.n_features {
            return Err(SweepError::DataError(format!(
                "{} has {} features, constraint column {} is out of range",
                dataset, descriptor.n_features, descriptor.constraint_column
            )));
        }
        Ok(Self { x, y, descriptor })
    }
}
