//! clr-sweep - Hyperparameter sweep harness for regression
//!
//! Loads a named tabular regression dataset, scales every feature into
//! [-1, 1], permutes the rows with a seeded random source, expands a
//! declarative grid of model configurations under unique reproducible keys,
//! and hands the whole set to an evaluation engine that writes one CSV row per
//! configuration.
//!
//! # Modules
//!
//! ## Sweep core
//! - [`preprocessing`] - Symmetric min-max scaling and joint row permutation
//! - [`grid`] - Declarative families, Cartesian expansion, configuration registry
//! - [`dispatch`] - Single hand-off of the configuration set to the engine
//!
//! ## Collaborators
//! - [`datasets`] - Boston and Abalone loaders
//! - [`training`] - Ridge, SVR, random forest and clusterwise regressors
//! - [`ensemble`] - Bagged ensembles
//! - [`evaluation`] - K-fold evaluation engine and CSV results
//!
//! ## Services
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;
pub mod random;

// Sweep core
pub mod preprocessing;
pub mod grid;
pub mod dispatch;

// Collaborators
pub mod datasets;
pub mod training;
pub mod ensemble;
pub mod evaluation;

// Services
pub mod cli;

pub use error::{Result, SweepError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, SweepError};

    // Configuration
    pub use crate::config::SweepConfig;
    pub use crate::random::RandomSource;

    // Preprocessing
    pub use crate::preprocessing::{Preprocessed, PreprocessingConfig, Preprocessor, SymmetricScaler};

    // Datasets
    pub use crate::datasets::{Dataset, DatasetDescriptor, DatasetLoader, FileDatasetLoader, RawDataset};

    // Training
    pub use crate::training::{
        ClusterwiseRegressor, Gamma, MaxDepth, MaxFeatures, RandomForestRegressor, RegressionMetrics,
        Regressor, RidgeRegression, SvmRegressor,
    };

    // Ensemble
    pub use crate::ensemble::BaggedRegressor;

    // Grid
    pub use crate::grid::{
        default_families, ConfigurationRegistry, ConfigurationSet, FamilySpec, ModelSpec, SweepData,
    };

    // Evaluation and dispatch
    pub use crate::dispatch::{results_destination, Dispatcher};
    pub use crate::evaluation::{CrossValidationEngine, EvaluationEngine, EvaluationReport};
}
