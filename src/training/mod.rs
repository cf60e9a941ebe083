//! Model training module
//!
//! Provides the regressors swept over:
//! - Ridge regression (the linear baselines and every clusterwise plane)
//! - Support vector regression with an RBF kernel
//! - Decision trees and Random Forests
//! - Clusterwise linear regression (k-plane, CLR-p, CLR-c)
//! - K-Means, used to seed the clusterwise models
//! - K-fold splitting for evaluation

mod models;
pub mod cross_validation;
pub mod linear_models;
pub mod decision_tree;
pub mod random_forest;
pub mod svm;
pub mod clustering;
pub mod clusterwise;

pub use models::{Regressor, RegressionMetrics};
pub use cross_validation::{CVSplit, KFold};
pub use linear_models::RidgeRegression;
pub use decision_tree::{DecisionTreeRegressor, TreeNode};
pub use random_forest::{ForestConfig, MaxDepth, MaxFeatures, RandomForestRegressor};
pub use svm::{Gamma, SvmRegressor, SvrConfig};
pub use clustering::KMeans;
pub use clusterwise::{ClusterwiseConfig, ClusterwiseKind, ClusterwiseRegressor};
