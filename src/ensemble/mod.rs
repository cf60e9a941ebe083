//! Ensemble methods module
//!
//! Bagged ensembles of any regressor, used for the `ens=` variants of the sweep.

mod bagging;

pub use bagging::BaggedRegressor;
