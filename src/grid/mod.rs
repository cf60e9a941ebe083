//! Configuration grid
//!
//! The sweep is declared as a list of [`FamilySpec`]s. A single generic
//! expander turns each family into grid points, and the
//! [`ConfigurationRegistry`] binds every point to an estimator and the shared
//! preprocessed data under a unique, reproducible key.

mod family;
mod params;
mod registry;
mod spec;

pub use family::{expand, Dimension, Family, FamilySpec, GridPoint, Variant};
pub use params::{ParamSet, ParamValue};
pub use registry::{ConfigurationEntry, ConfigurationRegistry, ConfigurationSet, SweepData};
pub use spec::{default_families, ModelSpec};
