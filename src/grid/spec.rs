//! Estimator descriptions and the default sweep

use super::family::{Dimension, Family, FamilySpec, GridPoint, Variant};
use crate::config::SweepConfig;
use crate::datasets::DatasetDescriptor;
use crate::ensemble::BaggedRegressor;
use crate::error::{Result, SweepError};
use crate::training::{
    ClusterwiseRegressor, ForestConfig, Gamma, MaxDepth, MaxFeatures, RandomForestRegressor,
    Regressor, RidgeRegression, SvmRegressor, SvrConfig,
};
use serde::{Deserialize, Serialize};

/// Serializable description of one estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelSpec {
    Ridge {
        alpha: f64,
    },
    Svr {
        c: f64,
        gamma: Gamma,
        epsilon: f64,
    },
    RandomForest {
        n_estimators: usize,
        max_depth: MaxDepth,
        max_features: MaxFeatures,
        min_samples_split: usize,
        min_samples_leaf: usize,
    },
    KPlane {
        k: usize,
        l: f64,
        weighted: bool,
        fuzzy: bool,
    },
    Clrp {
        k: usize,
        l: f64,
        weighted: bool,
        fuzzy: bool,
    },
    Clrc {
        k: usize,
        l: f64,
        constr_id: usize,
    },
    Ensemble {
        base: Box<ModelSpec>,
        n_estimators: usize,
    },
}

fn invalid_as_config(err: SweepError) -> SweepError {
    match err {
        SweepError::InvalidParameter {
            name,
            value,
            reason,
        } => SweepError::ConfigError(format!("{} = {}: {}", name, value, reason)),
        other => other,
    }
}

impl ModelSpec {
    /// Read the parameters of a grid point
    pub fn from_point(point: &GridPoint) -> Result<Self> {
        let p = &point.params;
        let single = match point.family {
            Family::Ridge { alpha } => ModelSpec::Ridge { alpha },
            Family::Svr => ModelSpec::Svr {
                c: p.float("C")?,
                gamma: p.gamma("g")?,
                epsilon: p.float("eps")?,
            },
            Family::RandomForest { n_estimators } => ModelSpec::RandomForest {
                n_estimators,
                max_depth: p.max_depth("md")?,
                max_features: p.max_features("mf")?,
                min_samples_split: p.count("mss")?,
                min_samples_leaf: p.count("msl")?,
            },
            Family::KPlane => ModelSpec::KPlane {
                k: p.count("k")?,
                l: p.float("l")?,
                weighted: p.flag("w")?,
                fuzzy: p.flag("f")?,
            },
            Family::Clrp => ModelSpec::Clrp {
                k: p.count("k")?,
                l: p.float("l")?,
                weighted: p.flag("w")?,
                fuzzy: p.flag("f")?,
            },
            Family::Clrc { constr_id } => ModelSpec::Clrc {
                k: p.count("k")?,
                l: p.float("l")?,
                constr_id,
            },
        };

        Ok(match point.variant {
            Variant::Single => single,
            Variant::Ensemble(n_estimators) => ModelSpec::Ensemble {
                base: Box::new(single),
                n_estimators,
            },
        })
    }

    /// Validate and instantiate the estimator for data with `n_features` columns.
    ///
    /// Structurally invalid parameters fail with `ConfigError`.
    pub fn build(&self, seed: u64, n_features: usize) -> Result<Box<dyn Regressor>> {
        let model: Box<dyn Regressor> = match self {
            ModelSpec::Ridge { alpha } => {
                let model = RidgeRegression::new(*alpha);
                model.validate().map_err(invalid_as_config)?;
                Box::new(model)
            }
            ModelSpec::Svr { c, gamma, epsilon } => {
                let model = SvmRegressor::new(SvrConfig {
                    c: *c,
                    gamma: *gamma,
                    epsilon: *epsilon,
                    ..SvrConfig::default()
                });
                model.validate().map_err(invalid_as_config)?;
                Box::new(model)
            }
            ModelSpec::RandomForest {
                n_estimators,
                max_depth,
                max_features,
                min_samples_split,
                min_samples_leaf,
            } => {
                let model = RandomForestRegressor::new(ForestConfig {
                    n_estimators: *n_estimators,
                    max_depth: *max_depth,
                    max_features: *max_features,
                    min_samples_split: *min_samples_split,
                    min_samples_leaf: *min_samples_leaf,
                    random_state: seed,
                    ..ForestConfig::default()
                });
                model.validate().map_err(invalid_as_config)?;
                Box::new(model)
            }
            ModelSpec::KPlane { k, l, weighted, fuzzy } => Box::new(
                ClusterwiseRegressor::kplane(*k, *l, *weighted, *fuzzy)?.with_random_state(seed),
            ),
            ModelSpec::Clrp { k, l, weighted, fuzzy } => Box::new(
                ClusterwiseRegressor::clrp(*k, *l, *weighted, *fuzzy)?.with_random_state(seed),
            ),
            ModelSpec::Clrc { k, l, constr_id } => {
                let model = ClusterwiseRegressor::clrc(*k, *l, *constr_id)?.with_random_state(seed);
                model.validate_for(n_features)?;
                Box::new(model)
            }
            ModelSpec::Ensemble { base, n_estimators } => {
                let base = base.build(seed, n_features)?;
                Box::new(BaggedRegressor::new(base, *n_estimators)?.with_random_state(seed))
            }
        };
        Ok(model)
    }
}

/// The sweep run on every dataset: two linear baselines, SVR, random forest,
/// and the three clusterwise families as single models and bagged ensembles
pub fn default_families(config: &SweepConfig, descriptor: &DatasetDescriptor) -> Vec<FamilySpec> {
    let both = vec![Variant::Single, Variant::Ensemble(config.ensemble_size)];
    let clusters = || Dimension::new("k", [2i64, 4, 6, 8]);
    let penalties = || Dimension::new("l", [0i64, 1, 10, 100]);
    let flags = |name: &str| Dimension::new(name, [true, false]);

    vec![
        FamilySpec::fixed(Family::Ridge { alpha: 1e-5 }, "lr"),
        FamilySpec::fixed(Family::Ridge { alpha: 10.0 }, "ridge 10.0"),
        FamilySpec::gridded(Family::Svr, "svr", ", ")
            .with_dimension(Dimension::new("C", [0.1, 1.0, 10.0, 32.0, 100.0, 128.0]))
            .with_dimension(Dimension::new(
                "g",
                [Gamma::Auto, Gamma::Value(0.25), Gamma::Value(0.5)],
            ))
            .with_dimension(Dimension::new("eps", [2f64.powi(-8), 0.001, 0.1, 0.5])),
        FamilySpec::gridded(
            Family::RandomForest {
                n_estimators: config.forest_size,
            },
            "rf",
            ", ",
        )
        .with_dimension(Dimension::new(
            "md",
            [MaxDepth::Unbounded, MaxDepth::Limited(10), MaxDepth::Limited(50)],
        ))
        .with_dimension(Dimension::new("mf", [MaxFeatures::Auto, MaxFeatures::Fixed(5)]))
        .with_dimension(Dimension::new("mss", [2i64, 10, 30]))
        .with_dimension(Dimension::new("msl", [1i64, 10, 30])),
        FamilySpec::gridded(Family::KPlane, "kplane", " ")
            .with_dimension(clusters())
            .with_dimension(penalties())
            .with_dimension(flags("w"))
            .with_dimension(flags("f"))
            .with_variants(both.clone()),
        FamilySpec::gridded(Family::Clrp, "CLS_p", " ")
            .with_dimension(clusters())
            .with_dimension(penalties())
            .with_dimension(flags("w"))
            .with_dimension(flags("f"))
            .with_variants(both.clone()),
        FamilySpec::gridded(
            Family::Clrc {
                constr_id: descriptor.constraint_column,
            },
            "CLS_c",
            " ",
        )
        .with_dimension(clusters())
        .with_dimension(penalties())
        .with_variants(both),
    ]
}
