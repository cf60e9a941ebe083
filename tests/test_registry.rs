//! Integration test: grid expansion and configuration keys

use clr_sweep::config::SweepConfig;
use clr_sweep::datasets::{Dataset, DatasetDescriptor};
use clr_sweep::error::SweepError;
use clr_sweep::grid::{
    default_families, expand, ConfigurationRegistry, ConfigurationSet, Dimension, Family,
    FamilySpec, ModelSpec, SweepData, Variant,
};
use clr_sweep::random::RandomSource;
use clr_sweep::training::Gamma;
use ndarray::{Array1, Array2};
use std::collections::HashSet;

fn data(n_features: usize) -> SweepData {
    let x = Array2::from_shape_fn((12, n_features), |(i, j)| ((i + j) % 5) as f64 / 2.0 - 1.0);
    let y = Array1::from_iter((0..12).map(|i| i as f64));
    SweepData::new(x, y).unwrap()
}

fn build(dataset: Dataset, n_features: usize, seed: u64) -> ConfigurationSet {
    let data = data(n_features);
    let descriptor = DatasetDescriptor::new(dataset, &data.x);
    let config = SweepConfig::new(dataset.name()).with_seed(seed);
    ConfigurationRegistry::new(default_families(&config, &descriptor))
        .with_random_source(&RandomSource::new(seed))
        .build(data)
        .unwrap()
}

#[test]
fn test_full_sweep_size() {
    let set = build(Dataset::Boston, 13, 0);
    assert_eq!(set.len(), 416);

    let data = data(13);
    let descriptor = DatasetDescriptor::new(Dataset::Boston, &data.x);
    let registry = ConfigurationRegistry::new(default_families(&SweepConfig::new("boston"), &descriptor));
    assert_eq!(registry.expected_len(), 416);
}

#[test]
fn test_family_counts() {
    let set = build(Dataset::Abalone, 11, 0);
    let counts = set.family_counts();
    assert_eq!(counts["ridge"], 2);
    assert_eq!(counts["svr"], 72);
    assert_eq!(counts["rf"], 54);
    assert_eq!(counts["kplane"], 128);
    assert_eq!(counts["CLS_p"], 128);
    assert_eq!(counts["CLS_c"], 32);
    assert_eq!(counts["kplane"] + counts["CLS_p"], 256);
}

#[test]
fn test_keys_are_unique_across_families() {
    let data = data(13);
    let descriptor = DatasetDescriptor::new(Dataset::Boston, &data.x);
    let families = default_families(&SweepConfig::new("boston"), &descriptor);
    let keys: Vec<String> = families.iter().flat_map(expand).map(|p| p.key).collect();
    let unique: HashSet<&String> = keys.iter().collect();
    assert_eq!(keys.len(), 416);
    assert_eq!(unique.len(), keys.len());
}

#[test]
fn test_sample_keys() {
    let set = build(Dataset::Boston, 13, 0);
    for key in [
        "lr",
        "ridge 10.0",
        "svr C=0.1, g=auto, eps=0.00390625",
        "svr C=1.0, g=0.25, eps=0.001",
        "svr C=128.0, g=0.5, eps=0.5",
        "rf md=None, mf=auto, mss=2, msl=1",
        "rf md=50, mf=5, mss=30, msl=30",
        "kplane k=2 l=0 w=True f=True",
        "kplane k=8 l=100 w=False f=False ens=10",
        "CLS_p k=4 l=10 w=True f=False ens=10",
        "CLS_c k=6 l=1",
        "CLS_c k=8 l=100 ens=10",
    ] {
        assert!(set.get(key).is_some(), "missing key {:?}", key);
    }
}

#[test]
fn test_bindings_match_keys() {
    let set = build(Dataset::Boston, 13, 0);

    assert_eq!(set.get("lr").unwrap().spec, ModelSpec::Ridge { alpha: 1e-5 });
    assert_eq!(
        set.get("svr C=10.0, g=auto, eps=0.1").unwrap().spec,
        ModelSpec::Svr {
            c: 10.0,
            gamma: Gamma::Auto,
            epsilon: 0.1
        }
    );
    assert_eq!(
        set.get("CLS_c k=4 l=10").unwrap().spec,
        ModelSpec::Clrc {
            k: 4,
            l: 10.0,
            constr_id: 8
        }
    );
    match &set.get("kplane k=6 l=1 w=False f=True ens=10").unwrap().spec {
        ModelSpec::Ensemble { base, n_estimators } => {
            assert_eq!(*n_estimators, 10);
            assert_eq!(
                **base,
                ModelSpec::KPlane {
                    k: 6,
                    l: 1.0,
                    weighted: false,
                    fuzzy: true
                }
            );
        }
        other => panic!("expected an ensemble, got {:?}", other),
    }
}

#[test]
fn test_constraint_column_follows_dataset() {
    let set = build(Dataset::Abalone, 11, 0);
    assert_eq!(
        set.get("CLS_c k=2 l=0").unwrap().spec,
        ModelSpec::Clrc {
            k: 2,
            l: 0.0,
            constr_id: 10
        }
    );
}

#[test]
fn test_rebuild_is_deterministic() {
    let a = build(Dataset::Boston, 13, 7);
    let b = build(Dataset::Boston, 13, 7);
    assert!(a.keys().eq(b.keys()));
    for entry in a.iter() {
        let other = b.get(&entry.key).unwrap();
        assert_eq!(entry.spec, other.spec);
        assert_eq!(entry.seed, other.seed);
    }
}

#[test]
fn test_ensemble_size_changes_marker() {
    let data = data(13);
    let descriptor = DatasetDescriptor::new(Dataset::Boston, &data.x);
    let config = SweepConfig::new("boston").with_ensemble_size(3);
    let set = ConfigurationRegistry::new(default_families(&config, &descriptor))
        .build(data)
        .unwrap();
    assert_eq!(set.len(), 416);
    assert!(set.get("CLS_c k=2 l=0 ens=3").is_some());
    assert!(set.get("CLS_c k=2 l=0 ens=10").is_none());
}

#[test]
fn test_invalid_family_aborts_build() {
    let families = vec![
        FamilySpec::fixed(Family::Ridge { alpha: 1e-5 }, "lr"),
        FamilySpec::gridded(Family::KPlane, "kplane", " ")
            .with_dimension(Dimension::new("k", [2i64, -1]))
            .with_dimension(Dimension::new("l", [0i64]))
            .with_dimension(Dimension::new("w", [true]))
            .with_dimension(Dimension::new("f", [false]))
            .with_variants(vec![Variant::Single]),
    ];
    let err = ConfigurationRegistry::new(families).build(data(3)).unwrap_err();
    assert!(matches!(err, SweepError::ConfigError(_)));
}

#[test]
fn test_constraint_column_out_of_range_aborts_build() {
    let families = vec![FamilySpec::gridded(Family::Clrc { constr_id: 8 }, "CLS_c", " ")
        .with_dimension(Dimension::new("k", [2i64]))
        .with_dimension(Dimension::new("l", [1i64]))];
    let err = ConfigurationRegistry::new(families).build(data(4)).unwrap_err();
    assert!(matches!(err, SweepError::ConfigError(_)));
}
