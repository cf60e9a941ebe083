//! Configuration registry: expands every family and binds each grid point to
//! its estimator and the shared preprocessed data

use super::family::{expand, FamilySpec};
use super::spec::ModelSpec;
use crate::error::{Result, SweepError};
use crate::random::RandomSource;
use crate::training::Regressor;
use ndarray::{Array1, Array2};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Preprocessed data shared by every entry of a sweep
#[derive(Debug, Clone)]
pub struct SweepData {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

impl SweepData {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(SweepError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        Ok(Self { x, y })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

/// One (key, estimator, data) triple
#[derive(Debug)]
pub struct ConfigurationEntry {
    pub key: String,
    pub spec: ModelSpec,
    /// Seed the estimator was built with
    pub seed: u64,
    pub estimator: Box<dyn Regressor>,
    pub data: Arc<SweepData>,
}

/// Every configuration of a sweep, keyed by its unique key
#[derive(Debug, Default)]
pub struct ConfigurationSet {
    entries: BTreeMap<String, ConfigurationEntry>,
}

impl ConfigurationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; a key that is already present is an error
    pub fn insert(&mut self, entry: ConfigurationEntry) -> Result<()> {
        match self.entries.entry(entry.key.clone()) {
            btree_map::Entry::Occupied(existing) => {
                Err(SweepError::DuplicateKey(existing.key().clone()))
            }
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigurationEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationEntry> {
        self.entries.values()
    }

    /// Number of entries per estimator family name
    pub fn family_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.estimator.name()).or_insert(0) += 1;
        }
        counts
    }
}

/// Stable 64-bit hash of a key, used as the seed stream of its estimator
fn key_stream(key: &str) -> u64 {
    // FNV-1a
    key.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
        (h ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Builds the configuration set from a declarative list of families
#[derive(Debug, Clone)]
pub struct ConfigurationRegistry {
    families: Vec<FamilySpec>,
    seed: u64,
}

impl ConfigurationRegistry {
    pub fn new(families: Vec<FamilySpec>) -> Self {
        Self { families, seed: 0 }
    }

    /// Derive estimator seeds from the run's random source
    pub fn with_random_source(mut self, source: &RandomSource) -> Self {
        self.seed = source.seed();
        self
    }

    pub fn families(&self) -> &[FamilySpec] {
        &self.families
    }

    /// Sum of every family's grid size
    pub fn expected_len(&self) -> usize {
        self.families.iter().map(FamilySpec::size).sum()
    }

    /// Expand every family and build one entry per grid point.
    ///
    /// Any invalid point or key collision aborts the whole build.
    pub fn build(&self, data: SweepData) -> Result<ConfigurationSet> {
        let data = Arc::new(data);
        let source = RandomSource::new(self.seed);
        let mut set = ConfigurationSet::new();
        let mut per_family: HashMap<&str, usize> = HashMap::new();

        for family in &self.families {
            for point in expand(family) {
                let spec = ModelSpec::from_point(&point)?;
                let seed = source.derive_seed(key_stream(&point.key));
                let estimator = spec.build(seed, data.n_features())?;
                debug!(key = %point.key, "configuration built");
                set.insert(ConfigurationEntry {
                    key: point.key,
                    spec,
                    seed,
                    estimator,
                    data: Arc::clone(&data),
                })?;
                *per_family.entry(family.label.as_str()).or_insert(0) += 1;
            }
        }

        let expected = self.expected_len();
        if set.len() != expected {
            return Err(SweepError::ConfigError(format!(
                "grid expanded to {} entries, expected {}",
                set.len(),
                expected
            )));
        }

        info!(
            entries = set.len(),
            families = per_family.len(),
            "configuration set built"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::family::{Dimension, Family, Variant};
    use ndarray::array;

    fn data() -> SweepData {
        SweepData::new(array![[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]], array![1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let families = vec![
            FamilySpec::fixed(Family::Ridge { alpha: 1.0 }, "lr"),
            FamilySpec::fixed(Family::Ridge { alpha: 2.0 }, "lr"),
        ];
        let err = ConfigurationRegistry::new(families).build(data()).unwrap_err();
        assert!(matches!(err, SweepError::DuplicateKey(ref k) if k == "lr"));
    }

    #[test]
    fn test_entries_share_data() {
        let families = vec![FamilySpec::gridded(Family::Svr, "svr", ", ")
            .with_dimension(Dimension::new("C", [1.0, 2.0]))
            .with_dimension(Dimension::new("g", [0.5]))
            .with_dimension(Dimension::new("eps", [0.1]))
            .with_variants(vec![Variant::Single])];
        let set = ConfigurationRegistry::new(families).build(data()).unwrap();
        assert_eq!(set.len(), 2);
        let a = set.get("svr C=1.0, g=0.5, eps=0.1").unwrap();
        let b = set.get("svr C=2.0, g=0.5, eps=0.1").unwrap();
        assert!(Arc::ptr_eq(&a.data, &b.data));
        assert_eq!(set.family_counts().get("svr"), Some(&2));
    }

    #[test]
    fn test_seeds_depend_on_run_seed() {
        let families = vec![FamilySpec::fixed(Family::Ridge { alpha: 1.0 }, "lr")];
        let a = ConfigurationRegistry::new(families.clone())
            .with_random_source(&RandomSource::new(1))
            .build(data())
            .unwrap();
        let b = ConfigurationRegistry::new(families)
            .with_random_source(&RandomSource::new(2))
            .build(data())
            .unwrap();
        assert_ne!(a.get("lr").unwrap().seed, b.get("lr").unwrap().seed);
    }

    #[test]
    fn test_key_stream_is_stable() {
        assert_eq!(key_stream(""), 0xcbf2_9ce4_8422_2325);
        assert_ne!(key_stream("lr"), key_stream("rf"));
    }
}
