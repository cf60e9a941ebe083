//! Declarative model families and the Cartesian-product expander

use super::params::{ParamSet, ParamValue};
use serde::{Deserialize, Serialize};

/// Estimator family, with the parameters fixed for the whole family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Family {
    Ridge { alpha: f64 },
    Svr,
    RandomForest { n_estimators: usize },
    KPlane,
    Clrp,
    Clrc { constr_id: usize },
}

/// Single model, or a bagged ensemble of `n` copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    Single,
    Ensemble(usize),
}

/// One gridded hyperparameter and its domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub values: Vec<ParamValue>,
}

impl Dimension {
    pub fn new<V: Into<ParamValue>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A model family and the domains it is swept over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilySpec {
    pub family: Family,
    /// Key prefix
    pub label: String,
    /// Joins the `name=value` pairs of a key
    pub separator: String,
    pub dimensions: Vec<Dimension>,
    pub variants: Vec<Variant>,
}

impl FamilySpec {
    /// A family with no grid: one single-model entry keyed by `label`
    pub fn fixed(family: Family, label: impl Into<String>) -> Self {
        Self {
            family,
            label: label.into(),
            separator: " ".to_string(),
            dimensions: Vec::new(),
            variants: vec![Variant::Single],
        }
    }

    pub fn gridded(family: Family, label: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            family,
            label: label.into(),
            separator: separator.into(),
            dimensions: Vec::new(),
            variants: vec![Variant::Single],
        }
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    /// Number of grid points this family expands to
    pub fn size(&self) -> usize {
        self.dimensions.iter().map(|d| d.values.len()).product::<usize>() * self.variants.len()
    }

    fn key(&self, params: &ParamSet, variant: Variant) -> String {
        let mut key = self.label.clone();
        if !params.is_empty() {
            let body: Vec<String> = params.iter().map(|(n, v)| format!("{}={}", n, v)).collect();
            key.push(' ');
            key.push_str(&body.join(&self.separator));
        }
        if let Variant::Ensemble(n) = variant {
            key.push_str(&format!(" ens={}", n));
        }
        key
    }
}

/// One concrete combination of hyperparameter values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub key: String,
    pub family: Family,
    pub params: ParamSet,
    pub variant: Variant,
}

/// Expand a family into every combination of its dimensions, once per variant.
///
/// An odometer over dimension indices: the last dimension turns fastest.
/// A family with an empty dimension yields no points.
pub fn expand(spec: &FamilySpec) -> Vec<GridPoint> {
    let mut points = Vec::with_capacity(spec.size());
    if spec.dimensions.iter().any(|d| d.values.is_empty()) {
        return points;
    }

    let mut odometer = vec![0usize; spec.dimensions.len()];
    loop {
        let mut params = ParamSet::new();
        for (dim, &i) in spec.dimensions.iter().zip(odometer.iter()) {
            params.push(dim.name.clone(), dim.values[i]);
        }
        for &variant in &spec.variants {
            points.push(GridPoint {
                key: spec.key(&params, variant),
                family: spec.family,
                params: params.clone(),
                variant,
            });
        }

        // Advance; done once every wheel has wrapped
        let mut wheel = odometer.len();
        loop {
            if wheel == 0 {
                return points;
            }
            wheel -= 1;
            odometer[wheel] += 1;
            if odometer[wheel] < spec.dimensions[wheel].values.len() {
                break;
            }
            odometer[wheel] = 0;
        }
    }
}
