//! Clusterwise linear regression
//!
//! A clusterwise regressor partitions the samples into `k` clusters and fits
//! one ridge plane per cluster, alternating between refitting the planes and
//! reassigning samples to the cluster whose plane (and, for k-plane, whose
//! centre) fits them best. Three variants are provided:
//!
//! - k-plane: assignment cost is `residual² + l·‖x − centre‖²`
//! - CLR-p: assignment cost is the residual alone; `l` is the ridge penalty of every plane
//! - CLR-c: CLR-p where all samples sharing a value in the constraint column
//!   are forced into the same cluster
//!
//! With `fuzzy` the samples carry soft memberships while training. With
//! `weighted` predictions blend every plane by a softmax over the distance to
//! the cluster centres instead of using the nearest cluster only.

use super::clustering::{euclidean_sq, nearest, KMeans};
use super::linear_models::RidgeRegression;
use super::Regressor;
use crate::error::{Result, SweepError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Smallest ridge penalty applied to a plane, keeps tiny clusters solvable
const MIN_PLANE_ALPHA: f64 = 1e-6;

/// Which assignment rule the regressor uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterwiseKind {
    KPlane,
    Clrp,
    Clrc { constr_id: usize },
}

/// Clusterwise regressor hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterwiseConfig {
    pub kind: ClusterwiseKind,
    /// Number of clusters
    pub n_planes: usize,
    /// Distance penalty (k-plane) or plane ridge penalty (CLR)
    pub penalty: f64,
    pub weighted: bool,
    pub fuzzy: bool,
    /// Maximum number of refit / reassign rounds
    pub max_iter: usize,
    pub random_state: u64,
}

impl ClusterwiseConfig {
    fn plane_alpha(&self) -> f64 {
        match self.kind {
            ClusterwiseKind::KPlane => MIN_PLANE_ALPHA,
            ClusterwiseKind::Clrp | ClusterwiseKind::Clrc { .. } => self.penalty.max(MIN_PLANE_ALPHA),
        }
    }

    fn distance_weight(&self) -> f64 {
        match self.kind {
            ClusterwiseKind::KPlane => self.penalty,
            _ => 0.0,
        }
    }
}

/// Per-sample membership to each cluster (rows sum to 1)
type Memberships = Array2<f64>;

#[derive(Debug, Clone)]
struct FittedPlanes {
    planes: Vec<RidgeRegression>,
    centres: Array2<f64>,
    /// Softmax temperature for weighted prediction
    bandwidth: f64,
    /// Cluster of each constraint value seen while training (CLR-c only)
    groups: BTreeMap<u64, usize>,
}

/// Clusterwise linear regressor (k-plane, CLR-p and CLR-c)
#[derive(Debug, Clone)]
pub struct ClusterwiseRegressor {
    config: ClusterwiseConfig,
    fitted: Option<FittedPlanes>,
}

impl ClusterwiseRegressor {
    /// Build from a full configuration, rejecting structurally invalid ones
    pub fn new(config: ClusterwiseConfig) -> Result<Self> {
        if config.n_planes == 0 {
            return Err(SweepError::ConfigError(
                "number of clusters must be positive".to_string(),
            ));
        }
        if !(config.penalty >= 0.0) || !config.penalty.is_finite() {
            return Err(SweepError::ConfigError(format!(
                "penalty must be finite and non-negative, got {}",
                config.penalty
            )));
        }
        if config.max_iter == 0 {
            return Err(SweepError::ConfigError("max_iter must be positive".to_string()));
        }
        Ok(Self {
            config,
            fitted: None,
        })
    }

    fn preset(kind: ClusterwiseKind, k: usize, l: f64, weighted: bool, fuzzy: bool) -> Result<Self> {
        Self::new(ClusterwiseConfig {
            kind,
            n_planes: k,
            penalty: l,
            weighted,
            fuzzy,
            max_iter: 20,
            random_state: 0,
        })
    }

    /// k-plane regressor
    pub fn kplane(k: usize, l: f64, weighted: bool, fuzzy: bool) -> Result<Self> {
        Self::preset(ClusterwiseKind::KPlane, k, l, weighted, fuzzy)
    }

    /// Clusterwise regression with residual-only assignment
    pub fn clrp(k: usize, l: f64, weighted: bool, fuzzy: bool) -> Result<Self> {
        Self::preset(ClusterwiseKind::Clrp, k, l, weighted, fuzzy)
    }

    /// Clusterwise regression constrained by the groups in column `constr_id`
    pub fn clrc(k: usize, l: f64, constr_id: usize) -> Result<Self> {
        Self::preset(ClusterwiseKind::Clrc { constr_id }, k, l, false, false)
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.config.random_state = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter.max(1);
        self
    }

    pub fn config(&self) -> &ClusterwiseConfig {
        &self.config
    }

    /// Check that the constraint column exists in data with `n_features` columns
    pub fn validate_for(&self, n_features: usize) -> Result<()> {
        if let ClusterwiseKind::Clrc { constr_id } = self.config.kind {
            if constr_id >= n_features {
                return Err(SweepError::ConfigError(format!(
                    "constraint column {} out of range for {} features",
                    constr_id, n_features
                )));
            }
        }
        Ok(())
    }

    /// Cluster centres of the fitted model
    pub fn centres(&self) -> Option<&Array2<f64>> {
        self.fitted.as_ref().map(|f| &f.centres)
    }

    /// Initial hard labels: k-means for free clusters, a random cluster per group for CLR-c
    fn initial_labels(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let k = self.config.n_planes;
        match self.config.kind {
            ClusterwiseKind::Clrc { constr_id } => {
                // Shuffled round-robin so no cluster starts empty when there are enough groups
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
                let mut groups: Vec<u64> = x.column(constr_id).iter().map(|v| v.to_bits()).collect();
                groups.sort_unstable();
                groups.dedup();
                groups.shuffle(&mut rng);
                let assigned: BTreeMap<u64, usize> =
                    groups.into_iter().enumerate().map(|(i, g)| (g, i % k)).collect();
                Ok(x.column(constr_id).iter().map(|v| assigned[&v.to_bits()]).collect())
            }
            _ => {
                let mut km = KMeans::new(k).with_random_state(self.config.random_state);
                km.fit(x)?;
                Ok(km.labels().map(<[usize]>::to_vec).unwrap_or_default())
            }
        }
    }

    fn one_hot(labels: &[usize], k: usize) -> Memberships {
        let mut m = Array2::zeros((labels.len(), k));
        for (i, &c) in labels.iter().enumerate() {
            m[[i, c]] = 1.0;
        }
        m
    }

    fn fit_planes(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        memberships: &Memberships,
        previous: Option<&(Vec<RidgeRegression>, Array2<f64>)>,
        global: &RidgeRegression,
        global_centre: &Array1<f64>,
    ) -> Result<(Vec<RidgeRegression>, Array2<f64>)> {
        let k = self.config.n_planes;
        let mut planes = Vec::with_capacity(k);
        let mut centres = Array2::zeros((k, x.ncols()));

        for c in 0..k {
            let w = memberships.column(c).to_owned();
            let total = w.sum();
            if total <= 1e-12 {
                // Empty cluster keeps what it had, or the global plane on the first round
                match previous {
                    Some((p, cs)) => {
                        planes.push(p[c].clone());
                        centres.row_mut(c).assign(&cs.row(c));
                    }
                    None => {
                        planes.push(global.clone());
                        centres.row_mut(c).assign(global_centre);
                    }
                }
                continue;
            }
            let mut plane = RidgeRegression::new(self.config.plane_alpha());
            plane.fit_weighted(x, y, Some(&w))?;
            planes.push(plane);
            centres.row_mut(c).assign(&(x.t().dot(&w) / total));
        }
        Ok((planes, centres))
    }

    /// Assignment cost of every sample to every cluster (n_samples × k)
    fn costs(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        planes: &[RidgeRegression],
        centres: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        let mut cost = Array2::zeros((x.nrows(), planes.len()));
        let lambda = self.config.distance_weight();
        for (c, plane) in planes.iter().enumerate() {
            let residual = plane.predict(x)? - y;
            let mut col = cost.column_mut(c);
            col.assign(&residual.mapv(|r| r * r));
            if lambda > 0.0 {
                for (i, row) in x.rows().into_iter().enumerate() {
                    col[i] += lambda * euclidean_sq(row, centres.row(c));
                }
            }
        }
        Ok(cost)
    }

    fn assign(&self, x: &Array2<f64>, cost: &Array2<f64>) -> Memberships {
        let k = self.config.n_planes;
        match self.config.kind {
            ClusterwiseKind::Clrc { constr_id } => {
                let mut group_cost: BTreeMap<u64, Array1<f64>> = BTreeMap::new();
                for (i, v) in x.column(constr_id).iter().enumerate() {
                    let entry = group_cost
                        .entry(v.to_bits())
                        .or_insert_with(|| Array1::zeros(k));
                    *entry += &cost.row(i);
                }
                let labels: Vec<usize> = x
                    .column(constr_id)
                    .iter()
                    .map(|v| argmin(group_cost[&v.to_bits()].iter().copied()))
                    .collect();
                Self::one_hot(&labels, k)
            }
            _ if self.config.fuzzy => soft_memberships(cost),
            _ => {
                let labels: Vec<usize> = cost
                    .rows()
                    .into_iter()
                    .map(|row| argmin(row.iter().copied()))
                    .collect();
                Self::one_hot(&labels, k)
            }
        }
    }

    fn group_clusters(&self, x: &Array2<f64>, memberships: &Memberships) -> BTreeMap<u64, usize> {
        let mut groups = BTreeMap::new();
        if let ClusterwiseKind::Clrc { constr_id } = self.config.kind {
            for (i, v) in x.column(constr_id).iter().enumerate() {
                groups
                    .entry(v.to_bits())
                    .or_insert_with(|| argmax(memberships.row(i).iter().copied()));
            }
        }
        groups
    }
}

fn argmin(values: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::INFINITY);
    for (i, v) in values.enumerate() {
        if v < best.1 {
            best = (i, v);
        }
    }
    best.0
}

fn argmax(values: impl Iterator<Item = f64>) -> usize {
    argmin(values.map(|v| -v))
}

/// Row-wise softmax of `-cost / t`, with `t` the mean of the per-row minimum cost
fn soft_memberships(cost: &Array2<f64>) -> Memberships {
    let mins: Vec<f64> = cost
        .rows()
        .into_iter()
        .map(|row| row.iter().copied().fold(f64::INFINITY, f64::min))
        .collect();
    let t = (mins.iter().sum::<f64>() / mins.len().max(1) as f64).max(1e-12);

    let mut m = cost.clone();
    for (mut row, &lo) in m.rows_mut().into_iter().zip(mins.iter()) {
        row.mapv_inplace(|c| (-(c - lo) / t).exp());
        let s = row.sum();
        row /= s;
    }
    m
}

impl Regressor for ClusterwiseRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n != y.len() {
            return Err(SweepError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n < self.config.n_planes {
            return Err(SweepError::TrainingError(format!(
                "n_samples ({}) < n_clusters ({})",
                n, self.config.n_planes
            )));
        }
        self.validate_for(x.ncols())?;

        let mut global = RidgeRegression::new(self.config.plane_alpha());
        global.fit_weighted(x, y, None)?;
        let global_centre = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));

        let labels = self.initial_labels(x)?;
        let mut memberships = Self::one_hot(&labels, self.config.n_planes);
        let mut state: Option<(Vec<RidgeRegression>, Array2<f64>)> = None;

        for iter in 0..self.config.max_iter {
            let fitted = self.fit_planes(x, y, &memberships, state.as_ref(), &global, &global_centre)?;
            let cost = self.costs(x, y, &fitted.0, &fitted.1)?;
            let next = self.assign(x, &cost);
            state = Some(fitted);

            let moved = (&next - &memberships).mapv(f64::abs).sum();
            memberships = next;
            if moved < 1e-9 {
                debug!(iter, kind = ?self.config.kind, "clusterwise assignment converged");
                break;
            }
        }

        let (planes, centres) =
            self.fit_planes(x, y, &memberships, state.as_ref(), &global, &global_centre)?;
        let bandwidth = x
            .rows()
            .into_iter()
            .map(|row| {
                centres
                    .rows()
                    .into_iter()
                    .map(|c| euclidean_sq(row, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .sum::<f64>()
            / n as f64;
        let groups = self.group_clusters(x, &memberships);

        self.fitted = Some(FittedPlanes {
            planes,
            centres,
            bandwidth: bandwidth.max(1e-12),
            groups,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fitted = self.fitted.as_ref().ok_or(SweepError::ModelNotFitted)?;
        if x.ncols() != fitted.centres.ncols() {
            return Err(SweepError::ShapeError {
                expected: format!("{} features", fitted.centres.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let per_plane: Vec<Array1<f64>> = fitted
            .planes
            .iter()
            .map(|p| p.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Array1::zeros(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            if self.config.weighted {
                let d: Vec<f64> = fitted
                    .centres
                    .rows()
                    .into_iter()
                    .map(|c| euclidean_sq(row, c))
                    .collect();
                let lo = d.iter().copied().fold(f64::INFINITY, f64::min);
                let w: Vec<f64> = d.iter().map(|v| (-(v - lo) / fitted.bandwidth).exp()).collect();
                let total: f64 = w.iter().sum();
                out[i] = w
                    .iter()
                    .zip(per_plane.iter())
                    .map(|(wc, p)| wc * p[i])
                    .sum::<f64>()
                    / total;
                continue;
            }

            let cluster = match self.config.kind {
                ClusterwiseKind::Clrc { constr_id } => fitted
                    .groups
                    .get(&row[constr_id].to_bits())
                    .copied()
                    .unwrap_or_else(|| nearest(row, &fitted.centres)),
                _ => nearest(row, &fitted.centres),
            };
            out[i] = per_plane[cluster][i];
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        match self.config.kind {
            ClusterwiseKind::KPlane => "kplane",
            ClusterwiseKind::Clrp => "CLS_p",
            ClusterwiseKind::Clrc { .. } => "CLS_c",
        }
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(ClusterwiseRegressor {
            config: self.config.clone(),
            fitted: None,
        })
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}
