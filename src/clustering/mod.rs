// src/clustering/mod.rs

pub mod agglomerative;
pub mod birch;
pub mod dbscan;
pub mod kmeans;
pub mod minibatch_kmeans;

pub use agglomerative::Agglomerative;
pub use birch::Birch;
pub use dbscan::Dbscan;
pub use kmeans::KMeans;
pub use minibatch_kmeans::MiniBatchKMeans;

use crate::config::PipelineConfig;
use crate::error::ClusterError;
use crate::matrix::DenseMatrix;

/// Cluster assignment meaning "no cluster" (density-based noise).
pub const NOISE: i32 = -1;

/// Capability shared by every algorithm in the roster: assign one integer
/// label per row of `x`, using [`NOISE`] for unassigned rows.
pub trait ClusteringAlgorithm {
    fn fit_predict(&self, x: &DenseMatrix) -> Result<Vec<i32>, ClusterError>;
}

/// The closed set of algorithms the experiment knows how to run.
#[derive(Debug, Clone)]
pub enum Algorithm {
    KMeans(KMeans),
    MiniBatchKMeans(MiniBatchKMeans),
    Birch(Birch),
    Dbscan(Dbscan),
    Agglomerative(Agglomerative),
}

impl ClusteringAlgorithm for Algorithm {
    fn fit_predict(&self, x: &DenseMatrix) -> Result<Vec<i32>, ClusterError> {
        match self {
            Algorithm::KMeans(a) => a.fit_predict(x),
            Algorithm::MiniBatchKMeans(a) => a.fit_predict(x),
            Algorithm::Birch(a) => a.fit_predict(x),
            Algorithm::Dbscan(a) => a.fit_predict(x),
            Algorithm::Agglomerative(a) => a.fit_predict(x),
        }
    }
}

/// A named algorithm instance, as listed in the results table.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub name: String,
    pub algorithm: Algorithm,
}

/// Baseline roster for a dataset with `n_classes` ground-truth classes.
pub fn baseline_roster(n_classes: usize, config: &PipelineConfig) -> Vec<RosterEntry> {
    let mut roster = vec![
        RosterEntry {
            name: format!("KMeans (K={n_classes})"),
            algorithm: Algorithm::KMeans(KMeans::from_config(n_classes, config)),
        },
        RosterEntry {
            name: format!("MiniBatchKMeans (K={n_classes})"),
            algorithm: Algorithm::MiniBatchKMeans(MiniBatchKMeans::from_config(n_classes, config)),
        },
        RosterEntry {
            name: format!("Birch (K={n_classes})"),
            algorithm: Algorithm::Birch(Birch::from_config(n_classes, config)),
        },
        RosterEntry {
            name: "DBSCAN (Base)".to_string(),
            algorithm: Algorithm::Dbscan(Dbscan::new(config.dbscan_eps, config.dbscan_min_samples)),
        },
    ];
    if config.extended_roster {
        roster.push(RosterEntry {
            name: format!("Agglomerative (K={n_classes})"),
            algorithm: Algorithm::Agglomerative(Agglomerative::new(n_classes)),
        });
    }
    roster
}

/// Common input checks for the centroid-based algorithms.
pub(crate) fn check_input(x: &DenseMatrix, n_clusters: usize) -> Result<(), ClusterError> {
    if x.is_empty() {
        return Err(ClusterError::EmptyInput);
    }
    if n_clusters == 0 {
        return Err(ClusterError::InvalidParameter(
            "n_clusters must be at least 1".to_string(),
        ));
    }
    if x.n_rows() < n_clusters {
        return Err(ClusterError::TooFewSamples {
            n_samples: x.n_rows(),
            n_clusters,
        });
    }
    check_finite(x)
}

pub(crate) fn check_finite(x: &DenseMatrix) -> Result<(), ClusterError> {
    if x.as_slice().iter().any(|v| !v.is_finite()) {
        return Err(ClusterError::Numerical(
            "input contains NaN or infinity".to_string(),
        ));
    }
    Ok(())
}
