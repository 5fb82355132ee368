// src/clustering/dbscan.rs

use rayon::prelude::*;

use super::{check_finite, ClusteringAlgorithm, NOISE};
use crate::error::ClusterError;
use crate::matrix::{squared_euclidean, DenseMatrix};

/// Density-based clustering with euclidean `eps` neighbourhoods.
/// Rows that are neither core points nor reachable from one are labelled [`NOISE`].
#[derive(Debug, Clone)]
pub struct Dbscan {
    pub eps: f64,
    pub min_samples: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Rows within `eps` of row `i`, including `i` itself.
    fn region_query(&self, x: &DenseMatrix, i: usize) -> Vec<usize> {
        let eps2 = self.eps * self.eps;
        let point = x.row(i);
        (0..x.n_rows())
            .into_par_iter()
            .filter(|&j| squared_euclidean(point, x.row(j)) <= eps2)
            .collect()
    }
}

impl ClusteringAlgorithm for Dbscan {
    fn fit_predict(&self, x: &DenseMatrix) -> Result<Vec<i32>, ClusterError> {
        if x.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        if !(self.eps > 0.0) {
            return Err(ClusterError::InvalidParameter("eps must be positive".to_string()));
        }
        if self.min_samples == 0 {
            return Err(ClusterError::InvalidParameter("min_samples must be at least 1".to_string()));
        }
        check_finite(x)?;

        let n = x.n_rows();
        let eps2 = self.eps * self.eps;

        let is_core: Vec<bool> = (0..n)
            .into_par_iter()
            .map(|i| {
                let point = x.row(i);
                let mut count = 0;
                for j in 0..n {
                    if squared_euclidean(point, x.row(j)) <= eps2 {
                        count += 1;
                        if count >= self.min_samples {
                            return true;
                        }
                    }
                }
                false
            })
            .collect();

        let mut labels = vec![NOISE; n];
        let mut cluster = 0i32;

        for seed in 0..n {
            if !is_core[seed] || labels[seed] != NOISE {
                continue;
            }
            labels[seed] = cluster;
            let mut frontier = vec![seed];
            while let Some(p) = frontier.pop() {
                for q in self.region_query(x, p) {
                    if labels[q] == NOISE {
                        labels[q] = cluster;
                        if is_core[q] {
                            frontier.push(q);
                        }
                    }
                }
            }
            cluster += 1;
        }

        let noise = labels.iter().filter(|&&l| l == NOISE).count();
        log::debug!("DBSCAN found {} clusters and {} noise rows", cluster, noise);
        Ok(labels)
    }
}
