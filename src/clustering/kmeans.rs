// src/clustering/kmeans.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::{check_input, ClusteringAlgorithm};
use crate::config::PipelineConfig;
use crate::error::ClusterError;
use crate::matrix::{nearest_center, squared_euclidean, DenseMatrix};

/// Lloyd's k-means with k-means++ seeding.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iter: usize,
    /// Relative to the mean per-feature variance of the input.
    pub tol: f64,
    pub random_state: u64,
}

/// Fitted centers plus the assignment of the training rows.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub centers: DenseMatrix,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub n_iter: usize,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            tol: 1e-4,
            random_state: 42,
        }
    }

    pub fn from_config(n_clusters: usize, config: &PipelineConfig) -> Self {
        Self {
            n_clusters,
            max_iter: config.kmeans_max_iter,
            tol: config.kmeans_tol,
            random_state: config.random_state,
        }
    }

    pub fn fit(&self, x: &DenseMatrix) -> Result<KMeansFit, ClusterError> {
        check_input(x, self.n_clusters)?;
        if self.max_iter == 0 {
            return Err(ClusterError::InvalidParameter("max_iter must be at least 1".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut centers = kmeans_plus_plus(x, self.n_clusters, &mut rng);

        let variances = x.column_variances();
        let mean_variance = variances.iter().sum::<f64>() / variances.len().max(1) as f64;
        let tol = self.tol * mean_variance;

        let mut assignment = assign_all(x, &centers);
        let mut n_iter = 0;

        for _ in 0..self.max_iter {
            n_iter += 1;

            let new_centers = recompute_centers(x, &assignment, self.n_clusters);
            let shift: f64 = (0..self.n_clusters)
                .map(|c| squared_euclidean(centers.row(c), new_centers.row(c)))
                .sum();
            centers = new_centers;

            let next = assign_all(x, &centers);
            let unchanged = next
                .iter()
                .zip(&assignment)
                .all(|(a, b)| a.0 == b.0);
            assignment = next;

            if unchanged || shift <= tol {
                log::debug!("k-means converged after {} iterations (shift {:.3e})", n_iter, shift);
                break;
            }
        }

        let inertia = assignment.iter().map(|&(_, d)| d).sum();
        Ok(KMeansFit {
            centers,
            labels: assignment.into_iter().map(|(c, _)| c).collect(),
            inertia,
            n_iter,
        })
    }
}

impl ClusteringAlgorithm for KMeans {
    fn fit_predict(&self, x: &DenseMatrix) -> Result<Vec<i32>, ClusterError> {
        let fit = self.fit(x)?;
        Ok(fit.labels.into_iter().map(|c| c as i32).collect())
    }
}

/// Nearest center (and squared distance) for every row, in parallel.
pub(crate) fn assign_all(x: &DenseMatrix, centers: &DenseMatrix) -> Vec<(usize, f64)> {
    (0..x.n_rows())
        .into_par_iter()
        .map(|i| nearest_center(x.row(i), centers))
        .collect()
}

/// Member means; an empty cluster is re-seeded with the row farthest from its
/// current center that has not already been used for re-seeding.
fn recompute_centers(x: &DenseMatrix, assignment: &[(usize, f64)], k: usize) -> DenseMatrix {
    let d = x.n_cols();
    let mut centers = DenseMatrix::zeros(k, d);
    let mut counts = vec![0usize; k];

    for (i, &(c, _)) in assignment.iter().enumerate() {
        counts[c] += 1;
        for (acc, &v) in centers.row_mut(c).iter_mut().zip(x.row(i)) {
            *acc += v;
        }
    }

    let mut far_rows: Vec<usize> = (0..assignment.len()).collect();
    far_rows.sort_by(|&a, &b| assignment[b].1.total_cmp(&assignment[a].1));
    let mut far_iter = far_rows.into_iter();

    for c in 0..k {
        if counts[c] > 0 {
            let n = counts[c] as f64;
            centers.row_mut(c).iter_mut().for_each(|v| *v /= n);
        } else if let Some(i) = far_iter.next() {
            log::debug!("Re-seeding empty cluster {} with row {}", c, i);
            centers.row_mut(c).copy_from_slice(x.row(i));
        }
    }
    centers
}

/// k-means++ seeding: each new center is drawn with probability proportional
/// to its squared distance from the closest center chosen so far.
pub(crate) fn kmeans_plus_plus<R: Rng>(x: &DenseMatrix, k: usize, rng: &mut R) -> DenseMatrix {
    let n = x.n_rows();
    let mut centers = DenseMatrix::zeros(k, x.n_cols());
    if n == 0 || k == 0 {
        return centers;
    }

    let first = rng.gen_range(0..n);
    centers.row_mut(0).copy_from_slice(x.row(first));
    let mut closest: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| squared_euclidean(x.row(i), centers.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                cumulative += d;
                if cumulative >= target && d > 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // every row coincides with a center already
            rng.gen_range(0..n)
        };

        centers.row_mut(c).copy_from_slice(x.row(pick));
        let center = centers.row(c);
        closest
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, best)| {
                let d = squared_euclidean(x.row(i), center);
                if d < *best {
                    *best = d;
                }
            });
    }
    centers
}
