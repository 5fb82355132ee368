// src/clustering/minibatch_kmeans.rs

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use super::kmeans::{assign_all, kmeans_plus_plus};
use super::{check_input, ClusteringAlgorithm};
use crate::config::PipelineConfig;
use crate::error::ClusterError;
use crate::matrix::{nearest_center, DenseMatrix};

/// k-means trained on random mini-batches with per-center learning rates.
#[derive(Debug, Clone)]
pub struct MiniBatchKMeans {
    pub n_clusters: usize,
    pub batch_size: usize,
    /// Passes over the dataset.
    pub max_iter: usize,
    /// Stop after this many batches without improving the smoothed inertia.
    pub max_no_improvement: usize,
    pub random_state: u64,
}

impl MiniBatchKMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            batch_size: 1024,
            max_iter: 100,
            max_no_improvement: 10,
            random_state: 42,
        }
    }

    pub fn from_config(n_clusters: usize, config: &PipelineConfig) -> Self {
        Self {
            batch_size: config.minibatch_size,
            random_state: config.random_state,
            ..Self::new(n_clusters)
        }
    }

    /// Fit the centers; returns them with the number of batches processed.
    pub fn fit(&self, x: &DenseMatrix) -> Result<(DenseMatrix, usize), ClusterError> {
        check_input(x, self.n_clusters)?;
        if self.batch_size == 0 {
            return Err(ClusterError::InvalidParameter("batch_size must be at least 1".to_string()));
        }

        let n = x.n_rows();
        let mut rng = StdRng::seed_from_u64(self.random_state);

        // Seed on a random subsample of 3 batches (but never fewer rows than clusters).
        let init_size = (3 * self.batch_size).max(self.n_clusters).min(n);
        let init_rows = sample(&mut rng, n, init_size).into_vec();
        let init_x = x.select_rows(&init_rows);
        let mut centers = kmeans_plus_plus(&init_x, self.n_clusters, &mut rng);

        let batch_size = self.batch_size.min(n);
        let steps_per_epoch = n.div_ceil(batch_size);
        let n_steps = (self.max_iter * steps_per_epoch).max(1);

        let mut counts = vec![0.0f64; self.n_clusters];
        let alpha = (2.0 * batch_size as f64 / (n as f64 + 1.0)).min(1.0);
        let mut ewa_inertia: Option<f64> = None;
        let mut best_ewa = f64::INFINITY;
        let mut no_improvement = 0;
        let mut steps_done = 0;

        for _ in 0..n_steps {
            steps_done += 1;
            let mut batch_inertia = 0.0;

            for _ in 0..batch_size {
                let i = rng.gen_range(0..n);
                let row = x.row(i);
                let (c, dist) = nearest_center(row, &centers);
                batch_inertia += dist;

                counts[c] += 1.0;
                let eta = 1.0 / counts[c];
                for (center_v, &v) in centers.row_mut(c).iter_mut().zip(row) {
                    *center_v += eta * (v - *center_v);
                }
            }

            let batch_inertia = batch_inertia / batch_size as f64;
            let ewa = match ewa_inertia {
                Some(prev) => prev * (1.0 - alpha) + batch_inertia * alpha,
                None => batch_inertia,
            };
            ewa_inertia = Some(ewa);

            if ewa < best_ewa {
                best_ewa = ewa;
                no_improvement = 0;
            } else {
                no_improvement += 1;
                if no_improvement >= self.max_no_improvement {
                    log::debug!(
                        "Mini-batch k-means stopped early after {} batches",
                        steps_done
                    );
                    break;
                }
            }
        }

        Ok((centers, steps_done))
    }
}

impl ClusteringAlgorithm for MiniBatchKMeans {
    fn fit_predict(&self, x: &DenseMatrix) -> Result<Vec<i32>, ClusterError> {
        let (centers, _) = self.fit(x)?;
        Ok(assign_all(x, &centers)
            .into_iter()
            .map(|(c, _)| c as i32)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::test_data::{same_partition, three_blobs};

    #[test]
    fn recovers_separated_blobs() {
        let (x, truth) = three_blobs(30);
        let algo = MiniBatchKMeans {
            batch_size: 16,
            ..MiniBatchKMeans::new(3)
        };
        let labels = algo.fit_predict(&x).unwrap();
        assert!(same_partition(&labels, &truth));
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let (x, _) = three_blobs(10);
        let algo = MiniBatchKMeans::new(3);
        assert_eq!(algo.fit_predict(&x).unwrap(), algo.fit_predict(&x).unwrap());
    }

    #[test]
    fn rejects_zero_clusters() {
        let (x, _) = three_blobs(3);
        assert!(MiniBatchKMeans::new(0).fit_predict(&x).is_err());
    }
}
