//src/config.rs

use crate::error::PipelineError;

/// Motif length of the skip-gram k-mers.
pub const K_MER_SIZE: usize = 2;

/// Gap between the two sampled residues ("2x2 skip 1").
pub const SKIP: usize = 1;

/// Number of principal components kept after scaling.
pub const N_COMPONENTS: usize = 300;

/// Seed shared by every randomised algorithm.
pub const RANDOM_STATE: u64 = 42;

/// All tunables of one experiment run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub kmer_size: usize,
    pub skip: usize,
    pub n_components: usize,
    pub random_state: u64,

    // ---------- baseline roster ----------
    pub kmeans_max_iter: usize,
    pub kmeans_tol: f64,
    pub minibatch_size: usize,
    pub birch_threshold: f64,
    pub birch_branching_factor: usize,
    pub dbscan_eps: f64,
    pub dbscan_min_samples: usize,
    /// Also run ward agglomerative clustering (quadratic in the sample count).
    pub extended_roster: bool,

    // ---------- tuning ----------
    /// K is searched over `max(2, C - radius) ..= C + radius`.
    pub tuning_radius: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kmer_size: K_MER_SIZE,
            skip: SKIP,
            n_components: N_COMPONENTS,
            random_state: RANDOM_STATE,
            kmeans_max_iter: 300,
            kmeans_tol: 1e-4,
            minibatch_size: 1024,
            birch_threshold: 0.5,
            birch_branching_factor: 50,
            dbscan_eps: 5.0,
            dbscan_min_samples: 25,
            extended_roster: false,
            tuning_radius: 5,
        }
    }
}

impl PipelineConfig {
    /// Rejects parameter combinations no stage can run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: &str| Err(PipelineError::InvalidParameter(msg.to_string()));

        if self.kmer_size == 0 {
            return invalid("kmer_size must be at least 1");
        }
        if self.n_components == 0 {
            return invalid("n_components must be at least 1");
        }
        if self.kmeans_max_iter == 0 {
            return invalid("kmeans_max_iter must be at least 1");
        }
        if !(self.kmeans_tol >= 0.0) {
            return invalid("kmeans_tol must be non-negative");
        }
        if self.minibatch_size == 0 {
            return invalid("minibatch_size must be at least 1");
        }
        if !(self.birch_threshold > 0.0) {
            return invalid("birch_threshold must be positive");
        }
        if self.birch_branching_factor < 2 {
            return invalid("birch_branching_factor must be at least 2");
        }
        if !(self.dbscan_eps > 0.0) {
            return invalid("dbscan_eps must be positive");
        }
        if self.dbscan_min_samples == 0 {
            return invalid("dbscan_min_samples must be at least 1");
        }
        Ok(())
    }

    /// Inclusive K range for the tuning stage given `n_classes` ground-truth classes.
    pub fn tuning_range(&self, n_classes: usize) -> std::ops::RangeInclusive<usize> {
        let start = n_classes.saturating_sub(self.tuning_radius).max(2);
        start..=n_classes + self.tuning_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.kmer_size, 2);
        assert_eq!(config.skip, 1);
        assert_eq!(config.n_components, 300);
    }

    #[test]
    fn rejects_zero_kmer_size() {
        let config = PipelineConfig { kmer_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_nan_eps() {
        let config = PipelineConfig { dbscan_eps: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tuning_range_is_clamped_at_two() {
        let config = PipelineConfig::default();
        assert_eq!(config.tuning_range(7), 2..=12);
        assert_eq!(config.tuning_range(3), 2..=8);
        assert_eq!(config.tuning_range(10), 5..=15);
    }
}
