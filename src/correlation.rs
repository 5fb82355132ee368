//src/correlation.rs

use crate::types::{EvaluationResult, MetricKind};

/// Pearson correlation; NaN when fewer than two points or either side is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
}

/// Only runs that produced at least two clusters with computable metrics
/// take part in the correlation; sentinel rows would skew it.
pub fn valid_results(results: &[EvaluationResult]) -> Vec<EvaluationResult> {
    results
        .iter()
        .filter(|r| r.metrics_defined && r.cluster_count > 1)
        .cloned()
        .collect()
}

/// Pairwise Pearson correlations between the three metrics across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub values: [[f64; 3]; 3],
    pub n_observations: usize,
}

impl CorrelationMatrix {
    pub fn from_results(results: &[EvaluationResult]) -> Self {
        let columns: Vec<Vec<f64>> = MetricKind::ALL
            .iter()
            .map(|&m| results.iter().map(|r| r.metric(m)).collect())
            .collect();

        let mut values = [[f64::NAN; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                values[i][j] = pearson(&columns[i], &columns[j]);
            }
        }
        Self {
            values,
            n_observations: results.len(),
        }
    }

    fn position(metric: MetricKind) -> usize {
        match metric {
            MetricKind::Silhouette => 0,
            MetricKind::DaviesBouldin => 1,
            MetricKind::VMeasure => 2,
        }
    }

    pub fn get(&self, a: MetricKind, b: MetricKind) -> f64 {
        self.values[Self::position(a)][Self::position(b)]
    }

    /// Correlation of each internal metric with the external one.
    pub fn with_external(&self) -> Vec<(MetricKind, f64)> {
        MetricKind::INTERNAL
            .iter()
            .map(|&m| (m, self.get(m, MetricKind::VMeasure)))
            .collect()
    }
}

/// The internal metric validated against ground truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compass {
    pub metric: MetricKind,
    pub correlation: f64,
}

/// Pick the internal metric with the largest absolute correlation to the
/// V-measure. Ties keep the first candidate; undefined correlations are skipped.
pub fn select_compass(matrix: &CorrelationMatrix) -> Option<Compass> {
    let mut best: Option<Compass> = None;
    for (metric, correlation) in matrix.with_external() {
        if correlation.is_nan() {
            continue;
        }
        match best {
            Some(b) if correlation.abs() <= b.correlation.abs() => {}
            _ => best = Some(Compass { metric, correlation }),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sil: f64, db: f64, v: f64) -> EvaluationResult {
        EvaluationResult::scored("r", 3, sil, db, v, 0.0)
    }

    #[test]
    fn pearson_basics() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0], &[1.0]).is_nan());
        assert!(pearson(&[1.0, 1.0], &[0.0, 5.0]).is_nan());
    }

    #[test]
    fn picks_davies_bouldin_when_more_correlated() {
        let results = vec![
            row(0.10, 3.0, 0.1),
            row(0.30, 2.0, 0.2),
            row(0.05, 1.0, 0.3),
        ];
        let matrix = CorrelationMatrix::from_results(&results);
        let compass = select_compass(&matrix).unwrap();
        assert_eq!(compass.metric, MetricKind::DaviesBouldin);
        assert!((compass.correlation + 1.0).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_silhouette() {
        let results = vec![row(1.0, 3.0, 0.1), row(2.0, 2.0, 0.2), row(3.0, 1.0, 0.3)];
        let matrix = CorrelationMatrix::from_results(&results);
        assert_eq!(select_compass(&matrix).unwrap().metric, MetricKind::Silhouette);
    }

    #[test]
    fn undefined_correlations_give_no_compass() {
        let matrix = CorrelationMatrix::from_results(&[row(0.5, 1.0, 0.2)]);
        assert!(select_compass(&matrix).is_none());
    }

    #[test]
    fn nan_candidate_is_skipped() {
        // constant silhouette column
        let results = vec![row(0.5, 3.0, 0.1), row(0.5, 2.5, 0.3)];
        let matrix = CorrelationMatrix::from_results(&results);
        assert!(matrix.get(MetricKind::Silhouette, MetricKind::VMeasure).is_nan());
        assert_eq!(select_compass(&matrix).unwrap().metric, MetricKind::DaviesBouldin);
    }

    #[test]
    fn valid_results_drop_single_cluster_runs() {
        let mut single = row(0.0, 0.0, 0.0);
        single.cluster_count = 1;
        let kept = valid_results(&[row(0.1, 1.0, 0.2), single]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn undefined_metric_rows_stay_out_of_the_correlation() {
        let scored = vec![row(0.40, 1.2, 0.80), row(0.30, 1.0, 0.60)];
        let mut all = scored.clone();
        // many clusters, but the metrics could not be computed
        all.push(EvaluationResult::degenerate("split", 30, 0.0));

        let kept = valid_results(&all);
        assert_eq!(kept.len(), 2);
        let matrix = CorrelationMatrix::from_results(&kept);
        let db_v = matrix.get(MetricKind::DaviesBouldin, MetricKind::VMeasure);
        assert!((db_v - 1.0).abs() < 1e-12);
        assert_eq!(matrix, CorrelationMatrix::from_results(&scored));
    }
}
