//src/tuning.rs

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use crate::clustering::KMeans;
use crate::config::PipelineConfig;
use crate::correlation::Compass;
use crate::evaluate::evaluate_clustering;
use crate::matrix::DenseMatrix;
use crate::types::{EvaluationResult, MetricKind};

/// Outcome of the K search driven by the validated compass metric.
#[derive(Debug, Clone)]
pub struct TuningOutcome {
    pub compass: Compass,
    pub k_range: RangeInclusive<usize>,
    /// One row per K, in search order.
    pub results: Vec<EvaluationResult>,
    pub best: Option<EvaluationResult>,
}

/// Order two metric values so the better one comes first; NaN always sorts last.
fn compare_by(metric: MetricKind, a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if metric.higher_is_better() => b.total_cmp(&a),
        (false, false) => a.total_cmp(&b),
    }
}

/// Stable sort of `results`, best first according to `metric`.
pub fn rank_by_metric(results: &mut [EvaluationResult], metric: MetricKind) {
    results.sort_by(|a, b| compare_by(metric, a.metric(metric), b.metric(metric)));
}

/// Re-run k-means for every K in the configured range around `n_classes` and
/// pick the run the compass metric rates best.
pub fn tune_kmeans(
    x: &DenseMatrix,
    labels_true: &[usize],
    n_classes: usize,
    compass: Compass,
    config: &PipelineConfig,
) -> TuningOutcome {
    let k_range = config.tuning_range(n_classes);
    log::info!(
        "Tuning k-means with K from {} to {} by {}",
        k_range.start(),
        k_range.end(),
        compass.metric
    );

    let results: Vec<EvaluationResult> = k_range
        .clone()
        .map(|k| {
            let kmeans = KMeans::from_config(k, config);
            evaluate_clustering(&kmeans, x, labels_true, &format!("KMeans (k={k})"))
        })
        .collect();

    let mut ranked = results.clone();
    rank_by_metric(&mut ranked, compass.metric);
    let best = ranked.into_iter().next();

    TuningOutcome {
        compass,
        k_range,
        results,
        best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, sil: f64, db: f64) -> EvaluationResult {
        EvaluationResult::scored(name, 2, sil, db, 0.0, 0.0)
    }

    #[test]
    fn silhouette_ranks_descending() {
        let mut rows = vec![result("a", 0.2, 1.0), result("b", 0.6, 2.0), result("c", f64::NAN, 0.5)];
        rank_by_metric(&mut rows, MetricKind::Silhouette);
        let names: Vec<&str> = rows.iter().map(|r| r.algorithm_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn davies_bouldin_ranks_ascending_and_stable() {
        let mut rows = vec![result("a", 0.0, 2.0), result("b", 0.0, 1.0), result("c", 0.0, 1.0)];
        rank_by_metric(&mut rows, MetricKind::DaviesBouldin);
        let names: Vec<&str> = rows.iter().map(|r| r.algorithm_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn failed_runs_rank_last_for_either_compass() {
        let mut rows = vec![EvaluationResult::failed("f", 0.0), result("ok", 0.1, 5.0)];
        rank_by_metric(&mut rows, MetricKind::Silhouette);
        assert_eq!(rows[0].algorithm_name, "ok");
        rank_by_metric(&mut rows, MetricKind::DaviesBouldin);
        assert_eq!(rows[0].algorithm_name, "ok");
    }

    #[test]
    fn tuning_covers_range_and_picks_best() {
        use crate::clustering::test_data::three_blobs;

        let (x, truth) = three_blobs(10);
        let compass = Compass { metric: MetricKind::Silhouette, correlation: 0.9 };
        let config = PipelineConfig { tuning_radius: 2, ..Default::default() };
        let outcome = tune_kmeans(&x, &truth, 3, compass, &config);

        assert_eq!(outcome.k_range, 2..=5);
        assert_eq!(outcome.results.len(), 4);
        assert_eq!(outcome.results[0].algorithm_name, "KMeans (k=2)");
        let best = outcome.best.unwrap();
        assert_eq!(best.cluster_count, 3);
    }
}
