//src/evaluate.rs

use std::time::Instant;

use crate::clustering::{ClusteringAlgorithm, NOISE};
use crate::error::MetricError;
use crate::matrix::DenseMatrix;
use crate::metrics::{davies_bouldin_score, silhouette_score, v_measure_score};
use crate::types::EvaluationResult;

/// Rows, ground truth and predictions with every noise-labelled row removed.
#[derive(Debug, Clone)]
pub struct NonNoiseRows {
    pub x: DenseMatrix,
    pub labels_true: Vec<usize>,
    pub labels_pred: Vec<i32>,
}

impl NonNoiseRows {
    pub fn cluster_count(&self) -> usize {
        let mut distinct = self.labels_pred.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    }
}

/// Drop rows whose prediction is [`NOISE`], keeping the three inputs aligned by position.
pub fn filter_noise(x: &DenseMatrix, labels_true: &[usize], labels_pred: &[i32]) -> NonNoiseRows {
    let keep: Vec<usize> = labels_pred
        .iter()
        .enumerate()
        .filter_map(|(i, &l)| (l != NOISE).then_some(i))
        .collect();

    NonNoiseRows {
        x: x.select_rows(&keep),
        labels_true: keep.iter().map(|&i| labels_true[i]).collect(),
        labels_pred: keep.iter().map(|&i| labels_pred[i]).collect(),
    }
}

fn score(rows: &NonNoiseRows) -> Result<(f64, f64, f64), MetricError> {
    let silhouette = silhouette_score(&rows.x, &rows.labels_pred)?;
    let davies_bouldin = davies_bouldin_score(&rows.x, &rows.labels_pred)?;
    let v_measure = v_measure_score(&rows.labels_true, &rows.labels_pred)?;
    Ok((silhouette, davies_bouldin, v_measure))
}

/// Run `algorithm` on `x` and score the result.
///
/// An algorithm error never propagates: it becomes the failure sentinel row.
/// Fewer than two non-noise clusters (or metrics that are undefined for the
/// partition) give the degenerate sentinel row. The elapsed time covers the
/// fit only.
pub fn evaluate_clustering<A: ClusteringAlgorithm + ?Sized>(
    algorithm: &A,
    x: &DenseMatrix,
    labels_true: &[usize],
    algorithm_name: &str,
) -> EvaluationResult {
    let start = Instant::now();
    let labels_pred = match algorithm.fit_predict(x) {
        Ok(labels) => labels,
        Err(e) => {
            log::warn!("{} failed: {}", algorithm_name, e);
            return EvaluationResult::failed(algorithm_name, start.elapsed().as_secs_f64());
        }
    };
    let elapsed = start.elapsed().as_secs_f64();

    if labels_pred.len() != x.n_rows() || labels_true.len() != x.n_rows() {
        log::warn!(
            "{} returned {} labels for {} rows ({} ground-truth labels)",
            algorithm_name,
            labels_pred.len(),
            x.n_rows(),
            labels_true.len()
        );
        return EvaluationResult::failed(algorithm_name, elapsed);
    }

    let rows = filter_noise(x, labels_true, &labels_pred);
    let cluster_count = rows.cluster_count();
    log::debug!(
        "{}: {} clusters, {} noise rows",
        algorithm_name,
        cluster_count,
        x.n_rows() - rows.labels_pred.len()
    );

    if cluster_count < 2 {
        return EvaluationResult::degenerate(algorithm_name, cluster_count, elapsed);
    }

    match score(&rows) {
        Ok((silhouette, davies_bouldin, v_measure)) => EvaluationResult::scored(
            algorithm_name,
            cluster_count,
            silhouette,
            davies_bouldin,
            v_measure,
            elapsed,
        ),
        Err(e) => {
            log::warn!("{}: metrics undefined ({})", algorithm_name, e);
            EvaluationResult::degenerate(algorithm_name, cluster_count, elapsed)
        }
    }
}
