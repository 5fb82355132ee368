//src/metrics.rs

use std::hash::Hash;

use ahash::AHashMap;
use rayon::prelude::*;

use crate::error::MetricError;
use crate::matrix::{euclidean, DenseMatrix};

// ---------------------------------------------------------------------------
//  Helpers
// ---------------------------------------------------------------------------

/// Map arbitrary labels to dense ids `0..n_distinct` (first-appearance order).
fn densify<T: Hash + Eq + Copy>(labels: &[T]) -> (Vec<usize>, usize) {
    let mut ids: AHashMap<T, usize> = AHashMap::new();
    let dense = labels
        .iter()
        .map(|l| {
            let next = ids.len();
            *ids.entry(*l).or_insert(next)
        })
        .collect();
    (dense, ids.len())
}

/// Both internal metrics are only defined for `2 <= n_labels <= n_samples - 1`.
fn check_labels(x: &DenseMatrix, labels: &[i32]) -> Result<(Vec<usize>, usize), MetricError> {
    if x.n_rows() != labels.len() {
        return Err(MetricError::LengthMismatch {
            left: x.n_rows(),
            right: labels.len(),
        });
    }
    if labels.is_empty() {
        return Err(MetricError::EmptyInput);
    }
    let (dense, n_labels) = densify(labels);
    if n_labels < 2 || n_labels >= labels.len() {
        return Err(MetricError::InvalidLabelCount {
            n_labels,
            n_samples: labels.len(),
        });
    }
    Ok((dense, n_labels))
}

// ---------------------------------------------------------------------------
//  Internal metrics
// ---------------------------------------------------------------------------

/// Mean silhouette coefficient over all rows (euclidean distance).
/// Rows in singleton clusters score 0.
pub fn silhouette_score(x: &DenseMatrix, labels: &[i32]) -> Result<f64, MetricError> {
    let (dense, n_labels) = check_labels(x, labels)?;
    let n = labels.len();

    let mut sizes = vec![0usize; n_labels];
    for &c in &dense {
        sizes[c] += 1;
    }

    let total: f64 = (0..n)
        .into_par_iter()
        .map(|i| {
            let own = dense[i];
            if sizes[own] <= 1 {
                return 0.0;
            }
            let mut sums = vec![0.0; n_labels];
            let row = x.row(i);
            for j in 0..n {
                if j != i {
                    sums[dense[j]] += euclidean(row, x.row(j));
                }
            }
            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = (0..n_labels)
                .filter(|&c| c != own)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom > 0.0 { (b - a) / denom } else { 0.0 }
        })
        .sum();

    Ok(total / n as f64)
}

/// Davies-Bouldin index: mean over clusters of the worst
/// `(scatter_i + scatter_j) / centroid_distance_ij` ratio. Lower is better.
pub fn davies_bouldin_score(x: &DenseMatrix, labels: &[i32]) -> Result<f64, MetricError> {
    let (dense, n_labels) = check_labels(x, labels)?;
    let d = x.n_cols();

    let mut centroids = DenseMatrix::zeros(n_labels, d);
    let mut sizes = vec![0usize; n_labels];
    for (i, &c) in dense.iter().enumerate() {
        sizes[c] += 1;
        for (acc, &v) in centroids.row_mut(c).iter_mut().zip(x.row(i)) {
            *acc += v;
        }
    }
    for c in 0..n_labels {
        let n = sizes[c] as f64;
        centroids.row_mut(c).iter_mut().for_each(|v| *v /= n);
    }

    let mut scatter = vec![0.0; n_labels];
    for (i, &c) in dense.iter().enumerate() {
        scatter[c] += euclidean(x.row(i), centroids.row(c));
    }
    for c in 0..n_labels {
        scatter[c] /= sizes[c] as f64;
    }

    let mut separation = vec![0.0; n_labels * n_labels];
    for a in 0..n_labels {
        for b in (a + 1)..n_labels {
            let dist = euclidean(centroids.row(a), centroids.row(b));
            separation[a * n_labels + b] = dist;
            separation[b * n_labels + a] = dist;
        }
    }

    const ATOL: f64 = 1e-8;
    if scatter.iter().all(|s| s.abs() <= ATOL) || separation.iter().all(|s| s.abs() <= ATOL) {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for a in 0..n_labels {
        let worst = (0..n_labels)
            .filter(|&b| b != a)
            .map(|b| {
                let dist = separation[a * n_labels + b];
                if dist == 0.0 { 0.0 } else { (scatter[a] + scatter[b]) / dist }
            })
            .fold(0.0, f64::max);
        total += worst;
    }
    Ok(total / n_labels as f64)
}

// ---------------------------------------------------------------------------
//  External metrics
// ---------------------------------------------------------------------------

/// Homogeneity, completeness and their harmonic mean (the V-measure) of a
/// predicted partition against ground truth. Natural-log entropies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VMeasure {
    pub homogeneity: f64,
    pub completeness: f64,
    pub v_measure: f64,
}

fn entropy(counts: &[usize], n: f64) -> f64 {
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum()
}

pub fn homogeneity_completeness_v_measure<T, U>(
    labels_true: &[T],
    labels_pred: &[U],
) -> Result<VMeasure, MetricError>
where
    T: Hash + Eq + Copy,
    U: Hash + Eq + Copy,
{
    if labels_true.len() != labels_pred.len() {
        return Err(MetricError::LengthMismatch {
            left: labels_true.len(),
            right: labels_pred.len(),
        });
    }
    if labels_true.is_empty() {
        return Ok(VMeasure {
            homogeneity: 1.0,
            completeness: 1.0,
            v_measure: 1.0,
        });
    }

    let n = labels_true.len() as f64;
    let (classes, n_classes) = densify(labels_true);
    let (clusters, n_clusters) = densify(labels_pred);

    let mut class_counts = vec![0usize; n_classes];
    let mut cluster_counts = vec![0usize; n_clusters];
    let mut contingency: AHashMap<(usize, usize), usize> = AHashMap::new();
    for (&c, &k) in classes.iter().zip(&clusters) {
        class_counts[c] += 1;
        cluster_counts[k] += 1;
        *contingency.entry((c, k)).or_insert(0) += 1;
    }

    let h_class = entropy(&class_counts, n);
    let h_cluster = entropy(&cluster_counts, n);

    let mutual_info: f64 = contingency
        .iter()
        .map(|(&(c, k), &n_ck)| {
            let n_ck = n_ck as f64;
            (n_ck / n) * ((n * n_ck) / (class_counts[c] as f64 * cluster_counts[k] as f64)).ln()
        })
        .sum();

    let homogeneity = if h_class == 0.0 { 1.0 } else { mutual_info / h_class };
    let completeness = if h_cluster == 0.0 { 1.0 } else { mutual_info / h_cluster };
    let v_measure = if homogeneity + completeness == 0.0 {
        0.0
    } else {
        2.0 * homogeneity * completeness / (homogeneity + completeness)
    };

    Ok(VMeasure {
        homogeneity,
        completeness,
        v_measure,
    })
}

pub fn v_measure_score<T, U>(labels_true: &[T], labels_pred: &[U]) -> Result<f64, MetricError>
where
    T: Hash + Eq + Copy,
    U: Hash + Eq + Copy,
{
    homogeneity_completeness_v_measure(labels_true, labels_pred).map(|v| v.v_measure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(values: &[f64]) -> DenseMatrix {
        let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        DenseMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn silhouette_of_two_pairs() {
        let x = line(&[0.0, 1.0, 10.0, 11.0]);
        let s = silhouette_score(&x, &[0, 0, 1, 1]).unwrap();
        let expected = (9.5 / 10.5 + 8.5 / 9.5) / 2.0;
        assert!((s - expected).abs() < 1e-12);
    }

    #[test]
    fn silhouette_singleton_scores_zero() {
        let x = line(&[0.0, 1.0, 10.0]);
        // row 2 is alone => contributes 0
        let s = silhouette_score(&x, &[0, 0, 1]).unwrap();
        let row0 = (10.0 - 1.0) / 10.0;
        let row1 = (9.0 - 1.0) / 9.0;
        assert!((s - (row0 + row1) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn silhouette_rejects_bad_label_counts() {
        let x = line(&[0.0, 1.0, 2.0]);
        assert!(matches!(
            silhouette_score(&x, &[0, 0, 0]),
            Err(MetricError::InvalidLabelCount { n_labels: 1, .. })
        ));
        assert!(matches!(
            silhouette_score(&x, &[0, 1, 2]),
            Err(MetricError::InvalidLabelCount { n_labels: 3, .. })
        ));
        assert!(matches!(
            silhouette_score(&x, &[0, 1]),
            Err(MetricError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn davies_bouldin_of_two_pairs() {
        let x = line(&[0.0, 1.0, 10.0, 11.0]);
        let db = davies_bouldin_score(&x, &[0, 0, 1, 1]).unwrap();
        assert!((db - 0.1).abs() < 1e-12);
    }

    #[test]
    fn davies_bouldin_zero_for_point_clusters() {
        let x = line(&[0.0, 0.0, 5.0]);
        let db = davies_bouldin_score(&x, &[0, 0, 1]).unwrap();
        assert_eq!(db, 0.0);
    }

    #[test]
    fn v_measure_is_label_permutation_invariant() {
        let v = v_measure_score(&[0usize, 0, 1, 1], &[1i32, 1, 0, 0]).unwrap();
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn v_measure_zero_for_independent_partition() {
        let v = v_measure_score(&[0usize, 0, 1, 1], &[0i32, 1, 0, 1]).unwrap();
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn homogeneous_but_incomplete() {
        // every cluster is pure, but class 0 is split in two
        let scores = homogeneity_completeness_v_measure(&[0usize, 0, 1, 1], &[0i32, 1, 2, 2]).unwrap();
        assert!((scores.homogeneity - 1.0).abs() < 1e-12);
        assert!(scores.completeness < 1.0);
        let expected = 2.0 * scores.homogeneity * scores.completeness
            / (scores.homogeneity + scores.completeness);
        assert!((scores.v_measure - expected).abs() < 1e-12);
        // completeness = I / H(K) = ln2 / (1.5 ln2)
        assert!((scores.completeness - 2.0 / 3.0).abs() < 1e-12);
    }
}
