// src/preprocess/pca.rs

use rayon::prelude::*;

use crate::error::PipelineError;
use crate::matrix::DenseMatrix;

/// Upper bound on Jacobi sweeps; convergence is quadratic so this is never reached
/// on a well-formed covariance matrix.
const MAX_SWEEPS: usize = 100;

/// Linear projection onto the leading eigenvectors of the covariance matrix.
#[derive(Debug, Clone)]
pub struct Pca {
    pub n_components: usize,
}

/// Output of [`Pca::fit_transform`].
#[derive(Debug, Clone)]
pub struct PcaProjection {
    /// `n_samples x n_components` projected data.
    pub transformed: DenseMatrix,
    /// `n_components x n_features`, one unit-length axis per row.
    pub components: DenseMatrix,
    /// Per-component fraction of the total variance.
    pub explained_variance_ratio: Vec<f64>,
    pub mean: Vec<f64>,
}

impl PcaProjection {
    pub fn total_explained_variance(&self) -> f64 {
        self.explained_variance_ratio.iter().sum()
    }
}

impl Pca {
    pub fn new(n_components: usize) -> Self {
        Self { n_components }
    }

    /// Number of components actually produced for an `n_samples x n_features` input.
    pub fn effective_components(&self, n_samples: usize, n_features: usize) -> usize {
        self.n_components.min(n_samples).min(n_features)
    }

    pub fn fit_transform(&self, x: &DenseMatrix) -> Result<PcaProjection, PipelineError> {
        let (n, d) = x.shape();
        if n == 0 || d == 0 {
            return Err(PipelineError::Decomposition(format!(
                "cannot decompose a {n}x{d} matrix"
            )));
        }
        let n_components = self.effective_components(n, d);
        if n_components == 0 {
            return Err(PipelineError::Decomposition("zero components requested".to_string()));
        }
        if n_components < self.n_components {
            log::warn!(
                "Requested {} components but the data is {}x{}; keeping {}",
                self.n_components,
                n,
                d,
                n_components
            );
        }

        let mean = x.column_means();
        let covariance = covariance_matrix(x, &mean);
        let (eigenvalues, eigenvectors) = symmetric_eigen(covariance, d)?;

        // Order axes by decreasing variance.
        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let total: f64 = eigenvalues.iter().map(|&v| v.max(0.0)).sum();
        let mut components = DenseMatrix::zeros(n_components, d);
        let mut explained_variance_ratio = Vec::with_capacity(n_components);

        for (c, &j) in order.iter().take(n_components).enumerate() {
            let axis = components.row_mut(c);
            for k in 0..d {
                axis[k] = eigenvectors[k * d + j];
            }
            // Deterministic sign: largest loading positive.
            let pivot = axis
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            if pivot < 0.0 {
                axis.iter_mut().for_each(|v| *v = -*v);
            }
            let ratio = if total > 0.0 { eigenvalues[j].max(0.0) / total } else { 0.0 };
            explained_variance_ratio.push(ratio);
        }

        let mut transformed = DenseMatrix::zeros(n, n_components);
        transformed
            .as_mut_slice()
            .par_chunks_mut(n_components)
            .enumerate()
            .for_each(|(i, out)| {
                let row = x.row(i);
                for (c, slot) in out.iter_mut().enumerate() {
                    let axis = components.row(c);
                    *slot = row
                        .iter()
                        .zip(&mean)
                        .zip(axis)
                        .map(|((&v, &m), &w)| (v - m) * w)
                        .sum();
                }
            });

        log::debug!(
            "PCA kept {} components explaining {:.4} of the variance",
            n_components,
            explained_variance_ratio.iter().sum::<f64>()
        );

        Ok(PcaProjection {
            transformed,
            components,
            explained_variance_ratio,
            mean,
        })
    }
}

/// Sample covariance (`n - 1` denominator) of the columns of `x`, row-major `d x d`.
fn covariance_matrix(x: &DenseMatrix, mean: &[f64]) -> Vec<f64> {
    let (n, d) = x.shape();
    let mut cov = (0..n)
        .into_par_iter()
        .fold(
            || vec![0.0; d * d],
            |mut acc, i| {
                let row = x.row(i);
                for p in 0..d {
                    let dp = row[p] - mean[p];
                    if dp == 0.0 {
                        continue;
                    }
                    for q in p..d {
                        acc[p * d + q] += dp * (row[q] - mean[q]);
                    }
                }
                acc
            },
        )
        .reduce(
            || vec![0.0; d * d],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                a
            },
        );

    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
    for p in 0..d {
        for q in p..d {
            let v = cov[p * d + q] / denom;
            cov[p * d + q] = v;
            cov[q * d + p] = v;
        }
    }
    cov
}

/// Cyclic Jacobi eigendecomposition of a symmetric `n x n` row-major matrix.
///
/// Returns `(eigenvalues, eigenvectors)` where column `j` of the row-major
/// eigenvector matrix belongs to `eigenvalues[j]`.
pub fn symmetric_eigen(mut a: Vec<f64>, n: usize) -> Result<(Vec<f64>, Vec<f64>), PipelineError> {
    if a.len() != n * n {
        return Err(PipelineError::Decomposition(format!(
            "expected {} entries for a {n}x{n} matrix, got {}",
            n * n,
            a.len()
        )));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::Decomposition("matrix contains non-finite values".to_string()));
    }

    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    let scale: f64 = a.iter().map(|x| x * x).sum();
    let tolerance = scale * 1e-24;
    let mut converged = false;

    for sweep in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[p * n + q] * a[p * n + q];
            }
        }
        if off <= tolerance {
            log::debug!("Jacobi converged after {} sweeps", sweep);
            converged = true;
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq == 0.0 {
                    continue;
                }
                let app = a[p * n + p];
                let aqq = a[q * n + q];
                let theta = (aqq - app) / (2.0 * apq);
                let t = if theta == 0.0 {
                    1.0
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // A <- A J
                for k in 0..n {
                    let akp = a[k * n + p];
                    let akq = a[k * n + q];
                    a[k * n + p] = c * akp - s * akq;
                    a[k * n + q] = s * akp + c * akq;
                }
                // A <- J^T A
                for k in 0..n {
                    let apk = a[p * n + k];
                    let aqk = a[q * n + k];
                    a[p * n + k] = c * apk - s * aqk;
                    a[q * n + k] = s * apk + c * aqk;
                }
                // V <- V J
                for k in 0..n {
                    let vkp = v[k * n + p];
                    let vkq = v[k * n + q];
                    v[k * n + p] = c * vkp - s * vkq;
                    v[k * n + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    if !converged {
        return Err(PipelineError::Decomposition(format!(
            "Jacobi eigensolver did not converge in {MAX_SWEEPS} sweeps"
        )));
    }

    let eigenvalues = (0..n).map(|i| a[i * n + i]).collect();
    Ok((eigenvalues, v))
}
