//src/matrix.rs

use crate::error::PipelineError;

/// A preallocated, row-major `f64` matrix addressed by integer row/column.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Creates an all-zero `n_rows x n_cols` matrix.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
        }
    }

    /// Wraps an existing row-major buffer.
    pub fn from_vec(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self, PipelineError> {
        if data.len() != n_rows * n_cols {
            return Err(PipelineError::InvalidParameter(format!(
                "buffer of length {} cannot form a {}x{} matrix",
                data.len(),
                n_rows,
                n_cols
            )));
        }
        Ok(Self { n_rows, n_cols, data })
    }

    /// Builds a matrix from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, PipelineError> {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(PipelineError::InvalidParameter(format!(
                    "row {i} has {} columns, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            n_rows: rows.len(),
            n_cols,
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.n_cols;
        &mut self.data[start..start + self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size; a zero-width buffer is empty anyway
        self.data.chunks_exact(self.n_cols.max(1))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Copies the rows at `indices` (in that order) into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            n_rows: indices.len(),
            n_cols: self.n_cols,
            data,
        }
    }

    /// Per-column arithmetic mean.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.n_cols];
        if self.n_rows == 0 {
            return means;
        }
        for row in self.rows() {
            for (m, &v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        let n = self.n_rows as f64;
        for m in &mut means {
            *m /= n;
        }
        means
    }

    /// Per-column population variance.
    pub fn column_variances(&self) -> Vec<f64> {
        let means = self.column_means();
        let mut vars = vec![0.0; self.n_cols];
        if self.n_rows == 0 {
            return vars;
        }
        for row in self.rows() {
            for ((v, &x), &m) in vars.iter_mut().zip(row).zip(&means) {
                let d = x - m;
                *v += d * d;
            }
        }
        let n = self.n_rows as f64;
        for v in &mut vars {
            *v /= n;
        }
        vars
    }
}

// ---------------------------------------------------------------------------
//  Distance helpers
// ---------------------------------------------------------------------------

#[inline]
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Index and squared distance of the row in `centers` closest to `point`.
/// Ties keep the lowest index.
pub fn nearest_center(point: &[f64], centers: &DenseMatrix) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, center) in centers.rows().enumerate() {
        let d = squared_euclidean(point, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(DenseMatrix::from_rows(&rows).is_err());
    }

    #[test]
    fn indexed_access_is_row_major() {
        let m = DenseMatrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.rows().count(), 2);
    }

    #[test]
    fn select_rows_keeps_requested_order() {
        let m = DenseMatrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let picked = m.select_rows(&[2, 0]);
        assert_eq!(picked.as_slice(), &[2.0, 0.0]);
    }

    #[test]
    fn zero_width_matrix_has_no_rows_to_iterate() {
        let m = DenseMatrix::zeros(4, 0);
        assert_eq!(m.rows().count(), 0);
        assert_eq!(m.n_rows(), 4);
    }

    #[test]
    fn column_statistics() {
        let m = DenseMatrix::from_rows(&[vec![1.0, 0.0], vec![3.0, 0.0]]).unwrap();
        assert_eq!(m.column_means(), vec![2.0, 0.0]);
        assert_eq!(m.column_variances(), vec![1.0, 0.0]);
    }

    #[test]
    fn nearest_center_prefers_lowest_index_on_tie() {
        let centers = DenseMatrix::from_rows(&[vec![1.0], vec![-1.0]]).unwrap();
        assert_eq!(nearest_center(&[0.0], &centers).0, 0);
        assert_eq!(nearest_center(&[-0.9], &centers).0, 1);
    }
}
