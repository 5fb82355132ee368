// src/preprocess/scaler.rs

use crate::matrix::DenseMatrix;

/// Mean/variance normalisation per column.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &DenseMatrix) -> Self {
        let mean = x.column_means();
        // Zero-variance columns keep unit scale so they are only centred.
        let scale = x
            .column_variances()
            .into_iter()
            .map(|v| {
                let sd = v.sqrt();
                if sd > f64::EPSILON { sd } else { 1.0 }
            })
            .collect();
        Self { mean, scale }
    }

    pub fn transform(&self, x: &DenseMatrix) -> DenseMatrix {
        let mut out = x.clone();
        for i in 0..out.n_rows() {
            for ((v, &m), &s) in out.row_mut(i).iter_mut().zip(&self.mean).zip(&self.scale) {
                *v = (*v - m) / s;
            }
        }
        out
    }

    pub fn fit_transform(x: &DenseMatrix) -> DenseMatrix {
        Self::fit(x).transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_columns_have_zero_mean_unit_variance() {
        let x = DenseMatrix::from_rows(&[vec![0.0, 5.0], vec![1.0, 5.0], vec![1.0, 5.0], vec![0.0, 5.0]])
            .unwrap();
        let scaled = StandardScaler::fit_transform(&x);

        let means = scaled.column_means();
        let vars = scaled.column_variances();
        assert!(means[0].abs() < 1e-12);
        assert!((vars[0] - 1.0).abs() < 1e-12);
        // constant column is centred, not divided by zero
        assert!(scaled.as_slice().iter().all(|v| v.is_finite()));
        assert_eq!(scaled.get(0, 1), 0.0);
    }
}
