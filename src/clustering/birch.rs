// src/clustering/birch.rs

use rayon::prelude::*;

use super::agglomerative::ward_labels;
use super::{check_finite, ClusteringAlgorithm};
use crate::config::PipelineConfig;
use crate::error::ClusterError;
use crate::matrix::{nearest_center, squared_euclidean, DenseMatrix};

/// BIRCH: a CF-tree summarises the rows into subclusters of bounded radius,
/// then ward agglomeration groups the leaf subclusters into `n_clusters`.
#[derive(Debug, Clone)]
pub struct Birch {
    pub n_clusters: usize,
    pub threshold: f64,
    pub branching_factor: usize,
}

/// Clustering feature: count, linear sum and squared norm sum of its rows.
#[derive(Debug, Clone)]
struct Subcluster {
    n: usize,
    linear_sum: Vec<f64>,
    squared_sum: f64,
    centroid: Vec<f64>,
    child: Option<Box<CfNode>>,
}

#[derive(Debug, Clone, Default)]
struct CfNode {
    entries: Vec<Subcluster>,
}

impl Subcluster {
    fn from_row(row: &[f64]) -> Self {
        Self {
            n: 1,
            linear_sum: row.to_vec(),
            squared_sum: row.iter().map(|v| v * v).sum(),
            centroid: row.to_vec(),
            child: None,
        }
    }

    /// Summary of every entry of `node`, owning it as its child.
    fn from_node(node: CfNode) -> Self {
        let d = node.entries.first().map(|e| e.linear_sum.len()).unwrap_or(0);
        let mut sub = Self {
            n: 0,
            linear_sum: vec![0.0; d],
            squared_sum: 0.0,
            centroid: vec![0.0; d],
            child: None,
        };
        for e in &node.entries {
            sub.absorb(e);
        }
        sub.child = Some(Box::new(node));
        sub
    }

    fn absorb(&mut self, other: &Subcluster) {
        self.n += other.n;
        for (a, &b) in self.linear_sum.iter_mut().zip(&other.linear_sum) {
            *a += b;
        }
        self.squared_sum += other.squared_sum;
        let n = self.n as f64;
        for (c, &s) in self.centroid.iter_mut().zip(&self.linear_sum) {
            *c = s / n;
        }
    }

    /// Merge `other` if the combined radius stays within `threshold`.
    fn try_merge(&mut self, other: &Subcluster, threshold: f64) -> bool {
        let n = (self.n + other.n) as f64;
        let ss = self.squared_sum + other.squared_sum;
        let centroid_sq: f64 = self
            .linear_sum
            .iter()
            .zip(&other.linear_sum)
            .map(|(&a, &b)| {
                let c = (a + b) / n;
                c * c
            })
            .sum();
        let sq_radius = ss / n - centroid_sq;
        if sq_radius <= threshold * threshold {
            self.absorb(other);
            true
        } else {
            false
        }
    }
}

impl CfNode {
    fn closest(&self, centroid: &[f64]) -> usize {
        let mut best = (0, f64::INFINITY);
        for (i, e) in self.entries.iter().enumerate() {
            let d = squared_euclidean(&e.centroid, centroid);
            if d < best.1 {
                best = (i, d);
            }
        }
        best.0
    }

    /// Insert a single-row subcluster; returns `true` when this node overflowed.
    fn insert(&mut self, entry: Subcluster, threshold: f64, branching_factor: usize) -> bool {
        if self.entries.is_empty() {
            self.entries.push(entry);
            return false;
        }
        let idx = self.closest(&entry.centroid);

        if let Some(child) = self.entries[idx].child.as_mut() {
            let child_overflow = child.insert(entry.clone(), threshold, branching_factor);
            if !child_overflow {
                let target = &mut self.entries[idx];
                target.n += entry.n;
                for (a, &b) in target.linear_sum.iter_mut().zip(&entry.linear_sum) {
                    *a += b;
                }
                target.squared_sum += entry.squared_sum;
                let n = target.n as f64;
                for (c, &s) in target.centroid.iter_mut().zip(&target.linear_sum) {
                    *c = s / n;
                }
                return false;
            }
            // Replace the overflowing child with two halves.
            let full = self.entries.swap_remove(idx);
            let node = full.child.map(|b| *b).unwrap_or_default();
            let (left, right) = split_node(node);
            self.entries.push(Subcluster::from_node(left));
            self.entries.push(Subcluster::from_node(right));
            return self.entries.len() > branching_factor;
        }

        if self.entries[idx].try_merge(&entry, threshold) {
            return false;
        }
        self.entries.push(entry);
        self.entries.len() > branching_factor
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Subcluster>) {
        for e in &self.entries {
            match &e.child {
                Some(child) => child.collect_leaves(out),
                None => out.push(e),
            }
        }
    }
}

/// Split a node around its two farthest-apart entries.
fn split_node(node: CfNode) -> (CfNode, CfNode) {
    let entries = node.entries;
    let mut far = (0, 1.min(entries.len().saturating_sub(1)), -1.0);
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let d = squared_euclidean(&entries[i].centroid, &entries[j].centroid);
            if d > far.2 {
                far = (i, j, d);
            }
        }
    }
    let (p, q, _) = far;
    let (cp, cq) = (entries[p].centroid.clone(), entries[q].centroid.clone());

    let mut left = CfNode::default();
    let mut right = CfNode::default();
    for (i, e) in entries.into_iter().enumerate() {
        let go_left = if i == p {
            true
        } else if i == q {
            false
        } else {
            squared_euclidean(&e.centroid, &cp) <= squared_euclidean(&e.centroid, &cq)
        };
        if go_left {
            left.entries.push(e);
        } else {
            right.entries.push(e);
        }
    }
    (left, right)
}

impl Birch {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            threshold: 0.5,
            branching_factor: 50,
        }
    }

    pub fn from_config(n_clusters: usize, config: &PipelineConfig) -> Self {
        Self {
            n_clusters,
            threshold: config.birch_threshold,
            branching_factor: config.birch_branching_factor,
        }
    }

    /// Build the CF-tree and return the leaf subcluster centroids.
    pub fn subcluster_centers(&self, x: &DenseMatrix) -> Result<DenseMatrix, ClusterError> {
        if x.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        check_finite(x)?;
        if !(self.threshold > 0.0) {
            return Err(ClusterError::InvalidParameter("threshold must be positive".to_string()));
        }
        if self.branching_factor < 2 {
            return Err(ClusterError::InvalidParameter(
                "branching_factor must be at least 2".to_string(),
            ));
        }

        let mut root = CfNode::default();
        for row in x.rows() {
            let overflow = root.insert(Subcluster::from_row(row), self.threshold, self.branching_factor);
            if overflow {
                let (left, right) = split_node(std::mem::take(&mut root));
                root.entries.push(Subcluster::from_node(left));
                root.entries.push(Subcluster::from_node(right));
            }
        }

        let mut leaves = Vec::new();
        root.collect_leaves(&mut leaves);
        let mut data = Vec::with_capacity(leaves.len() * x.n_cols());
        for leaf in &leaves {
            data.extend_from_slice(&leaf.centroid);
        }
        DenseMatrix::from_vec(leaves.len(), x.n_cols(), data)
            .map_err(|e| ClusterError::Numerical(e.to_string()))
    }
}

impl ClusteringAlgorithm for Birch {
    fn fit_predict(&self, x: &DenseMatrix) -> Result<Vec<i32>, ClusterError> {
        if self.n_clusters == 0 {
            return Err(ClusterError::InvalidParameter("n_clusters must be at least 1".to_string()));
        }
        let centers = self.subcluster_centers(x)?;
        if centers.n_rows() < self.n_clusters {
            log::warn!(
                "Birch found {} subclusters, fewer than the requested {}",
                centers.n_rows(),
                self.n_clusters
            );
        }
        log::debug!("Birch built {} leaf subclusters", centers.n_rows());

        let subcluster_labels = ward_labels(&centers, self.n_clusters);
        Ok((0..x.n_rows())
            .into_par_iter()
            .map(|i| subcluster_labels[nearest_center(x.row(i), &centers).0] as i32)
            .collect())
    }
}
