// src/clustering/agglomerative.rs

use rayon::prelude::*;

use super::{check_input, ClusteringAlgorithm};
use crate::error::ClusterError;
use crate::matrix::{squared_euclidean, DenseMatrix};

/// Ward-linkage agglomerative clustering, cut at `n_clusters`.
#[derive(Debug, Clone)]
pub struct Agglomerative {
    pub n_clusters: usize,
}

impl Agglomerative {
    pub fn new(n_clusters: usize) -> Self {
        Self { n_clusters }
    }
}

impl ClusteringAlgorithm for Agglomerative {
    fn fit_predict(&self, x: &DenseMatrix) -> Result<Vec<i32>, ClusterError> {
        check_input(x, self.n_clusters)?;
        Ok(ward_labels(x, self.n_clusters)
            .into_iter()
            .map(|c| c as i32)
            .collect())
    }
}

/// Ward merge cost of two clusters (increase in within-cluster sum of squares).
#[inline]
fn ward_cost(ca: &[f64], na: usize, cb: &[f64], nb: usize) -> f64 {
    let (na, nb) = (na as f64, nb as f64);
    na * nb / (na + nb) * squared_euclidean(ca, cb)
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Ward dendrogram of the rows of `points` built with the nearest-neighbour
/// chain algorithm, cut so that `n_clusters` clusters remain.
///
/// Labels are dense, numbered by first appearance. When `n_clusters` is at
/// least the number of rows every row is its own cluster.
pub fn ward_labels(points: &DenseMatrix, n_clusters: usize) -> Vec<usize> {
    let m = points.n_rows();
    if n_clusters >= m {
        return (0..m).collect();
    }

    let mut centroids: Vec<Vec<f64>> = points.rows().map(|r| r.to_vec()).collect();
    let mut sizes = vec![1usize; m];
    let mut active = vec![true; m];
    let mut merges: Vec<(usize, usize, f64)> = Vec::with_capacity(m.saturating_sub(1));
    let mut chain: Vec<usize> = Vec::new();
    let mut remaining = m;

    while remaining > 1 {
        if chain.is_empty() {
            let Some(start) = active.iter().position(|&a| a) else { break };
            chain.push(start);
        }
        let a = chain[chain.len() - 1];
        let prev = if chain.len() >= 2 { Some(chain[chain.len() - 2]) } else { None };

        let nearest = (0..m)
            .into_par_iter()
            .filter(|&b| b != a && active[b])
            .map(|b| (b, ward_cost(&centroids[a], sizes[a], &centroids[b], sizes[b])))
            .min_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));
        let Some((mut b, mut cost)) = nearest else { break };

        // Prefer the previous chain element on ties so the chain terminates.
        if let Some(p) = prev {
            let prev_cost = ward_cost(&centroids[a], sizes[a], &centroids[p], sizes[p]);
            if prev_cost <= cost {
                b = p;
                cost = prev_cost;
            }
        }

        if Some(b) == prev {
            chain.pop();
            chain.pop();
            let (keep, gone) = if a < b { (a, b) } else { (b, a) };
            let (nk, ng) = (sizes[keep] as f64, sizes[gone] as f64);
            let merged: Vec<f64> = centroids[keep]
                .iter()
                .zip(&centroids[gone])
                .map(|(&u, &v)| (nk * u + ng * v) / (nk + ng))
                .collect();
            centroids[keep] = merged;
            sizes[keep] += sizes[gone];
            active[gone] = false;
            merges.push((keep, gone, cost));
            remaining -= 1;
        } else {
            chain.push(b);
        }
    }

    // Replay the cheapest merges in height order.
    merges.sort_by(|x, y| x.2.total_cmp(&y.2));
    let mut uf = UnionFind::new(m);
    for &(keep, gone, _) in merges.iter().take(m - n_clusters) {
        uf.union(keep, gone);
    }

    let mut root_label: Vec<Option<usize>> = vec![None; m];
    let mut next = 0;
    (0..m)
        .map(|i| {
            let root = uf.find(i);
            *root_label[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}
