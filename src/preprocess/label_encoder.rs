// src/preprocess/label_encoder.rs

use std::hash::Hash;

use ahash::AHashMap;

/// Maps arbitrary labels to dense integers `0..n_classes` in sorted label order.
#[derive(Debug, Clone)]
pub struct LabelEncoder<T> {
    classes: Vec<T>,
    lookup: AHashMap<T, usize>,
}

impl<T: Ord + Hash + Clone> LabelEncoder<T> {
    pub fn fit(labels: &[T]) -> Self {
        let mut classes: Vec<T> = labels.to_vec();
        classes.sort();
        classes.dedup();
        let lookup = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, lookup }
    }

    /// Sorted distinct labels; position == encoded value.
    pub fn classes(&self) -> &[T] {
        &self.classes
    }

    pub fn encode(&self, label: &T) -> Option<usize> {
        self.lookup.get(label).copied()
    }

    /// Encode labels seen during `fit`; unseen labels are skipped.
    pub fn transform(&self, labels: &[T]) -> Vec<usize> {
        labels.iter().filter_map(|l| self.encode(l)).collect()
    }

    pub fn fit_transform(labels: &[T]) -> (Self, Vec<usize>) {
        let encoder = Self::fit(labels);
        let encoded = encoder.transform(labels);
        (encoder, encoded)
    }
}
