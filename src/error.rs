//src/error.rs

use thiserror::Error;

/// Failures raised by a clustering algorithm's `fit_predict`.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot cluster an empty matrix")]
    EmptyInput,

    #[error("n_samples={n_samples} should be >= n_clusters={n_clusters}")]
    TooFewSamples { n_samples: usize, n_clusters: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("numerical breakdown: {0}")]
    Numerical(String),
}

/// Precondition failures of the metric functions.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("metric requires at least one sample")]
    EmptyInput,

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("number of labels is {n_labels}; valid values are 2 to n_samples - 1 ({n_samples} samples)")]
    InvalidLabelCount { n_labels: usize, n_samples: usize },
}

/// Top-level error for the experiment pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("dimensionality reduction failed: {0}")]
    Decomposition(String),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Metric(#[from] MetricError),
}
