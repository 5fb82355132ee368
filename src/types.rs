//src/types.rs

use std::fmt;

/// One annotated protein domain parsed from the FASTA database.
/// For example, the header `>d1abc a.1.1.1 ...` yields
///  full_label = "a.1.1.1", coarse_class = 'a'
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub full_label: String,   // dotted SCOPe sccs code
    pub coarse_class: char,   // first segment of `full_label`
    pub sequence: String,     // upper-cased residues, spaces removed
}

/// The three quality metrics tracked for every clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Silhouette,
    DaviesBouldin,
    VMeasure,
}

impl MetricKind {
    /// Column order used by the correlation stage.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Silhouette,
        MetricKind::DaviesBouldin,
        MetricKind::VMeasure,
    ];

    /// Label-free metrics that may serve as the tuning compass.
    pub const INTERNAL: [MetricKind; 2] = [MetricKind::Silhouette, MetricKind::DaviesBouldin];

    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Silhouette => "Silhouette",
            MetricKind::DaviesBouldin => "Davies-Bouldin",
            MetricKind::VMeasure => "V-Measure (external)",
        }
    }

    /// Davies-Bouldin is the only one where a smaller value wins.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, MetricKind::DaviesBouldin)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sentinel values for an algorithm that returned an error.
pub const FAILED_SILHOUETTE: f64 = -2.0;
pub const FAILED_DAVIES_BOULDIN: f64 = 9999.0;

/// Sentinel values for a run that produced fewer than two clusters.
pub const DEGENERATE_SILHOUETTE: f64 = -1.0;
pub const DEGENERATE_DAVIES_BOULDIN: f64 = 999.0;

/// A structured representation of one row in the evaluation table.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub algorithm_name: String,
    pub cluster_count: usize,
    pub silhouette: f64,
    pub davies_bouldin: f64,
    pub v_measure: f64,
    pub elapsed_seconds: f64,
    /// `false` for sentinel rows: the metric columns hold placeholders.
    pub metrics_defined: bool,
}

impl EvaluationResult {
    /// Result with all three metrics computed.
    pub fn scored(
        algorithm_name: &str,
        cluster_count: usize,
        silhouette: f64,
        davies_bouldin: f64,
        v_measure: f64,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            algorithm_name: algorithm_name.to_string(),
            cluster_count,
            silhouette,
            davies_bouldin,
            v_measure,
            elapsed_seconds,
            metrics_defined: true,
        }
    }

    /// Result recorded when `fit_predict` itself errored.
    pub fn failed(algorithm_name: &str, elapsed_seconds: f64) -> Self {
        Self {
            algorithm_name: algorithm_name.to_string(),
            cluster_count: 0,
            silhouette: FAILED_SILHOUETTE,
            davies_bouldin: FAILED_DAVIES_BOULDIN,
            v_measure: 0.0,
            elapsed_seconds,
            metrics_defined: false,
        }
    }

    /// Result recorded when the metrics are not computable (fewer than two
    /// clusters, or a partition the metrics reject).
    pub fn degenerate(algorithm_name: &str, cluster_count: usize, elapsed_seconds: f64) -> Self {
        Self {
            algorithm_name: algorithm_name.to_string(),
            cluster_count,
            silhouette: DEGENERATE_SILHOUETTE,
            davies_bouldin: DEGENERATE_DAVIES_BOULDIN,
            v_measure: 0.0,
            elapsed_seconds,
            metrics_defined: false,
        }
    }

    pub fn metric(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Silhouette => self.silhouette,
            MetricKind::DaviesBouldin => self.davies_bouldin,
            MetricKind::VMeasure => self.v_measure,
        }
    }

    /// `true` when the algorithm errored rather than converging.
    pub fn is_failure(&self) -> bool {
        self.cluster_count == 0 && self.silhouette == FAILED_SILHOUETTE
    }
}
