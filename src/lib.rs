// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod matrix;
pub mod fasta;
pub mod kmer;
pub mod preprocess;
pub mod clustering;
pub mod metrics;
pub mod evaluate;
pub mod correlation;
pub mod tuning;
pub mod report;

use std::fmt::Write as FmtWrite;
use std::path::Path;

use crate::clustering::baseline_roster;
use crate::config::PipelineConfig;
use crate::correlation::{select_compass, valid_results, Compass, CorrelationMatrix};
use crate::error::PipelineError;
use crate::evaluate::evaluate_clustering;
use crate::fasta::load_dataset;
use crate::kmer::KmerFeatureEncoder;
use crate::matrix::DenseMatrix;
use crate::preprocess::{LabelEncoder, Pca, StandardScaler};
use crate::tuning::{rank_by_metric, tune_kmeans, TuningOutcome};
use crate::types::{EvaluationResult, MetricKind, SequenceRecord};

const BANNER_WIDTH: usize = 80;

/// Why a file was not clustered.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Missing, unreadable, or no header carried a classification code.
    NoRecords,
    /// Clustering needs at least two ground-truth classes.
    SingleClass { n_sequences: usize, classes: Vec<char> },
}

/// Everything one completed experiment measured, kept as structured data;
/// text is generated on demand by [`ExperimentReport::render`].
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub file_name: String,
    pub n_sequences: usize,
    /// Coarse classes in order of first appearance.
    pub classes: Vec<char>,
    pub n_features: usize,
    pub feature_shape: (usize, usize),
    pub reduced_shape: (usize, usize),
    pub explained_variance: f64,
    /// Roster names in the order the algorithms ran.
    pub run_order: Vec<String>,
    /// Baseline runs, best V-measure first.
    pub baseline: Vec<EvaluationResult>,
    /// `None` when no run produced two or more clusters.
    pub correlation: Option<CorrelationMatrix>,
    pub compass: Option<Compass>,
    pub tuning: Option<TuningOutcome>,
}

#[derive(Debug, Clone)]
pub enum ExperimentOutcome {
    Skipped { file_name: String, reason: SkipReason },
    Completed(Box<ExperimentReport>),
}

fn banner(out: &mut String, title: &str) {
    let rule = "=".repeat(BANNER_WIDTH);
    writeln!(out, "\n{rule}\n{title}\n{rule}\n").unwrap();
}

fn join_classes(classes: &[char]) -> String {
    classes.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
}

impl ExperimentOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            ExperimentOutcome::Skipped { file_name, .. } => file_name,
            ExperimentOutcome::Completed(report) => &report.file_name,
        }
    }

    /// Generate the human-readable report text.
    pub fn render(&self) -> String {
        match self {
            ExperimentOutcome::Completed(report) => report.render(),
            ExperimentOutcome::Skipped { file_name, reason } => {
                let mut out = String::new();
                banner(&mut out, &format!("STARTING ANALYSIS FOR FILE: {file_name}"));
                out.push_str("--- STAGE A: DATA LOADING ---\n");
                match reason {
                    SkipReason::NoRecords => {
                        out.push_str("-> No annotated sequences loaded. Skipping file.\n");
                    }
                    SkipReason::SingleClass { n_sequences, classes } => {
                        writeln!(out, "-> Data loaded: {n_sequences} sequences.").unwrap();
                        writeln!(
                            out,
                            "\nWARNING: found only {} class ({}). Skipping clustering.",
                            classes.len(),
                            join_classes(classes)
                        )
                        .unwrap();
                    }
                }
                out
            }
        }
    }
}

impl ExperimentReport {
    /// Generate the report text, stage by stage.
    pub fn render(&self) -> String {
        let mut out = String::new();
        banner(&mut out, &format!("STARTING ANALYSIS FOR FILE: {}", self.file_name));

        out.push_str("--- STAGE A: DATA LOADING ---\n");
        writeln!(out, "-> Data loaded: {} sequences.", self.n_sequences).unwrap();
        writeln!(
            out,
            "-> SCOPe classes (ground truth): {} classes ({}).",
            self.classes.len(),
            join_classes(&self.classes)
        )
        .unwrap();

        out.push_str("\n--- STAGE B: FEATURE EXTRACTION (BINARY K-MER) ---\n");
        writeln!(out, "  -> Total of {} attributes (k-mers) generated.", self.n_features).unwrap();
        writeln!(out, "-> Binary matrix: {:?}", self.feature_shape).unwrap();

        out.push_str("\n--- STAGE C: DIMENSIONALITY REDUCTION (PCA) ---\n");
        writeln!(out, "-> PCA finished. Feature matrix X: {:?}", self.reduced_shape).unwrap();
        writeln!(
            out,
            "-> Explained variance with {} components: {:.2}%",
            self.reduced_shape.1,
            self.explained_variance * 100.0
        )
        .unwrap();
        out.push_str("-> Intermediate matrices released.\n");

        out.push_str("\n--- STAGE D: ALGORITHM BASELINE ---\n");
        for name in &self.run_order {
            writeln!(out, "  -> Ran: {name}").unwrap();
        }
        out.push_str("\n--- BASELINE EVALUATION RESULTS ---\n");
        out.push_str(&report::results_table(&self.baseline));
        out.push('\n');

        banner(&mut out, "STAGE F: METRIC CORRELATION (THE NON-SUBJECTIVE CHOICE)");
        let Some(matrix) = &self.correlation else {
            out.push_str("No algorithm produced valid clusters. Cannot correlate.\n");
            return out;
        };
        out.push_str("--- Correlation Matrix (Internal vs External) ---\n");
        out.push_str(&report::correlation_table(matrix));
        out.push_str("\n\n--- Correlation with the External Metric (V-Measure) ---\n");
        out.push_str(&report::external_correlation_table(matrix));
        out.push('\n');

        let Some(compass) = &self.compass else {
            out.push_str(
                "\nNo internal metric has a defined correlation with V-Measure. Skipping tuning.\n",
            );
            return out;
        };
        out.push_str("\n--- METHODOLOGY CONCLUSION ---\n");
        writeln!(out, "The most reliable internal (unsupervised) metric is: {}", compass.metric).unwrap();
        writeln!(
            out,
            "Rationale: it has the largest absolute correlation ({:.4}) with the external metric (V-Measure).",
            compass.correlation
        )
        .unwrap();
        writeln!(
            out,
            "From here on, '{}' is the compass used to optimise parameters.",
            compass.metric
        )
        .unwrap();

        out.push_str("\n--- STAGE G: OPTIMISATION (K-Means) USING THE VALIDATED METRIC ---\n");
        let Some(tuning) = &self.tuning else {
            return out;
        };
        writeln!(
            out,
            "  -> Tuning K-Means with K from {} to {}...",
            tuning.k_range.start(),
            tuning.k_range.end()
        )
        .unwrap();
        writeln!(out, "  -> Goal: find the K with the best '{}' score", compass.metric).unwrap();

        match &tuning.best {
            Some(best) => {
                writeln!(out, "\n--- BEST CONFIGURATION FOUND (by {}) ---", compass.metric).unwrap();
                out.push_str(&report::result_detail_table(best));
                writeln!(
                    out,
                    "\n\nSuggestion: the best K was {}, reaching a score of {:.4} (using {}).",
                    best.cluster_count,
                    best.metric(compass.metric),
                    compass.metric
                )
                .unwrap();
            }
            None => out.push_str("  -> No K-Means tuning results to show.\n"),
        }
        out
    }
}

/// Scaled and PCA-reduced features; the binary and scaled matrices are
/// dropped when this returns.
struct ReducedFeatures {
    x: DenseMatrix,
    n_features: usize,
    feature_shape: (usize, usize),
    explained_variance: f64,
}

fn reduce_features(records: &[SequenceRecord], config: &PipelineConfig) -> Result<ReducedFeatures, PipelineError> {
    let encoder = KmerFeatureEncoder::new(config.kmer_size, config.skip)?;
    let sequences: Vec<&str> = records.iter().map(|r| r.sequence.as_str()).collect();
    let table = encoder.encode(&sequences);
    let feature_shape = table.shape();
    log::info!("Binary matrix generated: {:?}", feature_shape);

    let scaled = StandardScaler::fit_transform(&table.matrix);
    let projection = Pca::new(config.n_components).fit_transform(&scaled)?;
    let explained_variance = projection.total_explained_variance();
    log::info!(
        "PCA finished: {:?}, explained variance {:.2}%",
        projection.transformed.shape(),
        explained_variance * 100.0
    );

    Ok(ReducedFeatures {
        x: projection.transformed,
        n_features: table.columns.len(),
        feature_shape,
        explained_variance,
    })
}

/// Run the full experiment on already parsed records.
pub fn run_on_records(
    file_name: &str,
    records: &[SequenceRecord],
    config: &PipelineConfig,
) -> Result<ExperimentOutcome, PipelineError> {
    config.validate()?;

    // 1. Ground truth
    if records.is_empty() {
        return Ok(ExperimentOutcome::Skipped {
            file_name: file_name.to_string(),
            reason: SkipReason::NoRecords,
        });
    }
    let mut classes: Vec<char> = Vec::new();
    for r in records {
        if !classes.contains(&r.coarse_class) {
            classes.push(r.coarse_class);
        }
    }
    log::info!(
        "Loaded {} sequences in {} classes ({})",
        records.len(),
        classes.len(),
        join_classes(&classes)
    );
    if classes.len() < 2 {
        log::warn!("Only {} class in {}; skipping clustering", classes.len(), file_name);
        return Ok(ExperimentOutcome::Skipped {
            file_name: file_name.to_string(),
            reason: SkipReason::SingleClass {
                n_sequences: records.len(),
                classes,
            },
        });
    }
    let coarse: Vec<char> = records.iter().map(|r| r.coarse_class).collect();
    let (_, labels_true) = LabelEncoder::fit_transform(&coarse);
    let n_classes = classes.len();

    // 2. Features
    let reduced = reduce_features(records, config)?;
    log::debug!("Intermediate matrices released");
    let x = &reduced.x;

    // 3. Baseline roster
    let mut baseline: Vec<EvaluationResult> = baseline_roster(n_classes, config)
        .iter()
        .map(|entry| {
            log::info!("Running: {}...", entry.name);
            evaluate_clustering(&entry.algorithm, x, &labels_true, &entry.name)
        })
        .collect();
    let run_order: Vec<String> = baseline.iter().map(|r| r.algorithm_name.clone()).collect();
    rank_by_metric(&mut baseline, MetricKind::VMeasure);

    // 4. Correlation and compass
    let valid = valid_results(&baseline);
    let (correlation, compass) = if valid.is_empty() {
        log::warn!("No algorithm produced valid clusters; cannot correlate");
        (None, None)
    } else {
        let matrix = CorrelationMatrix::from_results(&valid);
        let compass = select_compass(&matrix);
        match &compass {
            Some(c) => log::info!("Compass metric: {} (r = {:.4})", c.metric, c.correlation),
            None => log::warn!("Correlations with V-Measure are undefined; skipping tuning"),
        }
        (Some(matrix), compass)
    };

    // 5. Tuning
    let tuning = compass.map(|c| tune_kmeans(x, &labels_true, n_classes, c, config));

    Ok(ExperimentOutcome::Completed(Box::new(ExperimentReport {
        file_name: file_name.to_string(),
        n_sequences: records.len(),
        classes,
        n_features: reduced.n_features,
        feature_shape: reduced.feature_shape,
        reduced_shape: x.shape(),
        explained_variance: reduced.explained_variance,
        run_order,
        baseline,
        correlation,
        compass,
        tuning,
    })))
}

/// Parse one FASTA file and run the experiment on it. Read failures are
/// reported and yield a skipped outcome rather than an error.
pub fn run_experiment<P: AsRef<Path>>(
    path: P,
    config: &PipelineConfig,
) -> Result<ExperimentOutcome, PipelineError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let records = load_dataset(path);
    run_on_records(&file_name, &records, config)
}
