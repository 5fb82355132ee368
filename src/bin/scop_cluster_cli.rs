// src/bin/scop_cluster_cli.rs
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use scop_cluster::config::{PipelineConfig, K_MER_SIZE, N_COMPONENTS, RANDOM_STATE, SKIP};
use scop_cluster::{run_experiment, ExperimentOutcome};

/// Cluster SCOPe protein domains by skip-gram k-mer composition and pick the
/// internal metric that best tracks the ground-truth classes.
#[derive(Parser, Debug)]
#[command(name = "scop-cluster", version, about)]
struct Args {
    /// SCOPe FASTA files (plain or .gz)
    #[arg(value_name = "FASTA", required = true)]
    files: Vec<PathBuf>,

    /// Length of the sampled motif
    #[arg(long, env = "SCOP_CLUSTER_KMER_SIZE", default_value_t = K_MER_SIZE)]
    kmer_size: usize,

    /// Gap between the sampled residues
    #[arg(long, env = "SCOP_CLUSTER_SKIP", default_value_t = SKIP)]
    skip: usize,

    /// Principal components kept after scaling
    #[arg(long, env = "SCOP_CLUSTER_COMPONENTS", default_value_t = N_COMPONENTS)]
    components: usize,

    /// Seed for every randomised algorithm
    #[arg(long, env = "SCOP_CLUSTER_SEED", default_value_t = RANDOM_STATE)]
    seed: u64,

    #[arg(long, env = "SCOP_CLUSTER_DBSCAN_EPS", default_value_t = 5.0)]
    dbscan_eps: f64,

    #[arg(long, env = "SCOP_CLUSTER_DBSCAN_MIN_SAMPLES", default_value_t = 25)]
    dbscan_min_samples: usize,

    /// K is searched over max(2, C - radius) ..= C + radius
    #[arg(long, env = "SCOP_CLUSTER_TUNING_RADIUS", default_value_t = 5)]
    tuning_radius: usize,

    #[arg(long, env = "SCOP_CLUSTER_BIRCH_THRESHOLD", default_value_t = 0.5)]
    birch_threshold: f64,

    #[arg(long, env = "SCOP_CLUSTER_BIRCH_BRANCHING_FACTOR", default_value_t = 50)]
    birch_branching_factor: usize,

    /// Mini-batch size for MiniBatchKMeans
    #[arg(long, env = "SCOP_CLUSTER_BATCH_SIZE", default_value_t = 1024)]
    batch_size: usize,

    /// Maximum Lloyd iterations for KMeans
    #[arg(long, env = "SCOP_CLUSTER_MAX_ITER", default_value_t = 300)]
    max_iter: usize,

    /// Also run ward agglomerative clustering
    #[arg(long, env = "SCOP_CLUSTER_EXTENDED_ROSTER")]
    extended_roster: bool,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            kmer_size: self.kmer_size,
            skip: self.skip,
            n_components: self.components,
            random_state: self.seed,
            dbscan_eps: self.dbscan_eps,
            dbscan_min_samples: self.dbscan_min_samples,
            tuning_radius: self.tuning_radius,
            birch_threshold: self.birch_threshold,
            birch_branching_factor: self.birch_branching_factor,
            minibatch_size: self.batch_size,
            kmeans_max_iter: self.max_iter,
            extended_roster: self.extended_roster,
            ..Default::default()
        }
    }
}

fn spinner(color: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{color}}} {{msg}}");
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.pipeline_config();
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let mut completed = 0usize;
    for path in &args.files {
        // 1. Run every stage for this file
        let spinner = spinner("green");
        spinner.set_message(format!("Analysing {}...", path.display()));

        let outcome = match run_experiment(path, &config) {
            Ok(outcome) => outcome,
            Err(e) => {
                spinner.finish_with_message(format!("Failed: {}", path.display()));
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        };

        match &outcome {
            ExperimentOutcome::Completed(_) => {
                completed += 1;
                spinner.finish_with_message(format!("Finished {}.", outcome.file_name()));
            }
            ExperimentOutcome::Skipped { .. } => {
                spinner.finish_with_message(format!("Skipped {}.", outcome.file_name()));
            }
        }

        // 2. Report
        println!("{}", outcome.render());
    }

    let spinner = spinner("cyan");
    spinner.finish_with_message(format!(
        "All done! {completed} of {} file(s) analysed.",
        args.files.len()
    ));
    ExitCode::SUCCESS
}
