use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use scop_cluster::config::PipelineConfig;
use scop_cluster::fasta::read_fasta_records;
use scop_cluster::{run_experiment, ExperimentOutcome, SkipReason};

/// Three coarse classes, each built from its own residue motif. Classes `a`
/// and `g` share the `CA` pair, which puts them closer to each other than to `b`.
fn synthetic_fasta(per_class: usize) -> String {
    let motifs = [('a', "ACDACD"), ('b', "KLMKLM"), ('g', "ACEACE")];
    let mut text = String::new();
    for i in 0..per_class {
        for (class, motif) in motifs {
            text.push_str(&format!(">d{i}{class}xxa_ {class}.1.{}.1 (A:) synthetic\n", i % 3 + 1));
            // split over two lines with mixed case; lengths vary, k-mer content does not
            text.push_str(&format!("{}\n{}\n", motif.to_lowercase(), motif.repeat(3 + i % 3)));
        }
    }
    text
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        n_components: 6,
        // joins a with g (distance ~4.24) but not with b (~5.20)
        dbscan_eps: 4.5,
        dbscan_min_samples: 3,
        tuning_radius: 1,
        ..Default::default()
    }
}

#[test]
fn full_pipeline_on_plain_fasta() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scop_synthetic.fa");
    std::fs::write(&path, synthetic_fasta(10)).unwrap();

    let outcome = run_experiment(&path, &small_config()).unwrap();
    assert_eq!(outcome.file_name(), "scop_synthetic.fa");
    let ExperimentOutcome::Completed(report) = &outcome else {
        panic!("expected a completed experiment, got {outcome:?}");
    };

    assert_eq!(report.n_sequences, 30);
    assert_eq!(report.classes, vec!['a', 'b', 'g']);
    assert_eq!(report.feature_shape, (30, 400));
    assert_eq!(report.reduced_shape, (30, 6));
    assert!(report.explained_variance > 0.0 && report.explained_variance <= 1.0 + 1e-9);

    let names: Vec<&str> = report.baseline.iter().map(|r| r.algorithm_name.as_str()).collect();
    for expected in ["KMeans (K=3)", "MiniBatchKMeans (K=3)", "Birch (K=3)", "DBSCAN (Base)"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    for pair in report.baseline.windows(2) {
        assert!(pair[0].v_measure >= pair[1].v_measure);
    }

    let kmeans = report
        .baseline
        .iter()
        .find(|r| r.algorithm_name == "KMeans (K=3)")
        .unwrap();
    assert_eq!(kmeans.cluster_count, 3);
    assert!((kmeans.v_measure - 1.0).abs() < 1e-9);
    let dbscan = report
        .baseline
        .iter()
        .find(|r| r.algorithm_name == "DBSCAN (Base)")
        .unwrap();
    assert_eq!(dbscan.cluster_count, 2);
    assert!(dbscan.silhouette < kmeans.silhouette);

    assert!(report.correlation.is_some());
    assert!(report.compass.is_some());
    let tuning = report.tuning.as_ref().unwrap();
    assert_eq!(tuning.k_range, 2..=4);
    assert_eq!(tuning.results.len(), 3);
    assert!(tuning.best.is_some());

    let text = outcome.render();
    assert!(text.contains("STARTING ANALYSIS FOR FILE: scop_synthetic.fa"));
    assert!(text.contains("STAGE C"));
    assert!(text.contains("KMeans (K=3)"));
    assert!(text.contains("STAGE G"));
    assert!(text.contains("Suggestion: the best K was"));
}

#[test]
fn gzip_input_matches_plain_input() {
    let dir = TempDir::new().unwrap();
    let plain = dir.path().join("set.fa");
    let gz = dir.path().join("set.fa.gz");
    let text = synthetic_fasta(4);
    std::fs::write(&plain, &text).unwrap();

    let mut encoder = GzEncoder::new(std::fs::File::create(&gz).unwrap(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let from_plain = read_fasta_records(&plain).unwrap();
    let from_gz = read_fasta_records(&gz).unwrap();
    assert_eq!(from_plain.len(), 12);
    assert_eq!(from_plain, from_gz);
    assert_eq!(from_plain[0].sequence, "ACDACDACDACDACDACDACDACD");
}

#[test]
fn single_class_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("only_a.fa");
    std::fs::write(
        &path,
        ">d1aaaa_ a.1.1.1 (A:) x\nACDEF\n>d2aaaa_ a.2.1.1 (A:) y\nGHIKL\n",
    )
    .unwrap();

    let outcome = run_experiment(&path, &small_config()).unwrap();
    match outcome {
        ExperimentOutcome::Skipped { reason: SkipReason::SingleClass { classes, n_sequences }, .. } => {
            assert_eq!(classes, vec!['a']);
            assert_eq!(n_sequences, 2);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn missing_file_is_skipped_not_an_error() {
    let dir = TempDir::new().unwrap();
    let outcome = run_experiment(dir.path().join("absent.fa"), &small_config()).unwrap();
    assert!(matches!(
        outcome,
        ExperimentOutcome::Skipped { reason: SkipReason::NoRecords, .. }
    ));
}

#[test]
fn headers_without_codes_are_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.fa");
    std::fs::write(&path, ">no_code here\nAAAA\n>d1x_ b.3.2.1 (A:)\nCCCC\n").unwrap();
    let records = read_fasta_records(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].full_label, "b.3.2.1");
    assert_eq!(records[0].coarse_class, 'b');
}
