//src/report.rs

use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::correlation::CorrelationMatrix;
use crate::types::{EvaluationResult, MetricKind};

fn markdown_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled);
    table
}

fn number(value: f64) -> Cell {
    let text = if value.is_nan() { "NaN".to_string() } else { format!("{value:.4}") };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// One row per run: name, cluster count, the three metrics and fit time.
pub fn results_table(results: &[EvaluationResult]) -> String {
    let mut table = markdown_table();
    table.set_header(vec![
        "Algorithm",
        "Clusters",
        MetricKind::Silhouette.name(),
        MetricKind::DaviesBouldin.name(),
        MetricKind::VMeasure.name(),
        "Time (s)",
    ]);
    for r in results {
        table.add_row(vec![
            Cell::new(&r.algorithm_name),
            Cell::new(r.cluster_count).set_alignment(CellAlignment::Right),
            number(r.silhouette),
            number(r.davies_bouldin),
            number(r.v_measure),
            number(r.elapsed_seconds),
        ]);
    }
    table.to_string()
}

/// Full 3x3 metric correlation matrix.
pub fn correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut table = markdown_table();
    let mut header = vec![Cell::new("")];
    header.extend(MetricKind::ALL.iter().map(|m| Cell::new(m.name())));
    table.set_header(header);

    for a in MetricKind::ALL {
        let mut row = vec![Cell::new(a.name())];
        row.extend(MetricKind::ALL.iter().map(|&b| number(matrix.get(a, b))));
        table.add_row(row);
    }
    table.to_string()
}

/// Correlation of each internal metric with the external one.
pub fn external_correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut table = markdown_table();
    table.set_header(vec!["", MetricKind::VMeasure.name()]);
    for (metric, value) in matrix.with_external() {
        table.add_row(vec![Cell::new(metric.name()), number(value)]);
    }
    table.to_string()
}

/// A single run shown as field/value pairs.
pub fn result_detail_table(result: &EvaluationResult) -> String {
    let mut table = markdown_table();
    table.set_header(vec!["", "value"]);
    table.add_row(vec![Cell::new("Algorithm"), Cell::new(&result.algorithm_name)]);
    table.add_row(vec![
        Cell::new("Clusters"),
        Cell::new(result.cluster_count).set_alignment(CellAlignment::Right),
    ]);
    for metric in MetricKind::ALL {
        table.add_row(vec![Cell::new(metric.name()), number(result.metric(metric))]);
    }
    table.add_row(vec![Cell::new("Time (s)"), number(result.elapsed_seconds)]);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EvaluationResult {
        EvaluationResult::scored("KMeans (K=3)", 3, 0.123456, 1.5, 0.25, 0.01)
    }

    #[test]
    fn results_table_lists_every_run() {
        let text = results_table(&[sample(), EvaluationResult::failed("DBSCAN (Base)", 0.0)]);
        assert!(text.contains("KMeans (K=3)"));
        assert!(text.contains("DBSCAN (Base)"));
        assert!(text.contains("0.1235"));
        assert!(text.contains("-2.0000"));
        assert!(text.contains("9999.0000"));
    }

    #[test]
    fn correlation_tables_show_nan() {
        let matrix = CorrelationMatrix::from_results(&[sample()]);
        assert!(correlation_table(&matrix).contains("NaN"));
        let external = external_correlation_table(&matrix);
        assert!(external.contains("Silhouette"));
        assert!(external.contains("Davies-Bouldin"));
    }

    #[test]
    fn detail_table_has_all_fields() {
        let text = result_detail_table(&sample());
        for field in ["Algorithm", "Clusters", "Silhouette", "Davies-Bouldin", "V-Measure", "Time (s)"] {
            assert!(text.contains(field), "missing {field}");
        }
    }
}
