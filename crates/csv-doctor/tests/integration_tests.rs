//! Integration tests for csv-doctor.
//!
//! These tests load the CSV fixtures from disk and exercise ingestion,
//! cleaning sessions, validation, analysis, reporting and export end to end.

use csv_doctor::cleaner::CleaningOp;
use csv_doctor::io::{ExportFormat, LoadOptions, export_table, load_csv_path};
use csv_doctor::types::{AnomalyKind, ChangeKind, FrequencyKey};
use csv_doctor::{
    Analyzer, CleaningSession, ColumnType, DoctorConfig, DoctorError, FillMethod, OutlierMethod,
    ReportGenerator, ReportParams, TextCase, Validator, chart_data, infer_table_types,
    render_markdown,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(filename: &str) -> DataFrame {
    load_csv_path(fixtures_path().join(filename), &LoadOptions::default())
        .expect("Failed to load fixture")
        .table
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

// ============================================================================
// Ingestion Tests
// ============================================================================

#[test]
fn test_load_clean_fixture_metadata() {
    let loaded = load_csv_path(fixtures_path().join("clean.csv"), &LoadOptions::default()).unwrap();
    let meta = &loaded.metadata;

    assert_eq!(meta.file_name, "clean.csv");
    assert_eq!(meta.delimiter, ',');
    assert_eq!((meta.rows, meta.columns), (8, 5));
    assert_eq!(meta.column_names, vec!["id", "name", "age", "score", "city"]);
    assert_eq!(meta.sample.len(), 5);
    assert_eq!(meta.sample[0]["name"], serde_json::json!("Alice"));
    assert!(meta.file_size > 0);
    assert!(meta.structure_issues.is_empty());
}

#[test]
fn test_load_semicolon_fixture() {
    let loaded =
        load_csv_path(fixtures_path().join("semicolon.csv"), &LoadOptions::default()).unwrap();

    assert_eq!(loaded.metadata.delimiter, ';');
    assert_eq!(loaded.table.shape(), (3, 3));
    assert_eq!(
        strings(&loaded.table, "product")[0].as_deref(),
        Some("Widget; large")
    );
}

#[test]
fn test_load_ragged_fixture_fails_before_any_table() {
    let err = load_csv_path(fixtures_path().join("ragged.csv"), &LoadOptions::default()).unwrap_err();

    assert!(err.is_input_error());
    assert!(matches!(
        err,
        DoctorError::InconsistentFieldCount {
            expected: 3,
            found: 2,
            ..
        }
    ));
}

#[test]
fn test_load_blank_lines_fixture_scores_as_complete() {
    let loaded =
        load_csv_path(fixtures_path().join("blank_lines.csv"), &LoadOptions::default()).unwrap();

    assert_eq!(loaded.table.shape(), (4, 3));
    assert_eq!(loaded.metadata.rows, 4);
    assert!(loaded.metadata.structure_issues.is_empty());

    let score = Validator::default().quality_score(&loaded.table).unwrap();
    assert_eq!(score.null_score, 100.0);
    assert_eq!(score.overall, 100.0);
}

#[test]
fn test_load_empty_fixture() {
    let err = load_csv_path(fixtures_path().join("empty.csv"), &LoadOptions::default()).unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_DATASET");
}

// ============================================================================
// Cleaning Session Tests
// ============================================================================

#[test]
fn test_messy_fixture_full_cleaning_plan() {
    let mut session = CleaningSession::new(load("messy.csv"));
    assert_eq!(session.current().height(), 7);

    let plan = vec![
        CleaningOp::RemoveEmptyRows,
        CleaningOp::TrimWhitespace { columns: None },
        CleaningOp::RemoveDuplicates { subset: None },
        CleaningOp::StandardizeColumnNames,
        CleaningOp::NormalizeTextCase {
            case: TextCase::Title,
            columns: Some(vec!["city".to_string()]),
        },
        CleaningOp::FillMissing {
            method: FillMethod::Median,
            columns: Some(vec!["score".to_string()]),
        },
        CleaningOp::RemoveOutliers {
            method: OutlierMethod::Iqr { multiplier: 1.5 },
            columns: Some(vec!["score".to_string()]),
        },
    ];
    session.apply_all(&plan).unwrap();

    let table = session.current();
    assert_eq!(
        table.get_column_names_str(),
        vec!["first_name", "age_years", "score", "city"]
    );
    assert_eq!(
        strings(table, "first_name"),
        vec![
            Some("Alice".to_string()),
            Some("Bob".to_string()),
            Some("Carol".to_string())
        ]
    );
    assert_eq!(
        strings(table, "city"),
        vec![
            Some("London".to_string()),
            Some("Paris".to_string()),
            Some("Paris".to_string())
        ]
    );

    let scores: Vec<f64> = table
        .column("score")
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(scores, vec![88.5, 89.75, 91.0]);

    // The original table is untouched.
    assert_eq!(session.original().height(), 7);
    assert!(session.changes().iter().all(|c| c.kind != ChangeKind::Warning));
}

#[test]
fn test_session_parsed_ops_and_reset() {
    let ops: Vec<CleaningOp> = ["empty_rows", "trim", "dedupe", "fill:constant=unknown@City"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    let mut session = CleaningSession::new(load("messy.csv"));
    session.apply_all(&ops).unwrap();

    assert_eq!(session.current().height(), 5);
    assert_eq!(session.current().column("City").unwrap().null_count(), 0);
    assert!(!session.changes().is_empty());

    session.reset();
    assert!(session.changes().is_empty());
    assert_eq!(session.current().height(), 7);
}

#[test]
fn test_dedupe_twice_is_logged_no_op() {
    let mut session = CleaningSession::new(load("messy.csv"));
    session
        .apply(&CleaningOp::RemoveDuplicates { subset: None })
        .unwrap();
    let entries = session
        .apply(&CleaningOp::RemoveDuplicates { subset: None })
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_no_op());
}

#[test]
fn test_mean_fill_on_text_column_warns_and_continues() {
    let mut session = CleaningSession::new(load("messy.csv"));
    let entries = session
        .apply(&CleaningOp::FillMissing {
            method: FillMethod::Mean,
            columns: Some(vec!["City".to_string(), "Score".to_string()]),
        })
        .unwrap()
        .to_vec();

    assert!(entries.iter().any(|e| e.is_warning() && e.message.contains("City")));
    assert_eq!(session.current().column("Score").unwrap().null_count(), 0);
    assert!(session.current().column("City").unwrap().null_count() > 0);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_clean_fixture_scores_100() {
    let report = Validator::default().validate(&load("clean.csv")).unwrap();

    assert_eq!(report.quality_score.overall, 100.0);
    assert_eq!(report.quality_score.issues_count, 0);
    assert!(report.anomalies.is_empty());
    assert_eq!(report.duplicates.duplicate_count, 0);
}

#[test]
fn test_messy_fixture_scores_below_100() {
    let report = Validator::default().validate(&load("messy.csv")).unwrap();
    let score = report.quality_score;

    assert!(score.overall < 100.0);
    assert!(score.null_score < 100.0);
    assert!(score.duplicate_score < 100.0);
    assert_eq!(report.duplicates.duplicate_count, 1);
    for s in [
        score.overall,
        score.null_score,
        score.duplicate_score,
        score.type_score,
        score.anomaly_score,
    ] {
        assert!((0.0..=100.0).contains(&s));
    }
}

#[test]
fn test_cleaning_improves_quality() {
    let df = load("messy.csv");
    let validator = Validator::default();
    let before = validator.quality_score(&df).unwrap().overall;

    let mut session = CleaningSession::new(df);
    session
        .apply_all(&[
            CleaningOp::RemoveEmptyRows,
            CleaningOp::RemoveDuplicates { subset: None },
        ])
        .unwrap();
    let after = validator.quality_score(session.current()).unwrap().overall;

    assert!(after > before);
}

#[test]
fn test_constant_column_is_flagged() {
    let report = Validator::default().validate(&load("correlated.csv")).unwrap();
    let constant: Vec<_> = report
        .anomalies
        .iter()
        .filter(|a| a.kind == AnomalyKind::ConstantColumn)
        .collect();

    assert_eq!(constant.len(), 1);
    assert_eq!(constant[0].columns, vec!["constant"]);
    assert_eq!(report.quality_score.anomaly_score, 85.0);
}

// ============================================================================
// Analysis Tests
// ============================================================================

#[test]
fn test_correlated_fixture_analysis() {
    let analysis = Analyzer::default().analyze(&load("correlated.csv")).unwrap();

    let pairs: Vec<(&str, &str)> = analysis
        .high_correlations
        .iter()
        .map(|p| (p.first.as_str(), p.second.as_str()))
        .collect();
    assert!(pairs.contains(&("height", "weight")));
    assert!(pairs.contains(&("height", "shoe")));
    assert!(!pairs.iter().any(|(a, b)| *a == "constant" || *b == "constant"));

    let matrix = &analysis.correlation_matrix;
    assert!((matrix.get("height", "height").unwrap() - 1.0).abs() < 1e-12);
    assert!(matrix.get("height", "constant").unwrap().is_nan());
}

#[test]
fn test_clean_fixture_types_and_frequencies() {
    let df = load("clean.csv");
    let types = infer_table_types(&df, &DoctorConfig::default().inference).unwrap();
    let lookup = |name: &str| types.iter().find(|(n, _)| n == name).unwrap().1;

    assert_eq!(lookup("age"), ColumnType::Numeric);
    assert_eq!(lookup("city"), ColumnType::Categorical);
    assert_eq!(lookup("name"), ColumnType::Text);

    let dist = Analyzer::default().frequency_distribution(&df, "city").unwrap();
    assert_eq!(dist.count_of("London"), Some(3));
    assert_eq!(dist.count_of("Berlin"), Some(2));
    assert_eq!(dist.entries.iter().map(|e| e.count).sum::<usize>(), df.height());
    assert_eq!(dist.entries[0].key, FrequencyKey::Value("London".to_string()));
}

#[test]
fn test_chart_data_for_clean_fixture() {
    let charts = chart_data(&load("clean.csv"), &DoctorConfig::default()).unwrap();

    assert_eq!(charts.histograms.len(), 3);
    assert!(charts.histograms.iter().all(|h| h.bins.len() == 30));
    assert_eq!(charts.bar_charts.len(), 1);
    assert_eq!(charts.missing_matrix.cells.len(), 8);
    assert_eq!(charts.correlation_heatmap.columns, vec!["id", "age", "score"]);
}

// ============================================================================
// Reporting and Export Tests
// ============================================================================

#[test]
fn test_report_and_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_csv_path(fixtures_path().join("messy.csv"), &LoadOptions::default()).unwrap();
    let metadata = loaded.metadata.clone();

    let mut session = CleaningSession::new(loaded.table);
    session
        .apply_all(&[
            CleaningOp::RemoveEmptyRows,
            CleaningOp::TrimWhitespace { columns: None },
            CleaningOp::RemoveDuplicates { subset: None },
        ])
        .unwrap();

    let summary = export_table(
        session.current(),
        &[ExportFormat::Csv, ExportFormat::Json],
        dir.path(),
        "cleaned_messy",
    )
    .unwrap();
    assert_eq!(summary.written.len(), 2);

    let reloaded = load_csv_path(&summary.written[0].path, &LoadOptions::default()).unwrap();
    assert_eq!(reloaded.table.shape(), session.current().shape());

    let generator = ReportGenerator::new(dir.path().to_path_buf(), DoctorConfig::default());
    let report = generator
        .build_report(ReportParams {
            input_file: &metadata.file_name,
            output_file: None,
            metadata: Some(&metadata),
            session: Some(&session),
            table: None,
        })
        .unwrap();

    let cleaning = report.cleaning.as_ref().unwrap();
    assert_eq!(cleaning.rows_before, 7);
    assert_eq!(cleaning.rows_after, 5);
    assert_eq!(cleaning.changes, session.changes().to_vec());

    let markdown = render_markdown(&report);
    assert!(markdown.contains("## Cleaning"));
    assert!(markdown.contains("## Quality Score Breakdown"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["metadata"]["file_name"], "messy.csv");
    assert_eq!(json["cleaning"]["rows_after"], 5);
}
