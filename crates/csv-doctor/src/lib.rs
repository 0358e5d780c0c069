//! CSV Cleaning and Quality Scoring Library
//!
//! Load a CSV file, clean it through composable transformations, score its
//! quality and describe it, all on top of Polars.
//!
//! # Overview
//!
//! - **Ingestion**: Delimiter detection, structural checks and load metadata
//! - **Type Inference**: One shared rule set for numeric, categorical, datetime and text columns
//! - **Cleaning**: Pure operations plus a [`CleaningSession`] that keeps the original table and a change log
//! - **Validation**: Missing values, duplicates, malformed rows, anomalies and a composite quality score
//! - **Analysis**: Summary statistics, correlations, frequencies and per-column insights
//! - **Chart Data**: Numbers for histograms, bar charts, heatmaps and box plots
//! - **Reporting**: A combined JSON report and its Markdown rendering
//! - **Export**: CSV, TSV and JSON, with Parquet and Arrow IPC behind cargo features
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use csv_doctor::{Analyzer, CleaningOp, CleaningSession, FillMethod, LoadOptions, Validator};
//! use csv_doctor::io::load_csv_path;
//!
//! let loaded = load_csv_path("data.csv", &LoadOptions::default())?;
//!
//! let mut session = CleaningSession::new(loaded.table);
//! session.apply(&CleaningOp::RemoveEmptyRows)?;
//! session.apply(&CleaningOp::RemoveDuplicates { subset: None })?;
//! session.apply(&CleaningOp::FillMissing {
//!     method: FillMethod::Median,
//!     columns: None,
//! })?;
//!
//! for change in session.changes() {
//!     println!("{}", change);
//! }
//!
//! let report = Validator::default().validate(session.current())?;
//! println!("Quality score: {:.1}/100", report.quality_score.overall);
//!
//! let analysis = Analyzer::default().analyze(session.current())?;
//! println!("Strong correlations: {}", analysis.high_correlations.len());
//! ```
//!
//! # Cleaning Plans
//!
//! Operations are serde enums, so a whole plan can come from JSON:
//!
//! ```rust,ignore
//! let plan: Vec<CleaningOp> = serde_json::from_str(r#"[
//!     {"op": "trim_whitespace"},
//!     {"op": "fill_missing", "method": {"strategy": "constant", "value": "unknown"}},
//!     {"op": "remove_outliers", "method": {"method": "z_score", "threshold": 3.0}}
//! ]"#)?;
//! session.apply_all(&plan)?;
//! ```
//!
//! # Configuration
//!
//! Every threshold lives in [`DoctorConfig`]:
//!
//! ```rust,ignore
//! use csv_doctor::DoctorConfig;
//!
//! let config = DoctorConfig::builder()
//!     .iqr_multiplier(3.0)
//!     .correlation_threshold(0.8)
//!     .anomaly_penalty(10.0)
//!     .build()?;
//!
//! let validator = Validator::new(config);
//! ```

pub mod analysis;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod io;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analysis::Analyzer;
pub use charts::{ChartData, chart_data};
pub use cleaner::{
    CleaningOp, CleaningSession, ColumnConversion, ConversionTarget, FillMethod, OpOutcome,
    OutlierMethod, TextCase,
};
pub use config::{
    AnalysisConfig, CleaningConfig, ConfigValidationError, DoctorConfig, DoctorConfigBuilder,
    InferenceConfig, QualityConfig, ScoreWeights,
};
pub use error::{DoctorError, Result as DoctorResult, ResultExt};
pub use io::{ExportFormat, ExportSummary, LoadOptions, LoadedTable, TableMetadata};
pub use profiler::{infer_column_type, infer_table_types};
pub use quality::Validator;
pub use reporting::{DatasetReport, ReportGenerator, ReportParams, render_markdown};
pub use types::{
    AnalysisReport, AnomalyKind, AnomalyRecord, ChangeKind, ChangeLogEntry, ColumnType,
    QualityScore, SchemaValidation, ValidationReport,
};

static_assertions::assert_impl_all!(Validator: Send, Sync);
static_assertions::assert_impl_all!(Analyzer: Send, Sync);
static_assertions::assert_impl_all!(LoadedTable: Send, Sync);
static_assertions::assert_impl_all!(DatasetReport: Send, Sync);
