use crate::analysis::Analyzer;
use crate::cleaner::CleaningSession;
use crate::config::DoctorConfig;
use crate::error::{Result, ResultExt};
use crate::io::TableMetadata;
use crate::quality::Validator;
use crate::types::{AnalysisReport, ChangeLogEntry, ValidationReport};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use super::markdown::render_markdown;

// ============================================================================
// Report Types
// ============================================================================

/// Validation, analysis and cleaning history of one table in a single document.
///
/// Serializes to the JSON report and renders to Markdown via
/// [`render_markdown`](super::render_markdown).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Name of the input file
    pub input_file: String,
    /// Path of the exported table, if one was written
    pub output_file: Option<String>,
    /// Load metadata, when the table came from a file
    pub metadata: Option<TableMetadata>,
    /// Before/after comparison and change log, when the table was cleaned
    pub cleaning: Option<CleaningSummary>,
    pub validation: ValidationReport,
    pub analysis: AnalysisReport,
}

/// Effect of a cleaning session on shape and quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    /// Overall quality score of the original table
    pub quality_before: f64,
    /// Overall quality score of the cleaned table
    pub quality_after: f64,
    pub changes: Vec<ChangeLogEntry>,
}

impl CleaningSummary {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn columns_removed(&self) -> usize {
        self.columns_before.saturating_sub(self.columns_after)
    }

    pub fn quality_improvement(&self) -> f64 {
        self.quality_after - self.quality_before
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Parameters for building a [`DatasetReport`].
pub struct ReportParams<'a> {
    pub input_file: &'a str,
    pub output_file: Option<&'a str>,
    pub metadata: Option<&'a TableMetadata>,
    /// Cleaning session whose current table is reported; takes precedence over `table`.
    pub session: Option<&'a CleaningSession>,
    /// Table to report when there is no session.
    pub table: Option<&'a DataFrame>,
}

/// Builds reports and writes them next to the exported data.
pub struct ReportGenerator {
    output_dir: PathBuf,
    config: DoctorConfig,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            config: DoctorConfig::default(),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf, config: DoctorConfig) -> Self {
        Self { output_dir, config }
    }

    /// Validate and analyze the reported table and assemble the report.
    ///
    /// Neither the table nor the session is modified.
    pub fn build_report(&self, params: ReportParams<'_>) -> Result<DatasetReport> {
        let validator = Validator::new(self.config.clone());
        let analyzer = Analyzer::new(self.config.clone());

        let empty = DataFrame::empty();
        let table = match (params.session, params.table) {
            (Some(session), _) => session.current(),
            (None, Some(table)) => table,
            (None, None) => &empty,
        };

        let validation = validator.validate(table)?;
        let analysis = analyzer.analyze(table)?;

        let cleaning = match params.session {
            Some(session) => {
                let original = session.original();
                Some(CleaningSummary {
                    rows_before: original.height(),
                    rows_after: table.height(),
                    columns_before: original.width(),
                    columns_after: table.width(),
                    quality_before: validator.quality_score(original)?.overall,
                    quality_after: validation.quality_score.overall,
                    changes: session.changes().to_vec(),
                })
            }
            None => None,
        };

        Ok(DatasetReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: params.input_file.to_string(),
            output_file: params.output_file.map(String::from),
            metadata: params.metadata.cloned(),
            cleaning,
            validation,
            analysis,
        })
    }

    /// Write the report as pretty JSON to `<output_dir>/<base_name>_report.json`.
    pub fn write_report_to_file(&self, report: &DatasetReport, base_name: &str) -> Result<PathBuf> {
        self.write_file(
            &format!("{}_report.json", base_name),
            &serde_json::to_string_pretty(report)?,
        )
    }

    /// Write the Markdown rendering to `<output_dir>/<base_name>_report.md`.
    pub fn write_markdown_to_file(&self, report: &DatasetReport, base_name: &str) -> Result<PathBuf> {
        self.write_file(&format!("{}_report.md", base_name), &render_markdown(report))
    }

    fn write_file(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .context(format!("Failed to create {}", self.output_dir.display()))?;

        let path = self.output_dir.join(file_name);
        let mut file = File::create(&path)?;
        file.write_all(contents.as_bytes())?;

        info!("Report saved: {}", path.display());
        Ok(path)
    }
}
