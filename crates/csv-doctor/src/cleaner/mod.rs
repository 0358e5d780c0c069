//! Data cleaning module.
//!
//! Every operation is a pure function from an input table (plus parameters)
//! to an [`OpOutcome`]: a new table and the change-log entries describing what
//! happened. The input table is never mutated. [`CleaningSession`] wraps the
//! operations with an original snapshot, a current table and an append-only
//! change log.
//!
//! Operations:
//! - Removing empty rows and empty columns
//! - Trimming whitespace in cells and column names
//! - Removing duplicate rows
//! - Filling missing values
//! - Standardizing column names
//! - Normalizing text case
//! - Removing outliers (IQR or z-score)
//! - Converting column types

mod converters;
mod fill;
mod names;
mod ops;
mod outliers;
mod session;

pub use converters::{ColumnConversion, ConversionTarget, convert_types};
pub use fill::{FillMethod, fill_missing};
pub use names::{
    make_unique_names, rename_changed_unique, standardize_column_names, standardize_name,
};
pub use ops::{
    TextCase, normalize_text_case, remove_duplicates, remove_empty_columns, remove_empty_rows,
    trim_whitespace,
};
pub use outliers::{OutlierMethod, remove_outliers};
pub use session::{CleaningOp, CleaningSession};

use crate::types::ChangeLogEntry;
use polars::prelude::*;
use std::collections::HashSet;

/// Result of a single cleaning operation.
#[derive(Debug, Clone)]
pub struct OpOutcome {
    /// The table produced by the operation.
    pub table: DataFrame,
    /// At least one entry; warnings are included here rather than raised.
    pub entries: Vec<ChangeLogEntry>,
}

impl OpOutcome {
    pub(crate) fn new(table: DataFrame, entries: Vec<ChangeLogEntry>) -> Self {
        Self { table, entries }
    }

    /// The input table, unchanged, with a single entry.
    pub(crate) fn unchanged(table: &DataFrame, entry: ChangeLogEntry) -> Self {
        Self {
            table: table.clone(),
            entries: vec![entry],
        }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ChangeLogEntry> {
        self.entries.iter().filter(|e| e.is_warning())
    }
}

/// Resolve the columns an operation should touch.
///
/// With no request, every column accepted by `default_filter` is targeted.
/// Requested columns that do not exist produce a warning entry and are skipped.
pub(crate) fn resolve_columns(
    df: &DataFrame,
    requested: Option<&[String]>,
    operation: &str,
    default_filter: impl Fn(&Series) -> bool,
) -> (Vec<String>, Option<ChangeLogEntry>) {
    match requested {
        None => {
            let targets = df
                .get_columns()
                .iter()
                .map(|c| c.as_materialized_series())
                .filter(|s| default_filter(s))
                .map(|s| s.name().to_string())
                .collect();
            (targets, None)
        }
        Some(requested) => {
            let existing: HashSet<&str> = df.get_column_names().into_iter().map(|n| n.as_str()).collect();
            let mut seen = HashSet::new();
            let mut targets = Vec::new();
            let mut missing = Vec::new();
            for name in requested {
                if !seen.insert(name.as_str()) {
                    continue;
                }
                if existing.contains(name.as_str()) {
                    targets.push(name.clone());
                } else {
                    missing.push(name.clone());
                }
            }

            let warning = (!missing.is_empty()).then(|| {
                ChangeLogEntry::warning(
                    operation,
                    format!("Columns not found: {}", missing.join(", ")),
                )
            });
            (targets, warning)
        }
    }
}
