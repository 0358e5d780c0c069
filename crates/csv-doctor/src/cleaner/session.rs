//! Cleaning session: original snapshot, current table and change log.

use super::{
    ColumnConversion, ConversionTarget, FillMethod, OpOutcome, OutlierMethod, TextCase,
    convert_types, fill_missing, normalize_text_case, remove_duplicates, remove_empty_columns,
    remove_empty_rows, remove_outliers, standardize_column_names, trim_whitespace,
};
use crate::config::DoctorConfig;
use crate::error::{DoctorError, Result};
use crate::types::ChangeLogEntry;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

/// A single cleaning step, as submitted by a caller.
///
/// Serialized with an `op` tag so a whole plan can be sent as JSON:
///
/// ```json
/// [
///   {"op": "trim_whitespace"},
///   {"op": "fill_missing", "method": {"strategy": "median"}, "columns": ["age"]},
///   {"op": "remove_outliers", "method": {"method": "iqr", "multiplier": 1.5}}
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CleaningOp {
    RemoveEmptyRows,
    RemoveEmptyColumns,
    TrimWhitespace {
        columns: Option<Vec<String>>,
    },
    RemoveDuplicates {
        subset: Option<Vec<String>>,
    },
    FillMissing {
        method: FillMethod,
        columns: Option<Vec<String>>,
    },
    StandardizeColumnNames,
    NormalizeTextCase {
        case: TextCase,
        columns: Option<Vec<String>>,
    },
    RemoveOutliers {
        #[serde(default)]
        method: OutlierMethod,
        columns: Option<Vec<String>>,
    },
    ConvertTypes {
        conversions: Vec<ColumnConversion>,
    },
}

impl CleaningOp {
    /// Operation name as used in change-log entries.
    pub fn name(&self) -> &'static str {
        match self {
            CleaningOp::RemoveEmptyRows => "remove_empty_rows",
            CleaningOp::RemoveEmptyColumns => "remove_empty_columns",
            CleaningOp::TrimWhitespace { .. } => "trim_whitespace",
            CleaningOp::RemoveDuplicates { .. } => "remove_duplicates",
            CleaningOp::FillMissing { .. } => "fill_missing",
            CleaningOp::StandardizeColumnNames => "standardize_column_names",
            CleaningOp::NormalizeTextCase { .. } => "normalize_text_case",
            CleaningOp::RemoveOutliers { .. } => "remove_outliers",
            CleaningOp::ConvertTypes { .. } => "convert_types",
        }
    }

    /// Run the operation against a table without touching it.
    pub fn apply(&self, df: &DataFrame, config: &DoctorConfig) -> Result<OpOutcome> {
        match self {
            CleaningOp::RemoveEmptyRows => remove_empty_rows(df),
            CleaningOp::RemoveEmptyColumns => remove_empty_columns(df),
            CleaningOp::TrimWhitespace { columns } => trim_whitespace(df, columns.as_deref()),
            CleaningOp::RemoveDuplicates { subset } => remove_duplicates(df, subset.as_deref()),
            CleaningOp::FillMissing { method, columns } => {
                fill_missing(df, method, columns.as_deref())
            }
            CleaningOp::StandardizeColumnNames => standardize_column_names(df),
            CleaningOp::NormalizeTextCase { case, columns } => {
                normalize_text_case(df, *case, columns.as_deref())
            }
            CleaningOp::RemoveOutliers { method, columns } => {
                remove_outliers(df, *method, columns.as_deref(), &config.inference)
            }
            CleaningOp::ConvertTypes { conversions } => convert_types(df, conversions),
        }
    }
}

impl FromStr for CleaningOp {
    type Err = DoctorError;

    /// Parse the command-line form `name[:param][@col1,col2,...]`.
    ///
    /// Examples: `remove_empty_rows`, `trim_whitespace@name,city`,
    /// `fill_missing:median@age`, `fill_missing:constant=unknown`,
    /// `normalize_text_case:title`, `remove_outliers:zscore=2.5`,
    /// `convert_types:numeric@price`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (head, columns) = match s.trim().split_once('@') {
            Some((head, cols)) => {
                let cols: Vec<String> = cols
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
                (head, (!cols.is_empty()).then_some(cols))
            }
            None => (s.trim(), None),
        };
        let (name, param) = match head.split_once(':') {
            Some((name, param)) => (name.trim(), Some(param.trim())),
            None => (head.trim(), None),
        };

        let require_param = |what: &str| {
            param.filter(|p| !p.is_empty()).ok_or_else(|| {
                DoctorError::InvalidOperation(format!("'{}' needs a {} (e.g. {}:...)", name, what, name))
            })
        };

        let op = match name.to_lowercase().replace('-', "_").as_str() {
            "remove_empty_rows" | "empty_rows" => CleaningOp::RemoveEmptyRows,
            "remove_empty_columns" | "empty_columns" => CleaningOp::RemoveEmptyColumns,
            "trim_whitespace" | "trim" => CleaningOp::TrimWhitespace { columns },
            "remove_duplicates" | "dedupe" => CleaningOp::RemoveDuplicates { subset: columns },
            "fill_missing" | "fill" => CleaningOp::FillMissing {
                method: require_param("fill method")?.parse()?,
                columns,
            },
            "standardize_column_names" | "standardize_names" => CleaningOp::StandardizeColumnNames,
            "normalize_text_case" | "case" => CleaningOp::NormalizeTextCase {
                case: require_param("text case")?.parse()?,
                columns,
            },
            "remove_outliers" | "outliers" => CleaningOp::RemoveOutliers {
                method: match param {
                    Some(p) if !p.is_empty() => p.parse()?,
                    _ => OutlierMethod::default(),
                },
                columns,
            },
            "convert_types" | "convert" => {
                let target: ConversionTarget = require_param("target type")?.parse()?;
                let columns = columns.ok_or_else(|| {
                    DoctorError::InvalidOperation(
                        "'convert_types' needs columns (e.g. convert_types:numeric@price)"
                            .to_string(),
                    )
                })?;
                CleaningOp::ConvertTypes {
                    conversions: columns
                        .into_iter()
                        .map(|c| ColumnConversion::new(c, target))
                        .collect(),
                }
            }
            other => {
                return Err(DoctorError::InvalidOperation(format!(
                    "unknown cleaning operation '{}'",
                    other
                )));
            }
        };

        Ok(op)
    }
}

/// An in-memory cleaning session over one table.
///
/// Holds the table as loaded, the table after every applied operation, and the
/// change log of everything done since the last reset.
#[derive(Debug, Clone)]
pub struct CleaningSession {
    original: DataFrame,
    current: DataFrame,
    log: Vec<ChangeLogEntry>,
    config: DoctorConfig,
}

// Sessions are held per request thread by callers.
static_assertions::assert_impl_all!(CleaningSession: Send, Sync);
static_assertions::assert_impl_all!(CleaningOp: Send, Sync);

impl CleaningSession {
    pub fn new(df: DataFrame) -> Self {
        Self::with_config(df, DoctorConfig::default())
    }

    pub fn with_config(df: DataFrame, config: DoctorConfig) -> Self {
        Self {
            original: df.clone(),
            current: df,
            log: Vec::new(),
            config,
        }
    }

    /// Apply one operation to the current table.
    ///
    /// Returns the entries this operation appended. On error the current table
    /// and the log are left as they were.
    pub fn apply(&mut self, op: &CleaningOp) -> Result<&[ChangeLogEntry]> {
        let outcome = op
            .apply(&self.current, &self.config)
            .map_err(|e| e.with_context(format!("Cleaning operation '{}' failed", op.name())))?;

        for entry in outcome.entries.iter().filter(|e| e.is_warning()) {
            warn!("{}: {}", op.name(), entry.message);
        }

        let start = self.log.len();
        self.current = outcome.table;
        self.log.extend(outcome.entries);
        Ok(&self.log[start..])
    }

    /// Apply operations in the given order, stopping at the first error.
    ///
    /// Returns the number of log entries appended.
    pub fn apply_all(&mut self, ops: &[CleaningOp]) -> Result<usize> {
        let start = self.log.len();
        for op in ops {
            self.apply(op)?;
        }
        info!(
            "Applied {} cleaning operations; table is now {} x {}",
            ops.len(),
            self.current.height(),
            self.current.width()
        );
        Ok(self.log.len() - start)
    }

    /// Restore the original table and clear the change log.
    pub fn reset(&mut self) {
        self.current = self.original.clone();
        self.log.clear();
        info!("Cleaning session reset to original table");
    }

    pub fn changes(&self) -> &[ChangeLogEntry] {
        &self.log
    }

    pub fn current(&self) -> &DataFrame {
        &self.current
    }

    pub fn original(&self) -> &DataFrame {
        &self.original
    }

    pub fn config(&self) -> &DoctorConfig {
        &self.config
    }

    pub fn into_table(self) -> DataFrame {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn messy_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new(" Name ".into(), &[Some(" alice "), Some(" alice "), None, Some("bob")]),
            Column::new("Age".into(), &[Some(30i64), Some(30), None, None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_session_apply_records_changes() {
        let mut session = CleaningSession::new(messy_df());

        let appended = session.apply(&CleaningOp::RemoveEmptyRows).unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].rows_affected, 1);

        session
            .apply(&CleaningOp::TrimWhitespace { columns: None })
            .unwrap();
        session
            .apply(&CleaningOp::RemoveDuplicates { subset: None })
            .unwrap();

        assert_eq!(session.current().height(), 2);
        assert_eq!(session.original().height(), 4);
        assert_eq!(session.changes().len(), 3);
    }

    #[test]
    fn test_session_reset() {
        let mut session = CleaningSession::new(messy_df());
        session.apply(&CleaningOp::StandardizeColumnNames).unwrap();
        session.reset();

        assert!(session.changes().is_empty());
        assert!(session.current().equals_missing(session.original()));
    }

    #[test]
    fn test_session_warning_does_not_abort() {
        let mut session = CleaningSession::new(messy_df());
        session.apply(&CleaningOp::RemoveEmptyRows).unwrap();
        let result = session.apply(&CleaningOp::FillMissing {
            method: FillMethod::Mean,
            columns: Some(vec!["missing".to_string()]),
        });
        assert!(result.is_ok());
        assert_eq!(session.changes().len(), 3);
        assert!(session.changes()[2].is_warning());
    }

    #[test]
    fn test_apply_all_in_order() {
        let ops = vec![
            CleaningOp::StandardizeColumnNames,
            CleaningOp::FillMissing {
                method: FillMethod::Median,
                columns: Some(vec!["age".to_string()]),
            },
        ];
        let mut session = CleaningSession::new(messy_df());
        let appended = session.apply_all(&ops).unwrap();

        assert_eq!(appended, 2);
        assert_eq!(session.current().column("age").unwrap().null_count(), 0);
    }

    #[test]
    fn test_cleaning_op_from_str() {
        assert_eq!(
            "remove_empty_rows".parse::<CleaningOp>().unwrap(),
            CleaningOp::RemoveEmptyRows
        );
        assert_eq!(
            "fill_missing:median@age,score".parse::<CleaningOp>().unwrap(),
            CleaningOp::FillMissing {
                method: FillMethod::Median,
                columns: Some(vec!["age".to_string(), "score".to_string()]),
            }
        );
        assert_eq!(
            "remove_outliers".parse::<CleaningOp>().unwrap(),
            CleaningOp::RemoveOutliers {
                method: OutlierMethod::default(),
                columns: None,
            }
        );
        assert_eq!(
            "convert_types:numeric@price".parse::<CleaningOp>().unwrap(),
            CleaningOp::ConvertTypes {
                conversions: vec![ColumnConversion::new("price", ConversionTarget::Numeric)],
            }
        );
        assert!("fill_missing".parse::<CleaningOp>().is_err());
        assert!("convert_types:numeric".parse::<CleaningOp>().is_err());
        assert!("explode".parse::<CleaningOp>().is_err());
    }

    #[test]
    fn test_cleaning_op_json_plan() {
        let plan = r#"[
            {"op": "trim_whitespace"},
            {"op": "fill_missing", "method": {"strategy": "constant", "value": "n/a"}, "columns": ["name"]},
            {"op": "normalize_text_case", "case": "title"},
            {"op": "remove_outliers"}
        ]"#;
        let ops: Vec<CleaningOp> = serde_json::from_str(plan).unwrap();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0], CleaningOp::TrimWhitespace { columns: None });
        assert_eq!(
            ops[3],
            CleaningOp::RemoveOutliers {
                method: OutlierMethod::default(),
                columns: None
            }
        );
    }
}
