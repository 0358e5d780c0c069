use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Column Types
// ============================================================================

/// Semantic type of a column, derived from its values.
///
/// Never stored on the table: recompute it with
/// [`crate::profiler::infer_column_type`] whenever it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Datetime,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Datetime => "datetime",
            ColumnType::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Change Log
// ============================================================================

/// Outcome class of a logged cleaning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The operation changed the table.
    Applied,
    /// The operation ran but nothing matched.
    NoOp,
    /// Part of the operation was skipped (e.g. mean fill on a text column).
    Warning,
}

/// One human-readable entry of a cleaning session's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Name of the operation that produced the entry.
    pub operation: String,
    pub kind: ChangeKind,
    pub message: String,
    pub rows_affected: usize,
    pub columns_affected: usize,
    pub cells_affected: usize,
}

impl ChangeLogEntry {
    fn new(operation: &str, kind: ChangeKind, message: impl Into<String>) -> Self {
        Self {
            operation: operation.to_string(),
            kind,
            message: message.into(),
            rows_affected: 0,
            columns_affected: 0,
            cells_affected: 0,
        }
    }

    pub fn applied(operation: &str, message: impl Into<String>) -> Self {
        Self::new(operation, ChangeKind::Applied, message)
    }

    pub fn no_op(operation: &str, message: impl Into<String>) -> Self {
        Self::new(operation, ChangeKind::NoOp, message)
    }

    pub fn warning(operation: &str, message: impl Into<String>) -> Self {
        Self::new(operation, ChangeKind::Warning, message)
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows_affected = rows;
        self
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns_affected = columns;
        self
    }

    pub fn with_cells(mut self, cells: usize) -> Self {
        self.cells_affected = cells;
        self
    }

    pub fn is_warning(&self) -> bool {
        self.kind == ChangeKind::Warning
    }

    pub fn is_no_op(&self) -> bool {
        self.kind == ChangeKind::NoOp
    }
}

impl fmt::Display for ChangeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::Warning => write!(f, "Warning: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

// ============================================================================
// Validation Types
// ============================================================================

/// Composite quality score and its four sub-scores, all in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub overall: f64,
    pub null_score: f64,
    pub duplicate_score: f64,
    pub type_score: f64,
    pub anomaly_score: f64,
    /// Anomalies plus one each for the presence of nulls and duplicates.
    pub issues_count: usize,
}

/// Structural oddities the validator flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    ConstantColumn,
    HighNullPercentage,
    NearZeroVariance,
    DominantValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    pub message: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNullStats {
    pub column: String,
    pub null_count: usize,
    pub null_percentage: f64,
    pub non_null_count: usize,
}

/// Per-column and overall missing-value counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullDistribution {
    pub columns: Vec<ColumnNullStats>,
    pub total_null_count: usize,
    pub total_cells: usize,
    /// Missing cells over total cells, as a percentage.
    pub total_null_percentage: f64,
}

impl NullDistribution {
    pub fn column(&self, name: &str) -> Option<&ColumnNullStats> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// Rows that repeat an earlier row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
    pub sample_rows: Vec<usize>,
}

/// Rows with a missing cell or an unparseable value in a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedRows {
    pub count: usize,
    pub rows_with_missing: usize,
    pub rows_with_unparseable_numbers: usize,
    pub sample_rows: Vec<usize>,
}

/// Physical and inferred type of one column, with its conformance ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    pub column: String,
    pub dtype: String,
    pub inferred_type: ColumnType,
    pub distinct_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    /// Share of non-missing values that conform to `inferred_type`.
    pub conforming_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows: usize,
    pub columns: usize,
    pub null_distribution: NullDistribution,
    pub column_types: Vec<ColumnTypeInfo>,
    pub duplicates: DuplicateReport,
    pub malformed_rows: MalformedRows,
    pub anomalies: Vec<AnomalyRecord>,
    pub quality_score: QualityScore,
}

/// Result of checking a table against expected column types.
///
/// Missing columns are errors and make the table invalid; type mismatches
/// are warnings only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub valid: bool,
    pub missing_columns: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

// ============================================================================
// Analysis Types
// ============================================================================

/// Descriptive statistics of a numeric column.
///
/// `skewness` and `kurtosis` are `None` when undefined for the data
/// (too few values or zero spread).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub iqr: f64,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub approximately_normal: Option<bool>,
}

/// Summary statistics, or an explicit marker when they cannot be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NumericSummary {
    Available(SummaryStats),
    Unavailable { count: usize, reason: String },
}

impl NumericSummary {
    pub fn stats(&self) -> Option<&SummaryStats> {
        match self {
            NumericSummary::Available(stats) => Some(stats),
            NumericSummary::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, NumericSummary::Available(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub summary: NumericSummary,
}

/// Pearson correlation matrix over the numeric columns.
///
/// Undefined coefficients are NaN (serialized as JSON `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

/// Key of a frequency bucket. Missing cells get their own bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FrequencyKey {
    Value(String),
    Missing,
}

impl fmt::Display for FrequencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyKey::Value(v) => f.write_str(v),
            FrequencyKey::Missing => f.write_str("<missing>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub key: FrequencyKey,
    pub count: usize,
    pub percentage: f64,
}

/// Value counts of one column, most frequent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDistribution {
    pub column: String,
    pub total: usize,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyDistribution {
    pub fn count_of(&self, value: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| matches!(&e.key, FrequencyKey::Value(v) if v == value))
            .map(|e| e.count)
    }

    pub fn missing_count(&self) -> usize {
        self.entries
            .iter()
            .find(|e| e.key == FrequencyKey::Missing)
            .map(|e| e.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInsight {
    pub column: String,
    pub dtype: String,
    pub inferred_type: ColumnType,
    pub total_values: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub distinct_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_values: Option<Vec<FrequencyEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
    pub total_cells: usize,
    pub null_cells: usize,
    pub null_percentage: f64,
    pub duplicate_rows: usize,
    pub estimated_bytes: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub datetime_columns: usize,
    pub text_columns: usize,
    pub column_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub distinct_count: usize,
    pub top_value: Option<String>,
    pub top_count: usize,
    pub null_count: usize,
    pub most_common: Vec<FrequencyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub overview: DatasetOverview,
    pub summary_stats: Vec<ColumnSummary>,
    pub null_distribution: NullDistribution,
    pub correlation_matrix: CorrelationMatrix,
    pub high_correlations: Vec<CorrelatedPair>,
    pub categorical_summary: Vec<CategoricalSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_log_entry_builders() {
        let entry = ChangeLogEntry::applied("remove_empty_rows", "Removed 2 completely empty rows")
            .with_rows(2);
        assert_eq!(entry.rows_affected, 2);
        assert_eq!(entry.kind, ChangeKind::Applied);
        assert_eq!(entry.to_string(), "Removed 2 completely empty rows");

        let warning = ChangeLogEntry::warning("fill_missing", "Skipped 'name'");
        assert!(warning.is_warning());
        assert_eq!(warning.to_string(), "Warning: Skipped 'name'");
    }

    #[test]
    fn test_numeric_summary_serialization() {
        let summary = NumericSummary::Unavailable {
            count: 1,
            reason: "fewer than 2 numeric values".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["count"], 1);
        assert!(summary.stats().is_none());
    }

    #[test]
    fn test_nan_correlation_serializes_as_null() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".to_string()],
            values: vec![vec![f64::NAN]],
        };
        let json = serde_json::to_value(&matrix).unwrap();
        assert!(json["values"][0][0].is_null());
    }

    #[test]
    fn test_frequency_key_serialization() {
        let json = serde_json::to_value(FrequencyKey::Missing).unwrap();
        assert_eq!(json["kind"], "missing");
        let json = serde_json::to_value(FrequencyKey::Value("a".to_string())).unwrap();
        assert_eq!(json["value"], "a");
    }

    #[test]
    fn test_column_type_display() {
        assert_eq!(ColumnType::Categorical.to_string(), "categorical");
        assert_eq!(
            serde_json::to_string(&ColumnType::Datetime).unwrap(),
            "\"datetime\""
        );
    }
}
