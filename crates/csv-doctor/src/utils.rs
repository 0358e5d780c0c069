//! Shared utilities for csv-doctor.
//!
//! Value parsing and column extraction helpers used by type inference, the
//! cleaner, the validator and the analyzer, so that every component agrees on
//! what "parses as a number" or "parses as a date" means.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Check if a DataType holds strings.
#[inline]
pub fn is_string_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Try to parse a string as a finite number.
///
/// Surrounding whitespace is ignored. `NaN` and infinity spellings are
/// rejected so that they never count towards a numeric column.
///
/// # Example
///
/// ```rust,ignore
/// use csv_doctor::utils::parse_numeric_string;
///
/// assert_eq!(parse_numeric_string(" 42 "), Some(42.0));
/// assert_eq!(parse_numeric_string("nan"), None);
/// ```
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Check if a string can be parsed as a numeric value.
pub fn is_numeric_string(s: &str) -> bool {
    parse_numeric_string(s).is_some()
}

/// Accepted date-only formats, tried in order.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d %b %Y", "%b %d, %Y",
];

/// Accepted date-time formats, tried in order.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Try to parse a string as a date or date-time.
///
/// Dates without a time component are returned at midnight.
pub fn parse_datetime_string(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Check if a string can be parsed as a date.
pub fn is_datetime_string(s: &str) -> bool {
    parse_datetime_string(s).is_some()
}

// =============================================================================
// Column Extraction Utilities
// =============================================================================

/// Column names of a DataFrame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Render every cell of a Series as a string, keeping nulls as `None`.
///
/// Numbers, booleans and dates are rendered the way Polars casts them to
/// strings, so two equal cells always render identically.
pub fn series_to_strings(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Read every cell of a Series as a number.
///
/// Numeric dtypes are cast directly; other dtypes are parsed from their
/// string form. Cells that are null or fail to parse become `None`.
pub fn series_to_f64(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    if is_numeric_dtype(series.dtype()) {
        let float_series = series.cast(&DataType::Float64)?;
        return Ok(float_series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect());
    }

    Ok(series_to_strings(series)?
        .into_iter()
        .map(|v| v.as_deref().and_then(parse_numeric_string))
        .collect())
}

/// Non-missing numeric values of a Series, in row order.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(series_to_f64(series)?.into_iter().flatten().collect())
}

/// Build one comparable key per row from the given columns.
///
/// Nulls are part of the key, so two missing cells compare equal.
pub fn row_keys(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<Vec<Option<String>>>> {
    let rendered: Vec<Vec<Option<String>>> = columns
        .iter()
        .map(|name| series_to_strings(df.column(name)?.as_materialized_series()))
        .collect::<PolarsResult<_>>()?;

    Ok((0..df.height())
        .map(|row| rendered.iter().map(|col| col[row].clone()).collect())
        .collect())
}

/// Convert one cell to a JSON value.
///
/// Numbers and booleans keep their JSON type; non-finite floats become null;
/// anything else is rendered as a string.
pub fn any_value_to_json(value: &AnyValue) -> serde_json::Value {
    use serde_json::Value;
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => Value::String(other.to_string()),
    }
}

/// The first `n` rows as JSON records keyed by column name, in column order.
pub fn head_records(
    df: &DataFrame,
    n: usize,
) -> PolarsResult<Vec<IndexMap<String, serde_json::Value>>> {
    let rows = n.min(df.height());
    let mut records = Vec::with_capacity(rows);
    for row in 0..rows {
        let mut record = IndexMap::with_capacity(df.width());
        for col in df.get_columns() {
            let value = col.get(row)?;
            record.insert(col.name().to_string(), any_value_to_json(&value));
        }
        records.push(record);
    }
    Ok(records)
}

/// Percentage of `part` in `total`; zero when `total` is zero.
#[inline]
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let filled: Vec<Option<f64>> = float_series
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let filled: Vec<Option<String>> = series_to_strings(series)?
        .into_iter()
        .map(|v| Some(v.unwrap_or_else(|| fill_value.to_string())))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_records_keep_types_and_order() {
        let df = DataFrame::new(vec![
            Column::new("b".into(), &[Some(1i64), None, Some(3)]),
            Column::new("a".into(), &["x", "y", "z"]),
        ])
        .unwrap();
        let records = head_records(&df, 2).unwrap();

        assert_eq!(records.len(), 2);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(records[0]["b"], serde_json::json!(1));
        assert_eq!(records[1]["b"], serde_json::Value::Null);
        assert_eq!(records[1]["a"], serde_json::json!("y"));
    }

    #[test]
    fn test_any_value_nan_is_null() {
        assert_eq!(any_value_to_json(&AnyValue::Float64(f64::NAN)), serde_json::Value::Null);
        assert_eq!(any_value_to_json(&AnyValue::Boolean(true)), serde_json::json!(true));
    }

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_datetime_dtype() {
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(is_datetime_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_datetime_dtype(&DataType::String));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("  -1.5 "), Some(-1.5));
        assert_eq!(parse_numeric_string("1e3"), Some(1000.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("hello"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
        assert_eq!(parse_numeric_string("inf"), None);
    }

    #[test]
    fn test_parse_datetime_string() {
        assert!(is_datetime_string("2024-01-15"));
        assert!(is_datetime_string("2024/01/15"));
        assert!(is_datetime_string("01/15/2024"));
        assert!(is_datetime_string("2024-01-15 10:30:00"));
        assert!(is_datetime_string("2024-01-15T10:30:00.123"));
        assert!(is_datetime_string("2024-01-15T10:30:00Z"));
        assert!(is_datetime_string("15 Jan 2024"));
        assert!(!is_datetime_string("hello"));
        assert!(!is_datetime_string("2024-13-45"));
        assert!(!is_datetime_string("42"));
    }

    #[test]
    fn test_series_to_strings_keeps_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None, Some("b")]);
        let values = series_to_strings(&series).unwrap();
        assert_eq!(
            values,
            vec![Some("a".to_string()), None, Some("b".to_string())]
        );
    }

    #[test]
    fn test_series_to_f64_from_strings() {
        let series = Series::new("test".into(), &[Some("1.5"), Some("x"), None]);
        assert_eq!(series_to_f64(&series).unwrap(), vec![Some(1.5), None, None]);
    }

    #[test]
    fn test_series_to_f64_from_ints() {
        let series = Series::new("test".into(), &[Some(1i64), None, Some(3)]);
        assert_eq!(
            series_to_f64(&series).unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );
        assert_eq!(numeric_values(&series).unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_row_keys_treat_nulls_as_equal() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[Some(1i64), Some(1), None]),
            Column::new("b".into(), &[None::<&str>, None, Some("x")]),
        ])
        .unwrap();
        let keys = row_keys(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None]);
        let filled = fill_string_nulls(&series, "b").unwrap();
        assert_eq!(
            series_to_strings(&filled).unwrap(),
            vec![Some("a".to_string()), Some("b".to_string())]
        );
    }
}
