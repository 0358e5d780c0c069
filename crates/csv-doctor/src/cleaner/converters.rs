//! Column type conversion.

use super::OpOutcome;
use crate::error::{DoctorError, Result};
use crate::types::ChangeLogEntry;
use crate::utils::{is_datetime_dtype, is_numeric_dtype, parse_datetime_string, series_to_f64, series_to_strings};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Target type of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionTarget {
    /// Float64; unparseable values become missing.
    Numeric,
    /// Millisecond datetime; unparseable values become missing.
    Datetime,
    /// String rendering of every value.
    Text,
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConversionTarget::Numeric => "numeric",
            ConversionTarget::Datetime => "datetime",
            ConversionTarget::Text => "text",
        })
    }
}

impl FromStr for ConversionTarget {
    type Err = DoctorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "numeric" | "number" | "float" => Ok(ConversionTarget::Numeric),
            "datetime" | "date" => Ok(ConversionTarget::Datetime),
            "text" | "string" | "str" => Ok(ConversionTarget::Text),
            other => Err(DoctorError::InvalidOperation(format!(
                "unknown conversion target '{}' (expected numeric, datetime or text)",
                other
            ))),
        }
    }
}

/// One requested conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConversion {
    pub column: String,
    pub target: ConversionTarget,
}

impl ColumnConversion {
    pub fn new(column: impl Into<String>, target: ConversionTarget) -> Self {
        Self {
            column: column.into(),
            target,
        }
    }
}

/// Convert columns to the requested types.
///
/// Values that cannot be represented in the target type become missing and
/// are reported in a warning entry per column.
pub fn convert_types(df: &DataFrame, conversions: &[ColumnConversion]) -> Result<OpOutcome> {
    const OP: &str = "convert_types";

    let mut table = df.clone();
    let mut warnings = Vec::new();
    let mut converted = Vec::new();

    for conversion in conversions {
        let name = conversion.column.as_str();
        let Ok(column) = table.column(name) else {
            warnings.push(ChangeLogEntry::warning(
                OP,
                format!("Column '{}' not found; skipped", name),
            ));
            continue;
        };
        let series = column.as_materialized_series().clone();

        let already = match conversion.target {
            ConversionTarget::Numeric => series.dtype() == &DataType::Float64,
            ConversionTarget::Datetime => is_datetime_dtype(series.dtype()),
            ConversionTarget::Text => series.dtype() == &DataType::String,
        };
        if already {
            continue;
        }

        let new_series = match conversion.target {
            ConversionTarget::Numeric => to_numeric(&series)?,
            ConversionTarget::Datetime => to_datetime(&series)?,
            ConversionTarget::Text => series.cast(&DataType::String)?,
        };

        let coerced = new_series.null_count().saturating_sub(series.null_count());
        if coerced > 0 {
            warn!(
                "{} values in '{}' could not be converted to {}",
                coerced, name, conversion.target
            );
            warnings.push(
                ChangeLogEntry::warning(
                    OP,
                    format!(
                        "{} values in '{}' could not be converted to {} and were set to missing",
                        coerced, name, conversion.target
                    ),
                )
                .with_cells(coerced),
            );
        }

        table.replace(name, new_series)?;
        converted.push(format!("'{}' -> {}", name, conversion.target));
    }

    let summary = if converted.is_empty() {
        ChangeLogEntry::no_op(OP, "No columns converted")
    } else {
        info!("Converted {} columns", converted.len());
        ChangeLogEntry::applied(
            OP,
            format!("Converted {} columns: {}", converted.len(), converted.join(", ")),
        )
        .with_columns(converted.len())
    };

    let mut entries = vec![summary];
    entries.extend(warnings);
    Ok(OpOutcome::new(table, entries))
}

fn to_numeric(series: &Series) -> PolarsResult<Series> {
    if is_numeric_dtype(series.dtype()) {
        return series.cast(&DataType::Float64);
    }
    Ok(Series::new(series.name().clone(), series_to_f64(series)?))
}

fn to_datetime(series: &Series) -> PolarsResult<Series> {
    let millis: Vec<Option<i64>> = series_to_strings(series)?
        .into_iter()
        .map(|v| {
            v.as_deref()
                .and_then(parse_datetime_string)
                .map(|dt| dt.and_utc().timestamp_millis())
        })
        .collect();
    Series::new(series.name().clone(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}
