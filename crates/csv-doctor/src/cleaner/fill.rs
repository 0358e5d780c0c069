//! Missing value imputation.

use super::{OpOutcome, resolve_columns};
use crate::error::{DoctorError, Result};
use crate::profiler::statistics::{calculate_mean, quantile_sorted, sorted_copy};
use crate::types::ChangeLogEntry;
use crate::utils::{
    fill_numeric_nulls, fill_string_nulls, is_numeric_dtype, is_string_dtype, numeric_values,
    parse_numeric_string, series_to_strings,
};
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// How [`fill_missing`] chooses replacement values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum FillMethod {
    /// Column mean. Numeric columns only.
    Mean,
    /// Column median. Numeric columns only.
    Median,
    /// Most frequent value; ties go to the value seen first.
    Mode,
    /// Previous non-missing value. Leading missing cells stay missing.
    ForwardFill,
    /// Next non-missing value. Trailing missing cells stay missing.
    BackwardFill,
    /// A fixed literal. Numeric columns require a numeric literal.
    Constant(String),
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillMethod::Mean => f.write_str("mean"),
            FillMethod::Median => f.write_str("median"),
            FillMethod::Mode => f.write_str("mode"),
            FillMethod::ForwardFill => f.write_str("forward fill"),
            FillMethod::BackwardFill => f.write_str("backward fill"),
            FillMethod::Constant(value) => write!(f, "constant '{}'", value),
        }
    }
}

impl FromStr for FillMethod {
    type Err = DoctorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(value) = s
            .strip_prefix("constant=")
            .or_else(|| s.strip_prefix("constant:"))
        {
            return Ok(FillMethod::Constant(value.to_string()));
        }

        match s.to_lowercase().as_str() {
            "mean" => Ok(FillMethod::Mean),
            "median" => Ok(FillMethod::Median),
            "mode" => Ok(FillMethod::Mode),
            "ffill" | "forward" | "forward_fill" => Ok(FillMethod::ForwardFill),
            "bfill" | "backward" | "backward_fill" => Ok(FillMethod::BackwardFill),
            other => Err(DoctorError::InvalidOperation(format!(
                "unknown fill method '{}' (expected mean, median, mode, ffill, bfill or constant=VALUE)",
                other
            ))),
        }
    }
}

/// Fill missing cells in the given columns (all columns by default).
///
/// Columns the method cannot handle are skipped with a warning entry.
pub fn fill_missing(
    df: &DataFrame,
    method: &FillMethod,
    columns: Option<&[String]>,
) -> Result<OpOutcome> {
    const OP: &str = "fill_missing";

    let (targets, missing) = resolve_columns(df, columns, OP, |_| true);
    let mut warnings: Vec<ChangeLogEntry> = missing.into_iter().collect();
    let mut table = df.clone();
    let mut cells_filled = 0;
    let mut columns_filled = 0;

    for name in &targets {
        let series = table.column(name)?.as_materialized_series().clone();
        let before = series.null_count();
        if before == 0 {
            continue;
        }

        let filled = match fill_series(&series, method)? {
            Ok((filled, dtype_note)) => {
                if let Some(note) = dtype_note {
                    warn!("{}", note);
                    warnings.push(ChangeLogEntry::warning(OP, note));
                }
                filled
            }
            Err(reason) => {
                warn!("Skipping '{}': {}", name, reason);
                warnings.push(ChangeLogEntry::warning(
                    OP,
                    format!("Column '{}' skipped: {}", name, reason),
                ));
                continue;
            }
        };

        let count = before.saturating_sub(filled.null_count());
        if count > 0 {
            debug!("Filled {} cells in '{}' using {}", count, name, method);
            table.replace(name, filled)?;
            cells_filled += count;
            columns_filled += 1;
        }
    }

    let summary = if cells_filled == 0 {
        ChangeLogEntry::no_op(OP, format!("No missing values filled using {}", method))
    } else {
        info!(
            "Filled {} missing values in {} columns using {}",
            cells_filled, columns_filled, method
        );
        ChangeLogEntry::applied(
            OP,
            format!(
                "Filled {} missing values in {} columns using {}",
                cells_filled, columns_filled, method
            ),
        )
        .with_cells(cells_filled)
        .with_columns(columns_filled)
    };

    let mut entries = vec![summary];
    entries.extend(warnings);
    Ok(OpOutcome::new(table, entries))
}

/// A filled column plus a note when its dtype had to change.
type Filled = (Series, Option<String>);

/// Fill one column. The inner `Err` carries the reason the column was skipped.
fn fill_series(series: &Series, method: &FillMethod) -> PolarsResult<std::result::Result<Filled, String>> {
    let numeric = is_numeric_dtype(series.dtype());

    let filled = match method {
        FillMethod::Mean | FillMethod::Median => {
            if !numeric {
                return Ok(Err(format!("{} fill requires a numeric column", method)));
            }
            let values = numeric_values(series)?;
            let value = match method {
                FillMethod::Mean => calculate_mean(&values),
                _ => quantile_sorted(&sorted_copy(&values), 0.5),
            };
            match value {
                Some(value) => (fill_numeric(series, value)?, None),
                None => return Ok(Err("no values to compute from".to_string())),
            }
        }
        FillMethod::Mode => match mode_value(series)? {
            Some(value) => fill_literal(series, &value)?,
            None => return Ok(Err("no values to compute from".to_string())),
        },
        FillMethod::ForwardFill => (series.fill_null(FillNullStrategy::Forward(None))?, None),
        FillMethod::BackwardFill => (series.fill_null(FillNullStrategy::Backward(None))?, None),
        FillMethod::Constant(value) => {
            if numeric && parse_numeric_string(value).is_none() {
                return Ok(Err(format!(
                    "'{}' is not a number and the column is numeric",
                    value
                )));
            }
            fill_literal(series, value)?
        }
    };

    Ok(Ok(filled))
}

/// Most frequent non-missing value, rendered as a string. Ties go to the value
/// encountered first.
pub(crate) fn mode_value(series: &Series) -> PolarsResult<Option<String>> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for value in series_to_strings(series)?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(String, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().is_none_or(|(_, best_count)| count > *best_count) {
            best = Some((value, count));
        }
    }
    Ok(best.map(|(value, _)| value))
}

/// Fill a numeric column, keeping integer columns integral when possible.
fn fill_numeric(series: &Series, value: f64) -> PolarsResult<Series> {
    let filled = fill_numeric_nulls(series, value)?;
    if series.dtype().is_integer() && value.fract() == 0.0 {
        filled.cast(series.dtype())
    } else {
        Ok(filled)
    }
}

fn parse_bool(literal: &str) -> Option<bool> {
    match literal.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Fill with a literal given as text, converted to the column's type.
///
/// When the literal cannot be expressed in the column's type the column
/// becomes text and the returned note says so.
fn fill_literal(series: &Series, literal: &str) -> PolarsResult<Filled> {
    if is_numeric_dtype(series.dtype()) {
        return Ok(match parse_numeric_string(literal) {
            Some(value) => (fill_numeric(series, value)?, None),
            None => (series.clone(), None),
        });
    }

    if series.dtype() == &DataType::Boolean
        && let Some(value) = parse_bool(literal)
    {
        let filled = series.bool()?.fill_null_with_values(value)?.into_series();
        return Ok((filled, None));
    }

    let filled = fill_string_nulls(series, literal)?;
    if is_string_dtype(series.dtype()) {
        return Ok((filled, None));
    }

    // A null that survives the cast back means the literal did not fit.
    match filled.cast(series.dtype()) {
        Ok(restored) if restored.null_count() == 0 => Ok((restored, None)),
        _ => {
            debug!("Cast back to {} failed for '{}'", series.dtype(), series.name());
            let note = format!(
                "Column '{}' changed from {} to text: '{}' is not a {} value",
                series.name(),
                series.dtype(),
                literal,
                series.dtype()
            );
            Ok((filled, Some(note)))
        }
    }
}
