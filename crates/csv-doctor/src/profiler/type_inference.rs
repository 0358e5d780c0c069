//! Type inference logic for column analysis.

use crate::config::InferenceConfig;
use crate::types::ColumnType;
use crate::utils::{
    is_datetime_dtype, is_datetime_string, is_numeric_dtype, is_numeric_string, series_to_strings,
};
use polars::prelude::*;
use std::collections::HashSet;

/// Infer the semantic type of a column from its values.
///
/// Rules, in order:
/// 1. No non-missing values: text.
/// 2. Native numeric or date dtypes map directly.
/// 3. At least `numeric_threshold` of the values parse as numbers: numeric.
/// 4. At least `datetime_threshold` of the values parse as dates: datetime.
/// 5. Low-cardinality values: categorical.
/// 6. Otherwise: text.
pub fn infer_column_type(series: &Series, config: &InferenceConfig) -> PolarsResult<ColumnType> {
    let non_missing = series.len() - series.null_count();
    if non_missing == 0 {
        return Ok(ColumnType::Text);
    }

    if is_numeric_dtype(series.dtype()) {
        return Ok(ColumnType::Numeric);
    }
    if is_datetime_dtype(series.dtype()) {
        return Ok(ColumnType::Datetime);
    }

    let values: Vec<String> = series_to_strings(series)?.into_iter().flatten().collect();
    Ok(infer_from_values(&values, config))
}

/// Infer a type from non-missing string values.
pub(crate) fn infer_from_values(values: &[String], config: &InferenceConfig) -> ColumnType {
    let total = values.len();
    if total == 0 {
        return ColumnType::Text;
    }

    let numeric = values.iter().filter(|v| is_numeric_string(v)).count();
    if numeric as f64 / total as f64 >= config.numeric_threshold {
        return ColumnType::Numeric;
    }

    let dates = values.iter().filter(|v| is_datetime_string(v)).count();
    if dates as f64 / total as f64 >= config.datetime_threshold {
        return ColumnType::Datetime;
    }

    let distinct = values.iter().collect::<HashSet<_>>().len();
    if is_categorical(distinct, total, config) {
        ColumnType::Categorical
    } else {
        ColumnType::Text
    }
}

fn is_categorical(distinct: usize, non_missing: usize, config: &InferenceConfig) -> bool {
    if distinct == 1 {
        return true;
    }
    if distinct > config.max_categories {
        return false;
    }

    let ratio = distinct as f64 / non_missing as f64;
    let small_repeated_vocabulary =
        distinct < config.low_cardinality_floor && distinct < non_missing;

    ratio < config.categorical_ratio || small_repeated_vocabulary
}

/// Infer the type of every column, in column order.
pub fn infer_table_types(
    df: &DataFrame,
    config: &InferenceConfig,
) -> PolarsResult<Vec<(String, ColumnType)>> {
    df.get_columns()
        .iter()
        .map(|col| -> PolarsResult<(String, ColumnType)> {
            let series = col.as_materialized_series();
            Ok((series.name().to_string(), infer_column_type(series, config)?))
        })
        .collect()
}

/// Check whether one non-missing value conforms to a column type.
///
/// Categorical and text columns accept any value.
pub fn value_conforms(value: &str, column_type: ColumnType) -> bool {
    match column_type {
        ColumnType::Numeric => is_numeric_string(value),
        ColumnType::Datetime => is_datetime_string(value),
        ColumnType::Categorical | ColumnType::Text => true,
    }
}
