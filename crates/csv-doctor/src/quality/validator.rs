//! Read-only quality checks over a table.

use super::score::compute_quality_score;
use crate::config::DoctorConfig;
use crate::error::Result;
use crate::profiler::statistics::{calculate_mean, calculate_std};
use crate::profiler::{infer_column_type, value_conforms};
use crate::types::{
    AnomalyKind, AnomalyRecord, ColumnNullStats, ColumnType, ColumnTypeInfo, DuplicateReport,
    MalformedRows, NullDistribution, QualityScore, SchemaValidation, ValidationReport,
};
use crate::utils::{
    column_names, is_datetime_dtype, is_numeric_dtype, is_string_dtype, is_numeric_string,
    numeric_values, percentage, row_keys, series_to_strings,
};
use indexmap::IndexMap;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Missing-value counts per column and overall.
pub fn null_distribution(df: &DataFrame) -> NullDistribution {
    let rows = df.height();
    let columns: Vec<ColumnNullStats> = df
        .get_columns()
        .iter()
        .map(|col| {
            let null_count = col.null_count();
            ColumnNullStats {
                column: col.name().to_string(),
                null_count,
                null_percentage: percentage(null_count, rows),
                non_null_count: rows - null_count,
            }
        })
        .collect();

    let total_null_count = columns.iter().map(|c| c.null_count).sum();
    let total_cells = rows * df.width();

    NullDistribution {
        columns,
        total_null_count,
        total_cells,
        total_null_percentage: percentage(total_null_count, total_cells),
    }
}

/// Rows equal (on every column) to an earlier row.
pub fn find_duplicate_rows(df: &DataFrame) -> Result<Vec<usize>> {
    if df.width() == 0 {
        return Ok(Vec::new());
    }
    let mut seen = HashSet::with_capacity(df.height());
    Ok(row_keys(df, &column_names(df))?
        .into_iter()
        .enumerate()
        .filter_map(|(idx, key)| (!seen.insert(key)).then_some(idx))
        .collect())
}

/// Validator over a table: every method is read-only.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: DoctorConfig,
}

impl Validator {
    pub fn new(config: DoctorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DoctorConfig {
        &self.config
    }

    pub fn null_distribution(&self, df: &DataFrame) -> NullDistribution {
        null_distribution(df)
    }

    /// Count rows that repeat an earlier row.
    pub fn detect_duplicates(&self, df: &DataFrame) -> Result<DuplicateReport> {
        let duplicates = find_duplicate_rows(df)?;
        Ok(DuplicateReport {
            duplicate_count: duplicates.len(),
            duplicate_percentage: percentage(duplicates.len(), df.height()),
            sample_rows: duplicates
                .into_iter()
                .take(self.config.quality.sample_rows)
                .collect(),
        })
    }

    /// Rows with a missing cell, or with a value that fails to parse in a
    /// text column that is otherwise numeric.
    pub fn detect_malformed_rows(&self, df: &DataFrame) -> Result<MalformedRows> {
        let rows = df.height();
        let mut has_missing = vec![false; rows];
        let mut has_bad_number = vec![false; rows];

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let nulls = series.is_null();
            for (flag, is_null) in has_missing.iter_mut().zip(nulls.into_iter()) {
                if is_null.unwrap_or(false) {
                    *flag = true;
                }
            }

            // Native numeric columns cannot hold unparseable values.
            if is_string_dtype(series.dtype())
                && infer_column_type(series, &self.config.inference)? == ColumnType::Numeric
            {
                for (flag, value) in has_bad_number.iter_mut().zip(series.str()?.into_iter()) {
                    if let Some(value) = value
                        && !is_numeric_string(value)
                    {
                        *flag = true;
                    }
                }
            }
        }

        let malformed: Vec<usize> = (0..rows)
            .filter(|&i| has_missing[i] || has_bad_number[i])
            .collect();

        Ok(MalformedRows {
            count: malformed.len(),
            rows_with_missing: has_missing.iter().filter(|f| **f).count(),
            rows_with_unparseable_numbers: has_bad_number.iter().filter(|f| **f).count(),
            sample_rows: malformed
                .into_iter()
                .take(self.config.quality.sample_rows)
                .collect(),
        })
    }

    /// Physical dtype, inferred type and conformance of every column.
    pub fn column_type_report(&self, df: &DataFrame) -> Result<Vec<ColumnTypeInfo>> {
        let rows = df.height();
        df.get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                let inferred_type = infer_column_type(series, &self.config.inference)?;
                let values: Vec<String> = series_to_strings(series)?.into_iter().flatten().collect();
                let distinct_count = values.iter().collect::<HashSet<_>>().len();

                let native = match inferred_type {
                    ColumnType::Numeric => is_numeric_dtype(series.dtype()),
                    ColumnType::Datetime => is_datetime_dtype(series.dtype()),
                    _ => true,
                };
                let conforming_ratio = if values.is_empty() || native {
                    1.0
                } else {
                    let conforming = values
                        .iter()
                        .filter(|v| value_conforms(v, inferred_type))
                        .count();
                    conforming as f64 / values.len() as f64
                };

                Ok(ColumnTypeInfo {
                    column: series.name().to_string(),
                    dtype: series.dtype().to_string(),
                    inferred_type,
                    distinct_count,
                    null_count: series.null_count(),
                    null_percentage: percentage(series.null_count(), rows),
                    conforming_ratio,
                })
            })
            .collect()
    }

    /// Average conformance across columns, as a percentage. 100 for a table
    /// without columns.
    pub fn type_consistency(&self, df: &DataFrame) -> Result<f64> {
        let report = self.column_type_report(df)?;
        Ok(type_consistency_from(&report))
    }

    /// Flag constant, mostly-missing, near-constant and single-value-dominated columns.
    pub fn detect_anomalies(&self, df: &DataFrame) -> Result<Vec<AnomalyRecord>> {
        let cfg = &self.config.quality;
        let rows = df.height();
        let mut anomalies = Vec::new();

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let name = series.name().to_string();
            let null_count = series.null_count();
            let null_pct = percentage(null_count, rows);

            let mut counts: IndexMap<String, usize> = IndexMap::new();
            for value in series_to_strings(series)?.into_iter().flatten() {
                *counts.entry(value).or_insert(0) += 1;
            }
            let non_null = rows - null_count;
            let is_constant = counts.len() == 1 && rows >= 2;

            if is_constant {
                anomalies.push(AnomalyRecord {
                    kind: AnomalyKind::ConstantColumn,
                    message: format!("Column '{}' has a single distinct value", name),
                    columns: vec![name.clone()],
                });
            }

            if null_pct > cfg.high_null_percentage {
                anomalies.push(AnomalyRecord {
                    kind: AnomalyKind::HighNullPercentage,
                    message: format!("Column '{}' is {:.1}% missing", name, null_pct),
                    columns: vec![name.clone()],
                });
            }

            let inferred = infer_column_type(series, &self.config.inference)?;

            if inferred == ColumnType::Numeric && !is_constant {
                let values = numeric_values(series)?;
                if let (Some(mean), Some(std)) = (calculate_mean(&values), calculate_std(&values)) {
                    let near_zero = if mean.abs() < cfg.mean_epsilon {
                        std < cfg.variance_epsilon
                    } else {
                        std / mean.abs() < cfg.variance_epsilon
                    };
                    if near_zero {
                        anomalies.push(AnomalyRecord {
                            kind: AnomalyKind::NearZeroVariance,
                            message: format!(
                                "Column '{}' has near-zero variance (std {:.3e}, mean {:.3e})",
                                name, std, mean
                            ),
                            columns: vec![name.clone()],
                        });
                    }
                }
            }

            if inferred != ColumnType::Categorical && !is_constant && non_null >= 2 {
                // Ties go to the first value seen.
                let top = counts
                    .iter()
                    .fold(None::<(&String, usize)>, |best, (value, &count)| match best {
                        Some((_, best_count)) if best_count >= count => best,
                        _ => Some((value, count)),
                    });
                if let Some((value, count)) = top {
                    let share = count as f64 / non_null as f64;
                    if share > cfg.dominant_value_share {
                        anomalies.push(AnomalyRecord {
                            kind: AnomalyKind::DominantValue,
                            message: format!(
                                "Value '{}' makes up {:.1}% of column '{}'",
                                value,
                                share * 100.0,
                                name
                            ),
                            columns: vec![name.clone()],
                        });
                    }
                }
            }
        }

        debug!("Detected {} anomalies", anomalies.len());
        Ok(anomalies)
    }

    /// Composite quality score of the table.
    pub fn quality_score(&self, df: &DataFrame) -> Result<QualityScore> {
        Ok(self.validate(df)?.quality_score)
    }

    /// Check that every expected column exists with a compatible type.
    ///
    /// Numeric expects a numeric dtype and text or categorical expect a
    /// string dtype. Datetime accepts a temporal dtype or a text column whose
    /// values read as dates.
    pub fn validate_schema(
        &self,
        df: &DataFrame,
        schema: &IndexMap<String, ColumnType>,
    ) -> Result<SchemaValidation> {
        let present: HashSet<String> = column_names(df).into_iter().collect();
        let missing_columns: Vec<String> = schema
            .keys()
            .filter(|name| !present.contains(*name))
            .cloned()
            .collect();

        let mut errors = Vec::new();
        if !missing_columns.is_empty() {
            errors.push(format!("Missing columns: {}", missing_columns.join(", ")));
        }

        let mut warnings = Vec::new();
        for (name, expected) in schema {
            let Ok(col) = df.column(name) else {
                continue;
            };
            let series = col.as_materialized_series();
            let dtype = series.dtype();
            let compatible = match expected {
                ColumnType::Numeric => is_numeric_dtype(dtype),
                ColumnType::Text | ColumnType::Categorical => is_string_dtype(dtype),
                ColumnType::Datetime => {
                    is_datetime_dtype(dtype)
                        || (is_string_dtype(dtype)
                            && infer_column_type(series, &self.config.inference)?
                                == ColumnType::Datetime)
                }
            };
            if !compatible {
                warnings.push(format!(
                    "Column '{}' expected {} but got {}",
                    name, expected, dtype
                ));
            }
        }

        debug!(
            "Schema check: {} missing columns, {} type warnings",
            missing_columns.len(),
            warnings.len()
        );
        Ok(SchemaValidation {
            valid: missing_columns.is_empty(),
            missing_columns,
            errors,
            warnings,
        })
    }

    /// Run every check and bundle the results.
    pub fn validate(&self, df: &DataFrame) -> Result<ValidationReport> {
        let null_distribution = null_distribution(df);
        let duplicates = self.detect_duplicates(df)?;
        let malformed_rows = self.detect_malformed_rows(df)?;
        let column_types = self.column_type_report(df)?;
        let anomalies = self.detect_anomalies(df)?;

        let quality_score = compute_quality_score(
            &null_distribution,
            &duplicates,
            type_consistency_from(&column_types),
            &anomalies,
            &self.config.quality,
        );

        info!(
            "Validated {} x {} table: quality score {:.1}, {} anomalies",
            df.height(),
            df.width(),
            quality_score.overall,
            anomalies.len()
        );

        Ok(ValidationReport {
            rows: df.height(),
            columns: df.width(),
            null_distribution,
            column_types,
            duplicates,
            malformed_rows,
            anomalies,
            quality_score,
        })
    }
}

fn type_consistency_from(report: &[ColumnTypeInfo]) -> f64 {
    if report.is_empty() {
        return 100.0;
    }
    report.iter().map(|c| c.conforming_ratio).sum::<f64>() / report.len() as f64 * 100.0
}
