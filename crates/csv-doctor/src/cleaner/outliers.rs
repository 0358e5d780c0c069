//! Outlier removal for numeric columns.

use super::{OpOutcome, resolve_columns};
use crate::config::{CleaningConfig, InferenceConfig};
use crate::error::{DoctorError, Result};
use crate::profiler::infer_column_type;
use crate::profiler::statistics::{calculate_mean, calculate_population_std, calculate_quartiles};
use crate::types::{ChangeLogEntry, ColumnType};
use crate::utils::series_to_f64;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Outlier detection rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Outside `[Q1 - k*IQR, Q3 + k*IQR]`.
    Iqr { multiplier: f64 },
    /// `|z| > threshold` with the population standard deviation.
    ZScore { threshold: f64 },
}

impl Default for OutlierMethod {
    fn default() -> Self {
        OutlierMethod::Iqr { multiplier: 1.5 }
    }
}

impl OutlierMethod {
    /// IQR rule with the configured multiplier.
    pub fn iqr(config: &CleaningConfig) -> Self {
        OutlierMethod::Iqr {
            multiplier: config.iqr_multiplier,
        }
    }

    /// Z-score rule with the configured threshold.
    pub fn zscore(config: &CleaningConfig) -> Self {
        OutlierMethod::ZScore {
            threshold: config.zscore_threshold,
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierMethod::Iqr { multiplier } => write!(f, "IQR (k = {})", multiplier),
            OutlierMethod::ZScore { threshold } => write!(f, "z-score (|z| > {})", threshold),
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = DoctorError;

    /// Parses `iqr`, `iqr=2.0`, `zscore` or `zscore=2.5`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, param) = match s.trim().split_once('=') {
            Some((name, param)) => (name, Some(param)),
            None => (s.trim(), None),
        };
        let param = param
            .map(|p| {
                p.trim().parse::<f64>().map_err(|_| {
                    DoctorError::InvalidOperation(format!("invalid outlier parameter '{}'", p))
                })
            })
            .transpose()?;

        let defaults = CleaningConfig::default();
        match name.to_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr {
                multiplier: param.unwrap_or(defaults.iqr_multiplier),
            }),
            "zscore" | "z_score" | "z" => Ok(OutlierMethod::ZScore {
                threshold: param.unwrap_or(defaults.zscore_threshold),
            }),
            other => Err(DoctorError::InvalidOperation(format!(
                "unknown outlier method '{}' (expected iqr or zscore)",
                other
            ))),
        }
    }
}

/// Per-column rule computed once from the input table.
#[derive(Debug, Clone, Copy)]
enum Bounds {
    Range { lower: f64, upper: f64 },
    ZScore { mean: f64, std: f64, threshold: f64 },
}

impl Bounds {
    fn compute(values: &[f64], method: OutlierMethod) -> Option<Self> {
        match method {
            OutlierMethod::Iqr { multiplier } => {
                let (q1, _, q3) = calculate_quartiles(values)?;
                let iqr = q3 - q1;
                Some(Bounds::Range {
                    lower: q1 - multiplier * iqr,
                    upper: q3 + multiplier * iqr,
                })
            }
            OutlierMethod::ZScore { threshold } => {
                let mean = calculate_mean(values)?;
                let std = calculate_population_std(values)?;
                // Constant columns have no outliers.
                (std > 0.0).then_some(Bounds::ZScore {
                    mean,
                    std,
                    threshold,
                })
            }
        }
    }

    fn is_outlier(&self, value: f64) -> bool {
        match *self {
            Bounds::Range { lower, upper } => value < lower || value > upper,
            Bounds::ZScore {
                mean,
                std,
                threshold,
            } => ((value - mean) / std).abs() > threshold,
        }
    }
}

/// Drop rows that are outliers in any of the target columns.
///
/// With no column list, every column inferred as numeric is checked. Bounds
/// for all columns come from the input table, so the order of columns does
/// not matter. Missing cells are never outliers.
pub fn remove_outliers(
    df: &DataFrame,
    method: OutlierMethod,
    columns: Option<&[String]>,
    inference: &InferenceConfig,
) -> Result<OpOutcome> {
    const OP: &str = "remove_outliers";

    let is_numeric = |s: &Series| {
        matches!(infer_column_type(s, inference), Ok(ColumnType::Numeric))
    };
    let (targets, missing) = resolve_columns(df, columns, OP, is_numeric);
    let mut warnings: Vec<ChangeLogEntry> = missing.into_iter().collect();

    let mut keep = vec![true; df.height()];
    let mut columns_with_outliers = 0;

    for name in &targets {
        let series = df.column(name)?.as_materialized_series();
        if infer_column_type(series, inference)? != ColumnType::Numeric {
            warnings.push(ChangeLogEntry::warning(
                OP,
                format!("Column '{}' is not numeric; skipped", name),
            ));
            continue;
        }

        let cells = series_to_f64(series)?;
        let values: Vec<f64> = cells.iter().flatten().copied().collect();
        let Some(bounds) = Bounds::compute(&values, method) else {
            continue;
        };

        let mut flagged = 0;
        for (flag, cell) in keep.iter_mut().zip(&cells) {
            if let Some(value) = cell
                && bounds.is_outlier(*value)
            {
                *flag = false;
                flagged += 1;
            }
        }
        if flagged > 0 {
            columns_with_outliers += 1;
            debug!("{} outliers in '{}' ({:?})", flagged, name, bounds);
        }
    }

    let removed = keep.iter().filter(|k| !**k).count();
    let summary = if removed == 0 {
        ChangeLogEntry::no_op(OP, format!("No outliers found using {}", method))
    } else {
        info!("Removed {} outlier rows using {}", removed, method);
        ChangeLogEntry::applied(
            OP,
            format!(
                "Removed {} rows with outliers in {} columns using {}",
                removed, columns_with_outliers, method
            ),
        )
        .with_rows(removed)
        .with_columns(columns_with_outliers)
    };

    let table = if removed == 0 {
        df.clone()
    } else {
        df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?
    };

    let mut entries = vec![summary];
    entries.extend(warnings);
    Ok(OpOutcome::new(table, entries))
}
