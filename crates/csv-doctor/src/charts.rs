//! Chart data.
//!
//! Structured inputs for an external chart renderer. Nothing here draws; each
//! function returns the numbers a plot of that kind is made from:
//! - Missing-value matrix over the leading rows, and missing counts per column
//! - Equal-width histograms for numeric columns
//! - Top-value bar data for categorical columns
//! - Box plot five-number summaries with outliers
//! - Scatter points for a pair of columns
//! - Column dtype distribution
//! - Correlation heatmap (the analyzer's matrix)

use crate::analysis::{Analyzer, frequency_of, top_values};
use crate::config::DoctorConfig;
use crate::error::{DoctorError, Result};
use crate::profiler::infer_column_type;
use crate::profiler::statistics::{quantile_sorted, sorted_copy};
use crate::types::{ColumnType, CorrelationMatrix, FrequencyEntry};
use crate::utils::{column_names, numeric_values, percentage, series_to_f64};
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whisker reach of box plots, in interquartile ranges.
const WHISKER_IQR: f64 = 1.5;

/// Null mask of the leading rows; `cells[row][column]` is true when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingMatrix {
    pub columns: Vec<String>,
    pub total_rows: usize,
    pub cells: Vec<Vec<bool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
    pub percentage: f64,
}

/// Half-open bin `[lower, upper)`; the last bin also includes `upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<HistogramBin>,
    /// Cells left out because they are missing or not numeric.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub column: String,
    pub bars: Vec<FrequencyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlot {
    pub column: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterData {
    pub x_column: String,
    pub y_column: String,
    /// Rows where both cells are numeric.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCount {
    pub dtype: String,
    pub count: usize,
}

/// Everything the dashboard charts of one table are drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub missing_matrix: MissingMatrix,
    pub missing_counts: Vec<MissingCount>,
    pub histograms: Vec<Histogram>,
    pub box_plots: Vec<BoxPlot>,
    pub bar_charts: Vec<BarChart>,
    pub type_distribution: Vec<TypeCount>,
    pub correlation_heatmap: CorrelationMatrix,
}

/// Null mask of the first `max_rows` rows.
pub fn missing_matrix(df: &DataFrame, max_rows: usize) -> MissingMatrix {
    let shown = df.height().min(max_rows);
    let masks: Vec<Vec<bool>> = df
        .get_columns()
        .iter()
        .map(|col| {
            col.as_materialized_series()
                .is_null()
                .into_iter()
                .take(shown)
                .map(|v| v.unwrap_or(false))
                .collect()
        })
        .collect();

    MissingMatrix {
        columns: column_names(df),
        total_rows: df.height(),
        cells: (0..shown)
            .map(|row| masks.iter().map(|col| col[row]).collect())
            .collect(),
    }
}

/// Missing cells per column, in column order.
pub fn missing_counts(df: &DataFrame) -> Vec<MissingCount> {
    df.get_columns()
        .iter()
        .map(|col| MissingCount {
            column: col.name().to_string(),
            missing: col.null_count(),
            percentage: percentage(col.null_count(), df.height()),
        })
        .collect()
}

/// Equal-width bins spanning the values.
///
/// When every value is the same, the bins span one unit centered on it.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}

/// Histogram of a column's numeric values.
pub fn histogram(series: &Series, bins: usize) -> PolarsResult<Histogram> {
    let values = numeric_values(series)?;
    Ok(Histogram {
        column: series.name().to_string(),
        bins: histogram_bins(&values, bins),
        skipped: series.len() - values.len(),
    })
}

/// The `top` most frequent values of a column.
pub fn bar_chart(series: &Series, top: usize) -> PolarsResult<BarChart> {
    let distribution = frequency_of(series)?;
    Ok(BarChart {
        column: series.name().to_string(),
        bars: top_values(&distribution, top),
    })
}

/// Box plot summary, or `None` when the column has no numeric values.
pub fn box_plot(series: &Series) -> PolarsResult<Option<BoxPlot>> {
    let sorted = sorted_copy(&numeric_values(series)?);
    let (Some(q1), Some(median), Some(q3)) = (
        quantile_sorted(&sorted, 0.25),
        quantile_sorted(&sorted, 0.5),
        quantile_sorted(&sorted, 0.75),
    ) else {
        return Ok(None);
    };

    let iqr = q3 - q1;
    let (low_fence, high_fence) = (q1 - WHISKER_IQR * iqr, q3 + WHISKER_IQR * iqr);
    let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .copied()
        .partition(|v| *v >= low_fence && *v <= high_fence);

    Ok(Some(BoxPlot {
        column: series.name().to_string(),
        q1,
        median,
        q3,
        lower_whisker: inside.first().copied().unwrap_or(q1),
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers,
    }))
}

/// Paired numeric values of two columns.
pub fn scatter(df: &DataFrame, x: &str, y: &str) -> Result<ScatterData> {
    let get = |name: &str| -> Result<Vec<Option<f64>>> {
        let col = df
            .column(name)
            .map_err(|_| DoctorError::ColumnNotFound(name.to_string()))?;
        Ok(series_to_f64(col.as_materialized_series())?)
    };
    let (xs, ys) = (get(x)?, get(y)?);

    Ok(ScatterData {
        x_column: x.to_string(),
        y_column: y.to_string(),
        points: xs
            .into_iter()
            .zip(ys)
            .filter_map(|(a, b)| Some((a?, b?)))
            .collect(),
    })
}

/// Number of columns per physical dtype, most common first.
pub fn type_distribution(df: &DataFrame) -> Vec<TypeCount> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for col in df.get_columns() {
        *counts.entry(col.dtype().to_string()).or_insert(0) += 1;
    }

    let mut out: Vec<TypeCount> = counts
        .into_iter()
        .map(|(dtype, count)| TypeCount { dtype, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Build all chart data for a table.
///
/// Histograms and box plots cover the columns inferred as numeric; bar
/// charts cover the categorical ones.
pub fn chart_data(df: &DataFrame, config: &DoctorConfig) -> Result<ChartData> {
    let analysis = &config.analysis;
    let mut histograms = Vec::new();
    let mut box_plots = Vec::new();
    let mut bar_charts = Vec::new();

    for col in df.get_columns() {
        let series = col.as_materialized_series();
        match infer_column_type(series, &config.inference)? {
            ColumnType::Numeric => {
                histograms.push(histogram(series, analysis.histogram_bins)?);
                if let Some(plot) = box_plot(series)? {
                    box_plots.push(plot);
                }
            }
            ColumnType::Categorical => {
                bar_charts.push(bar_chart(series, analysis.bar_chart_top)?);
            }
            ColumnType::Datetime | ColumnType::Text => {}
        }
    }

    debug!(
        "Chart data: {} histograms, {} bar charts",
        histograms.len(),
        bar_charts.len()
    );

    Ok(ChartData {
        missing_matrix: missing_matrix(df, analysis.heatmap_rows),
        missing_counts: missing_counts(df),
        histograms,
        box_plots,
        bar_charts,
        type_distribution: type_distribution(df),
        correlation_heatmap: Analyzer::new(config.clone()).correlation_matrix(df)?,
    })
}
