//! Descriptive analysis module.
//!
//! Read-only summaries of a table: per-column statistics, pairwise
//! correlations, value frequencies, per-column insights, a dataset overview
//! and categorical summaries. Quantities that are undefined for the data are
//! reported as explicit markers (`NumericSummary::Unavailable`, NaN) rather
//! than errors.

mod correlation;
mod frequency;

pub use correlation::{correlation_matrix, high_correlations};
pub use frequency::{frequency_of, top_values};

use crate::config::DoctorConfig;
use crate::error::{DoctorError, Result};
use crate::profiler::infer_column_type;
use crate::profiler::statistics::summarize;
use crate::quality::{find_duplicate_rows, null_distribution};
use crate::types::{
    AnalysisReport, CategoricalSummary, ColumnInsight, ColumnSummary, ColumnType,
    CorrelatedPair, CorrelationMatrix, DatasetOverview, FrequencyDistribution, FrequencyKey,
    NumericSummary,
};
use crate::utils::{numeric_values, percentage, series_to_f64};
use polars::prelude::*;
use tracing::{debug, info};

/// Analyzer over a table.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: DoctorConfig,
}

impl Analyzer {
    pub fn new(config: DoctorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DoctorConfig {
        &self.config
    }

    fn column_type(&self, series: &Series) -> Result<ColumnType> {
        Ok(infer_column_type(series, &self.config.inference)?)
    }

    /// Series of the columns inferred as the given type, in column order.
    fn columns_of_type<'a>(&self, df: &'a DataFrame, wanted: ColumnType) -> Result<Vec<&'a Series>> {
        let mut out = Vec::new();
        for col in df.get_columns() {
            let series = col.as_materialized_series();
            if self.column_type(series)? == wanted {
                out.push(series);
            }
        }
        Ok(out)
    }

    /// Summary statistics for every numeric column.
    pub fn summary_stats(&self, df: &DataFrame) -> Result<Vec<ColumnSummary>> {
        self.columns_of_type(df, ColumnType::Numeric)?
            .into_iter()
            .map(|series| {
                Ok(ColumnSummary {
                    column: series.name().to_string(),
                    summary: summarize(&numeric_values(series)?),
                })
            })
            .collect()
    }

    /// Pairwise-complete Pearson correlations between numeric columns.
    pub fn correlation_matrix(&self, df: &DataFrame) -> Result<CorrelationMatrix> {
        let columns = self
            .columns_of_type(df, ColumnType::Numeric)?
            .into_iter()
            .map(|series| Ok((series.name().to_string(), series_to_f64(series)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(correlation_matrix(&columns))
    }

    /// Pairs whose correlation magnitude reaches the configured threshold.
    pub fn high_correlations(&self, df: &DataFrame) -> Result<Vec<CorrelatedPair>> {
        let matrix = self.correlation_matrix(df)?;
        Ok(high_correlations(
            &matrix,
            self.config.analysis.correlation_threshold,
        ))
    }

    /// Value counts of one column.
    pub fn frequency_distribution(&self, df: &DataFrame, column: &str) -> Result<FrequencyDistribution> {
        let series = df
            .column(column)
            .map_err(|_| DoctorError::ColumnNotFound(column.to_string()))?
            .as_materialized_series();
        Ok(frequency_of(series)?)
    }

    /// Type, completeness and either statistics or top values of one column.
    pub fn column_insights(&self, df: &DataFrame, column: &str) -> Result<ColumnInsight> {
        let series = df
            .column(column)
            .map_err(|_| DoctorError::ColumnNotFound(column.to_string()))?
            .as_materialized_series();
        let inferred_type = self.column_type(series)?;
        let distribution = frequency_of(series)?;
        let null_count = series.null_count();
        let distinct_count = distribution
            .entries
            .iter()
            .filter(|e| e.key != FrequencyKey::Missing)
            .count();

        let numeric = match inferred_type {
            ColumnType::Numeric => Some(summarize(&numeric_values(series)?)),
            _ => None,
        };
        let top = match inferred_type {
            ColumnType::Categorical => Some(top_values(&distribution, self.config.analysis.top_values)),
            _ => None,
        };

        Ok(ColumnInsight {
            column: column.to_string(),
            dtype: series.dtype().to_string(),
            inferred_type,
            total_values: series.len(),
            null_count,
            null_percentage: percentage(null_count, series.len()),
            distinct_count,
            numeric,
            top_values: top,
        })
    }

    /// Shape, completeness, duplicates, memory and column-type counts.
    pub fn overview(&self, df: &DataFrame) -> Result<DatasetOverview> {
        let nulls = null_distribution(df);
        let duplicate_rows = find_duplicate_rows(df)?.len();

        let (mut numeric, mut categorical, mut datetime, mut text) = (0, 0, 0, 0);
        for col in df.get_columns() {
            match self.column_type(col.as_materialized_series())? {
                ColumnType::Numeric => numeric += 1,
                ColumnType::Categorical => categorical += 1,
                ColumnType::Datetime => datetime += 1,
                ColumnType::Text => text += 1,
            }
        }

        Ok(DatasetOverview {
            rows: df.height(),
            columns: df.width(),
            total_cells: nulls.total_cells,
            null_cells: nulls.total_null_count,
            null_percentage: nulls.total_null_percentage,
            duplicate_rows,
            estimated_bytes: df.estimated_size(),
            numeric_columns: numeric,
            categorical_columns: categorical,
            datetime_columns: datetime,
            text_columns: text,
            column_names: crate::utils::column_names(df),
        })
    }

    /// Distinct count, top value and most common values of each categorical column.
    pub fn categorical_summary(&self, df: &DataFrame) -> Result<Vec<CategoricalSummary>> {
        self.columns_of_type(df, ColumnType::Categorical)?
            .into_iter()
            .map(|series| {
                let distribution = frequency_of(series)?;
                let most_common = top_values(&distribution, self.config.analysis.top_values);
                let distinct_count = distribution
                    .entries
                    .iter()
                    .filter(|e| e.key != FrequencyKey::Missing)
                    .count();
                let (top_value, top_count) = most_common
                    .first()
                    .map(|e| (Some(e.key.to_string()), e.count))
                    .unwrap_or((None, 0));

                Ok(CategoricalSummary {
                    column: series.name().to_string(),
                    distinct_count,
                    top_value,
                    top_count,
                    null_count: distribution.missing_count(),
                    most_common,
                })
            })
            .collect()
    }

    /// Run every analysis and bundle the results.
    pub fn analyze(&self, df: &DataFrame) -> Result<AnalysisReport> {
        let overview = self.overview(df)?;
        let summary_stats = self.summary_stats(df)?;
        let correlation_matrix = self.correlation_matrix(df)?;
        let high_correlations = high_correlations(
            &correlation_matrix,
            self.config.analysis.correlation_threshold,
        );
        let categorical_summary = self.categorical_summary(df)?;

        let unavailable = summary_stats
            .iter()
            .filter(|s| matches!(s.summary, NumericSummary::Unavailable { .. }))
            .count();
        debug!("{} numeric columns without enough values for statistics", unavailable);
        info!(
            "Analyzed {} x {} table: {} numeric columns, {} strong correlations",
            df.height(),
            df.width(),
            summary_stats.len(),
            high_correlations.len()
        );

        Ok(AnalysisReport {
            overview,
            summary_stats,
            null_distribution: null_distribution(df),
            correlation_matrix,
            high_correlations,
            categorical_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new("x".into(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            Column::new("y".into(), &[2.0, 4.1, 5.9, 8.0, 10.2, 11.9]),
            Column::new("z".into(), &[Some(5.0), None, Some(1.0), Some(4.0), Some(2.0), Some(3.0)]),
            Column::new("group".into(), &["a", "b", "a", "a", "b", "a"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_summary_stats_numeric_only() {
        let stats = Analyzer::default().summary_stats(&sample_df()).unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(stats[2].summary.stats().unwrap().count, 5);
    }

    #[test]
    fn test_summary_single_value_unavailable() {
        let df = DataFrame::new(vec![Column::new("n".into(), &[Some(1.0), None])]).unwrap();
        let stats = Analyzer::default().summary_stats(&df).unwrap();
        assert!(!stats[0].summary.is_available());
    }

    #[test]
    fn test_high_correlations_found() {
        let pairs = Analyzer::default().high_correlations(&sample_df()).unwrap();
        assert_eq!(pairs[0].first, "x");
        assert_eq!(pairs[0].second, "y");
        assert!(pairs[0].coefficient > 0.99);
    }

    #[test]
    fn test_frequency_distribution_unknown_column() {
        let err = Analyzer::default()
            .frequency_distribution(&sample_df(), "nope")
            .unwrap_err();
        assert!(matches!(err, DoctorError::ColumnNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_frequency_counts_sum_to_rows() {
        let df = sample_df();
        let dist = Analyzer::default().frequency_distribution(&df, "z").unwrap();
        let total: usize = dist.entries.iter().map(|e| e.count).sum();
        assert_eq!(total, df.height());
    }

    #[test]
    fn test_column_insights_categorical() {
        let insight = Analyzer::default()
            .column_insights(&sample_df(), "group")
            .unwrap();
        assert_eq!(insight.inferred_type, ColumnType::Categorical);
        assert_eq!(insight.distinct_count, 2);
        assert!(insight.numeric.is_none());
        let top = insight.top_values.unwrap();
        assert_eq!(top[0].key, FrequencyKey::Value("a".to_string()));
        assert_eq!(top[0].count, 4);
    }

    #[test]
    fn test_column_insights_numeric() {
        let insight = Analyzer::default().column_insights(&sample_df(), "z").unwrap();
        assert_eq!(insight.inferred_type, ColumnType::Numeric);
        assert_eq!(insight.null_count, 1);
        assert!(insight.numeric.unwrap().is_available());
        assert!(insight.top_values.is_none());
    }

    #[test]
    fn test_overview() {
        let overview = Analyzer::default().overview(&sample_df()).unwrap();
        assert_eq!(overview.rows, 6);
        assert_eq!(overview.columns, 4);
        assert_eq!(overview.total_cells, 24);
        assert_eq!(overview.null_cells, 1);
        assert_eq!(overview.numeric_columns, 3);
        assert_eq!(overview.categorical_columns, 1);
        assert_eq!(overview.duplicate_rows, 0);
    }

    #[test]
    fn test_categorical_summary() {
        let summary = Analyzer::default().categorical_summary(&sample_df()).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].top_value.as_deref(), Some("a"));
        assert_eq!(summary[0].top_count, 4);
        assert_eq!(summary[0].distinct_count, 2);
    }

    #[test]
    fn test_analyze_bundles_everything() {
        let report = Analyzer::default().analyze(&sample_df()).unwrap();
        assert_eq!(report.summary_stats.len(), 3);
        assert_eq!(report.correlation_matrix.columns.len(), 3);
        assert_eq!(report.null_distribution.total_null_count, 1);
        assert_eq!(report.categorical_summary.len(), 1);
    }
}
