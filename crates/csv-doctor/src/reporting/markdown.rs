use super::report::DatasetReport;
use crate::types::NumericSummary;
use std::fmt;

/// Markdown view of a [`DatasetReport`].
pub struct Markdown<'a>(pub &'a DatasetReport);

/// Render a report as a Markdown document.
pub fn render_markdown(report: &DatasetReport) -> String {
    Markdown(report).to_string()
}

fn fmt_number(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map(fmt_number).unwrap_or_else(|| "n/a".to_string())
}

impl fmt::Display for Markdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let validation = &report.validation;
        let analysis = &report.analysis;
        let overview = &analysis.overview;
        let score = &validation.quality_score;

        writeln!(f, "# CSV Doctor Report")?;
        writeln!(f)?;
        writeln!(f, "**File:** {}  ", report.input_file)?;
        writeln!(f, "**Generated:** {}", report.generated_at)?;
        writeln!(f)?;

        writeln!(f, "## Executive Summary")?;
        writeln!(f)?;
        writeln!(f, "- **Total Rows:** {}", overview.rows)?;
        writeln!(f, "- **Total Columns:** {}", overview.columns)?;
        writeln!(f, "- **Data Quality Score:** {:.1}/100", score.overall)?;
        writeln!(
            f,
            "- **Null Values:** {} ({:.2}%)",
            overview.null_cells, overview.null_percentage
        )?;
        writeln!(f, "- **Duplicate Rows:** {}", overview.duplicate_rows)?;
        writeln!(f)?;

        if let Some(cleaning) = &report.cleaning {
            writeln!(f, "## Cleaning")?;
            writeln!(f)?;
            writeln!(
                f,
                "- **Rows:** {} -> {} ({} removed)",
                cleaning.rows_before,
                cleaning.rows_after,
                cleaning.rows_removed()
            )?;
            writeln!(
                f,
                "- **Columns:** {} -> {} ({} removed)",
                cleaning.columns_before,
                cleaning.columns_after,
                cleaning.columns_removed()
            )?;
            writeln!(
                f,
                "- **Quality:** {:.1} -> {:.1} ({:+.1})",
                cleaning.quality_before,
                cleaning.quality_after,
                cleaning.quality_improvement()
            )?;
            writeln!(f)?;
            for (idx, change) in cleaning.changes.iter().enumerate() {
                writeln!(f, "{}. `{}`: {}", idx + 1, change.operation, change)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "## Column Overview")?;
        writeln!(f)?;
        writeln!(f, "| Column | Type | Unique | Nulls | Null % |")?;
        writeln!(f, "|---|---|---|---|---|")?;
        for info in &validation.column_types {
            writeln!(
                f,
                "| {} | {} | {} | {} | {:.2}% |",
                info.column,
                info.inferred_type,
                info.distinct_count,
                info.null_count,
                info.null_percentage
            )?;
        }
        writeln!(f)?;

        if !analysis.summary_stats.is_empty() {
            writeln!(f, "## Summary Statistics")?;
            for column in &analysis.summary_stats {
                writeln!(f)?;
                writeln!(f, "### {}", column.column)?;
                writeln!(f)?;
                match &column.summary {
                    NumericSummary::Available(s) => {
                        writeln!(f, "| Metric | Value |")?;
                        writeln!(f, "|---|---|")?;
                        writeln!(f, "| Count | {} |", s.count)?;
                        writeln!(f, "| Mean | {} |", fmt_number(s.mean))?;
                        writeln!(f, "| Median | {} |", fmt_number(s.median))?;
                        writeln!(f, "| Std Dev | {} |", fmt_number(s.std_dev))?;
                        writeln!(f, "| Min | {} |", fmt_number(s.min))?;
                        writeln!(f, "| Max | {} |", fmt_number(s.max))?;
                        writeln!(f, "| 25% Quartile | {} |", fmt_number(s.q1))?;
                        writeln!(f, "| 75% Quartile | {} |", fmt_number(s.q3))?;
                        writeln!(f, "| Skewness | {} |", fmt_optional(s.skewness))?;
                        writeln!(f, "| Kurtosis | {} |", fmt_optional(s.kurtosis))?;
                    }
                    NumericSummary::Unavailable { count, reason } => {
                        writeln!(f, "_Not available ({} values): {}_", count, reason)?;
                    }
                }
            }
            writeln!(f)?;
        }

        writeln!(f, "## Null Value Distribution")?;
        writeln!(f)?;
        writeln!(f, "| Column | Null Count | Null % | Non-Null |")?;
        writeln!(f, "|---|---|---|---|")?;
        for column in &validation.null_distribution.columns {
            writeln!(
                f,
                "| {} | {} | {:.2}% | {} |",
                column.column, column.null_count, column.null_percentage, column.non_null_count
            )?;
        }
        writeln!(f)?;

        if !analysis.high_correlations.is_empty() {
            writeln!(f, "## High Correlations")?;
            writeln!(f)?;
            writeln!(f, "| Column 1 | Column 2 | Correlation |")?;
            writeln!(f, "|---|---|---|")?;
            for pair in &analysis.high_correlations {
                writeln!(
                    f,
                    "| {} | {} | {} |",
                    pair.first,
                    pair.second,
                    fmt_number(pair.coefficient)
                )?;
            }
            writeln!(f)?;
        }

        if !validation.anomalies.is_empty() {
            writeln!(f, "## Data Quality Issues")?;
            writeln!(f)?;
            for (idx, anomaly) in validation.anomalies.iter().enumerate() {
                writeln!(
                    f,
                    "{}. **{:?}** ({}): {}",
                    idx + 1,
                    anomaly.kind,
                    anomaly.columns.join(", "),
                    anomaly.message
                )?;
            }
            writeln!(f)?;
        }

        writeln!(f, "## Duplicate Analysis")?;
        writeln!(f)?;
        writeln!(
            f,
            "- **Duplicate Rows:** {} ({:.2}%)",
            validation.duplicates.duplicate_count, validation.duplicates.duplicate_percentage
        )?;
        writeln!(
            f,
            "- **Malformed Rows:** {}",
            validation.malformed_rows.count
        )?;
        writeln!(f)?;

        writeln!(f, "## Quality Score Breakdown")?;
        writeln!(f)?;
        writeln!(f, "| Component | Score |")?;
        writeln!(f, "|---|---|")?;
        writeln!(f, "| Null Score | {:.1}/100 |", score.null_score)?;
        writeln!(f, "| Duplicate Score | {:.1}/100 |", score.duplicate_score)?;
        writeln!(f, "| Type Consistency | {:.1}/100 |", score.type_score)?;
        writeln!(f, "| Anomaly Score | {:.1}/100 |", score.anomaly_score)?;
        writeln!(f, "| **Overall** | **{:.1}/100** |", score.overall)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::{ReportGenerator, ReportParams};
    use polars::prelude::*;

    fn report_for(df: &DataFrame) -> DatasetReport {
        ReportGenerator::default()
            .build_report(ReportParams {
                input_file: "sample.csv",
                output_file: None,
                metadata: None,
                session: None,
                table: Some(df),
            })
            .unwrap()
    }

    #[test]
    fn test_markdown_sections() {
        let df = DataFrame::new(vec![
            Column::new("x".into(), &[1.0, 2.0, 3.0, 4.0]),
            Column::new("y".into(), &[2.0, 4.0, 6.0, 8.1]),
        ])
        .unwrap();
        let md = render_markdown(&report_for(&df));

        assert!(md.contains("## Executive Summary"));
        assert!(md.contains("- **Total Rows:** 4"));
        assert!(md.contains("## Summary Statistics"));
        assert!(md.contains("## High Correlations"));
        assert!(md.contains("| **Overall** | **100.0/100** |"));
        assert!(!md.contains("## Cleaning"));
    }

    #[test]
    fn test_markdown_lists_anomalies() {
        let df = DataFrame::new(vec![Column::new("k".into(), &["same", "same", "same"])]).unwrap();
        let md = render_markdown(&report_for(&df));
        assert!(md.contains("## Data Quality Issues"));
        assert!(md.contains("**ConstantColumn** (k)"));
    }
}
