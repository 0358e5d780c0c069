//! Composite quality score.

use crate::config::QualityConfig;
use crate::types::{AnomalyRecord, DuplicateReport, NullDistribution, QualityScore};

#[inline]
fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// 100 minus the overall missing-cell percentage.
pub fn null_score(nulls: &NullDistribution) -> f64 {
    clamp_score(100.0 - nulls.total_null_percentage)
}

/// 100 minus the duplicate-row percentage.
pub fn duplicate_score(duplicates: &DuplicateReport) -> f64 {
    clamp_score(100.0 - duplicates.duplicate_percentage)
}

/// 100 minus a fixed penalty per anomaly, floored at 0.
pub fn anomaly_score(anomaly_count: usize, penalty: f64) -> f64 {
    clamp_score(100.0 - penalty * anomaly_count as f64)
}

/// Combine the four signals into a [`QualityScore`].
///
/// `type_score` is the type-consistency percentage. The weights are
/// normalized by their sum, so a configuration that does not add up to
/// exactly 1.0 still yields a score in `[0, 100]`.
pub fn compute_quality_score(
    nulls: &NullDistribution,
    duplicates: &DuplicateReport,
    type_score: f64,
    anomalies: &[AnomalyRecord],
    config: &QualityConfig,
) -> QualityScore {
    let null_score = null_score(nulls);
    let duplicate_score = duplicate_score(duplicates);
    let type_score = clamp_score(type_score);
    let anomaly_score = anomaly_score(anomalies.len(), config.anomaly_penalty);

    let w = &config.weights;
    let total = w.total();
    let weighted = w.null * null_score
        + w.duplicate * duplicate_score
        + w.type_consistency * type_score
        + w.anomaly * anomaly_score;
    let overall = if total > 0.0 {
        clamp_score(weighted / total)
    } else {
        0.0
    };

    let issues_count = anomalies.len()
        + usize::from(nulls.total_null_count > 0)
        + usize::from(duplicates.duplicate_count > 0);

    QualityScore {
        overall,
        null_score,
        duplicate_score,
        type_score,
        anomaly_score,
        issues_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnomalyKind;

    fn nulls(pct: f64, count: usize) -> NullDistribution {
        NullDistribution {
            columns: Vec::new(),
            total_null_count: count,
            total_cells: 100,
            total_null_percentage: pct,
        }
    }

    fn dups(pct: f64, count: usize) -> DuplicateReport {
        DuplicateReport {
            duplicate_count: count,
            duplicate_percentage: pct,
            sample_rows: Vec::new(),
        }
    }

    fn anomaly() -> AnomalyRecord {
        AnomalyRecord {
            kind: AnomalyKind::ConstantColumn,
            message: "constant".to_string(),
            columns: vec!["c".to_string()],
        }
    }

    #[test]
    fn test_perfect_score() {
        let score =
            compute_quality_score(&nulls(0.0, 0), &dups(0.0, 0), 100.0, &[], &QualityConfig::default());
        assert_eq!(score.overall, 100.0);
        assert_eq!(score.issues_count, 0);
    }

    #[test]
    fn test_weighted_combination() {
        // 0.3*90 + 0.2*80 + 0.2*100 + 0.3*85 = 88.5
        let score = compute_quality_score(
            &nulls(10.0, 10),
            &dups(20.0, 2),
            100.0,
            &[anomaly()],
            &QualityConfig::default(),
        );
        assert!((score.overall - 88.5).abs() < 1e-9);
        assert_eq!(score.issues_count, 3);
    }

    #[test]
    fn test_anomaly_score_floors_at_zero() {
        assert_eq!(anomaly_score(7, 15.0), 0.0);
        assert_eq!(anomaly_score(2, 15.0), 70.0);
    }

    #[test]
    fn test_scores_are_clamped() {
        assert_eq!(null_score(&nulls(150.0, 1)), 0.0);
        assert_eq!(duplicate_score(&dups(-5.0, 0)), 100.0);
    }
}
