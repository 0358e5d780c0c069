//! Statistical functions shared by the cleaner, validator and analyzer.
//!
//! All functions take the non-missing values of a column. Quantities that are
//! undefined for the given data are returned as `None` (or NaN for
//! correlations) instead of a meaningless number.

use crate::types::{NumericSummary, SummaryStats};

/// Arithmetic mean.
pub fn calculate_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Needs at least 2 values.
pub fn calculate_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = calculate_mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Population standard deviation (n denominator).
pub fn calculate_population_std(values: &[f64]) -> Option<f64> {
    let mean = calculate_mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Quantile of already sorted values using linear interpolation
/// between closest ranks (position `(n - 1) * p`).
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let position = (sorted.len() - 1) as f64 * p;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Sort a copy of the values in ascending order.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// First quartile, median and third quartile.
pub fn calculate_quartiles(values: &[f64]) -> Option<(f64, f64, f64)> {
    let sorted = sorted_copy(values);
    Some((
        quantile_sorted(&sorted, 0.25)?,
        quantile_sorted(&sorted, 0.5)?,
        quantile_sorted(&sorted, 0.75)?,
    ))
}

/// Adjusted Fisher-Pearson skewness. Needs at least 3 values and non-zero spread.
pub fn calculate_skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let mean = calculate_mean(values)?;
    let std = calculate_std(values)?;
    if std == 0.0 {
        return None;
    }

    let n = n as f64;
    let cubed: f64 = values.iter().map(|v| ((v - mean) / std).powi(3)).sum();
    Some(n / ((n - 1.0) * (n - 2.0)) * cubed)
}

/// Unbiased excess kurtosis. Needs at least 4 values and non-zero spread.
pub fn calculate_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let mean = calculate_mean(values)?;
    let m2: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if m2 == 0.0 {
        return None;
    }
    let m4: f64 = values.iter().map(|v| (v - mean).powi(4)).sum();

    let n = n as f64;
    let leading = n * (n + 1.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0));
    let correction = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    Some(leading * m4 / (m2 * m2) - correction)
}

/// Pearson correlation of paired observations.
///
/// Returns NaN when fewer than 2 pairs exist or either side has zero variance.
pub fn pearson_correlation(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Full descriptive summary, or an explicit marker below 2 values.
pub fn summarize(values: &[f64]) -> NumericSummary {
    if values.len() < 2 {
        return NumericSummary::Unavailable {
            count: values.len(),
            reason: "fewer than 2 numeric values".to_string(),
        };
    }

    let sorted = sorted_copy(values);
    // At least 2 values: none of these fall back.
    let mean = calculate_mean(values).unwrap_or(f64::NAN);
    let std_dev = calculate_std(values).unwrap_or(f64::NAN);
    let q1 = quantile_sorted(&sorted, 0.25).unwrap_or(f64::NAN);
    let median = quantile_sorted(&sorted, 0.5).unwrap_or(f64::NAN);
    let q3 = quantile_sorted(&sorted, 0.75).unwrap_or(f64::NAN);
    let skewness = calculate_skewness(values);
    let kurtosis = calculate_kurtosis(values);

    let approximately_normal = match (skewness, kurtosis) {
        (Some(s), Some(k)) => Some(s.abs() < 0.5 && k.abs() < 3.0),
        _ => None,
    };

    NumericSummary::Available(SummaryStats {
        count: values.len(),
        mean,
        std_dev,
        variance: std_dev * std_dev,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q1,
        median,
        q3,
        iqr: q3 - q1,
        skewness,
        kurtosis,
        approximately_normal,
    })
}
