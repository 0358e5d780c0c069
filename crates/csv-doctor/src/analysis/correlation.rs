//! Pairwise Pearson correlation over numeric columns.

use crate::profiler::statistics::pearson_correlation;
use crate::types::{CorrelatedPair, CorrelationMatrix};

/// Build the correlation matrix from named numeric columns.
///
/// Each coefficient uses only the rows where both cells are present.
/// Coefficients that are undefined (fewer than 2 complete pairs, or zero
/// variance on either side) are NaN.
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = columns[i]
                .1
                .iter()
                .zip(&columns[j].1)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .collect();
            let r = pearson_correlation(&pairs);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Distinct column pairs with `|r| >= threshold`, strongest first.
pub fn high_correlations(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let mut pairs = Vec::new();
    for i in 0..matrix.columns.len() {
        for j in (i + 1)..matrix.columns.len() {
            let r = matrix.values[i][j];
            if !r.is_nan() && r.abs() >= threshold {
                pairs.push(CorrelatedPair {
                    first: matrix.columns[i].clone(),
                    second: matrix.columns[j].clone(),
                    coefficient: r,
                });
            }
        }
    }
    pairs.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, values: &[Option<f64>]) -> (String, Vec<Option<f64>>) {
        (name.to_string(), values.to_vec())
    }

    #[test]
    fn test_self_correlation_is_one() {
        let matrix = correlation_matrix(&[col("a", &[Some(1.0), Some(5.0), Some(2.0)])]);
        assert!((matrix.get("a", "a").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_complete_rows() {
        let matrix = correlation_matrix(&[
            col("a", &[Some(1.0), Some(2.0), None, Some(3.0)]),
            col("b", &[Some(2.0), Some(4.0), Some(100.0), Some(6.0)]),
        ]);
        assert!((matrix.get("a", "b").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("a", "b"), matrix.get("b", "a"));
    }

    #[test]
    fn test_constant_column_is_nan() {
        let matrix = correlation_matrix(&[
            col("a", &[Some(1.0), Some(2.0), Some(3.0)]),
            col("c", &[Some(7.0), Some(7.0), Some(7.0)]),
        ]);
        assert!(matrix.get("a", "c").unwrap().is_nan());
        assert!(matrix.get("c", "c").unwrap().is_nan());
    }

    #[test]
    fn test_high_correlations_sorted_by_strength() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![1.0, 0.75, -0.95],
                vec![0.75, 1.0, 0.2],
                vec![-0.95, 0.2, 1.0],
            ],
        };
        let pairs = high_correlations(&matrix, 0.7);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].first.as_str(), pairs[0].second.as_str()), ("a", "c"));
        assert_eq!(pairs[0].coefficient, -0.95);
        assert_eq!(pairs[1].coefficient, 0.75);
    }
}
