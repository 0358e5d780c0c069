//! Value frequency distributions.

use crate::types::{FrequencyDistribution, FrequencyEntry, FrequencyKey};
use crate::utils::{percentage, series_to_strings};
use indexmap::IndexMap;
use polars::prelude::*;

/// Count every value of a column, including a bucket for missing cells.
///
/// Entries are sorted by count, most frequent first; equal counts keep the
/// order in which the values were first encountered.
pub fn frequency_of(series: &Series) -> PolarsResult<FrequencyDistribution> {
    let total = series.len();
    let mut counts: IndexMap<FrequencyKey, usize> = IndexMap::new();
    for value in series_to_strings(series)? {
        let key = match value {
            Some(v) => FrequencyKey::Value(v),
            None => FrequencyKey::Missing,
        };
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(key, count)| FrequencyEntry {
            key,
            count,
            percentage: percentage(count, total),
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(FrequencyDistribution {
        column: series.name().to_string(),
        total,
        entries,
    })
}

/// The `n` most frequent non-missing values.
pub fn top_values(distribution: &FrequencyDistribution, n: usize) -> Vec<FrequencyEntry> {
    distribution
        .entries
        .iter()
        .filter(|e| e.key != FrequencyKey::Missing)
        .take(n)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frequency_counts() {
        let series = Series::new("c".into(), &["a", "a", "a", "b"]);
        let dist = frequency_of(&series).unwrap();

        assert_eq!(dist.count_of("a"), Some(3));
        assert_eq!(dist.count_of("b"), Some(1));
        assert_eq!(dist.entries[0].percentage, 75.0);
        assert_eq!(dist.missing_count(), 0);
    }

    #[test]
    fn test_frequency_missing_bucket_and_total() {
        let series = Series::new("c".into(), &[Some("x"), None, Some("y"), None]);
        let dist = frequency_of(&series).unwrap();

        assert_eq!(dist.missing_count(), 2);
        assert_eq!(dist.entries.iter().map(|e| e.count).sum::<usize>(), 4);
        assert_eq!(dist.entries[0].key, FrequencyKey::Missing);
    }

    #[test]
    fn test_frequency_ties_keep_first_encountered() {
        let series = Series::new("c".into(), &["b", "a", "c", "a", "b"]);
        let dist = frequency_of(&series).unwrap();
        let keys: Vec<String> = dist.entries.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_top_values_skip_missing() {
        let series = Series::new("c".into(), &[None, None, Some("x"), Some("y"), Some("x")]);
        let dist = frequency_of(&series).unwrap();
        let top = top_values(&dist, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].key, FrequencyKey::Value("x".to_string()));
    }
}
