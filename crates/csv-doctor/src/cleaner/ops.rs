//! Row, column and text cleaning operations.

use super::names::rename_changed_unique;
use super::{OpOutcome, resolve_columns};
use crate::error::Result;
use crate::types::ChangeLogEntry;
use crate::utils::{column_names, is_string_dtype, row_keys};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Drop rows in which every cell is missing.
pub fn remove_empty_rows(df: &DataFrame) -> Result<OpOutcome> {
    const OP: &str = "remove_empty_rows";

    if df.width() == 0 {
        return Ok(OpOutcome::unchanged(
            df,
            ChangeLogEntry::no_op(OP, "Table has no columns; no rows to remove"),
        ));
    }

    let mut keep = vec![false; df.height()];
    for col in df.get_columns() {
        let present = col.as_materialized_series().is_not_null();
        for (flag, cell) in keep.iter_mut().zip(present.into_iter()) {
            if cell.unwrap_or(false) {
                *flag = true;
            }
        }
    }

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return Ok(OpOutcome::unchanged(
            df,
            ChangeLogEntry::no_op(OP, "No empty rows found"),
        ));
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let table = df.filter(&mask)?;
    info!("Removed {} empty rows", removed);

    Ok(OpOutcome::new(
        table,
        vec![ChangeLogEntry::applied(OP, format!("Removed {} empty rows", removed)).with_rows(removed)],
    ))
}

/// Drop columns in which every cell is missing.
///
/// A table without rows is left alone rather than losing every column.
pub fn remove_empty_columns(df: &DataFrame) -> Result<OpOutcome> {
    const OP: &str = "remove_empty_columns";

    if df.height() == 0 {
        return Ok(OpOutcome::unchanged(
            df,
            ChangeLogEntry::no_op(OP, "Table has no rows; no columns removed"),
        ));
    }

    let empty: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() == c.len())
        .map(|c| c.name().to_string())
        .collect();

    if empty.is_empty() {
        return Ok(OpOutcome::unchanged(
            df,
            ChangeLogEntry::no_op(OP, "No empty columns found"),
        ));
    }

    let to_drop: Vec<PlSmallStr> = empty.iter().map(|s| s.as_str().into()).collect();
    let table = df.drop_many(to_drop);
    info!("Removed {} empty columns", empty.len());

    Ok(OpOutcome::new(
        table,
        vec![
            ChangeLogEntry::applied(
                OP,
                format!("Removed {} empty columns: {}", empty.len(), empty.join(", ")),
            )
            .with_columns(empty.len()),
        ],
    ))
}

/// Trim leading and trailing whitespace from text cells and column names.
///
/// With no column list every text column is targeted. A cell that trims to
/// the empty string stays an empty string.
pub fn trim_whitespace(df: &DataFrame, columns: Option<&[String]>) -> Result<OpOutcome> {
    const OP: &str = "trim_whitespace";

    let (targets, missing) = resolve_columns(df, columns, OP, |s| is_string_dtype(s.dtype()));
    let mut entries: Vec<ChangeLogEntry> = missing.into_iter().collect();
    let mut table = df.clone();
    let mut cells_trimmed = 0;
    let mut trimmed_columns = Vec::new();

    for name in &targets {
        let series = table.column(name)?.as_materialized_series().clone();
        if !is_string_dtype(series.dtype()) {
            entries.push(ChangeLogEntry::warning(
                OP,
                format!("Column '{}' is not a text column; skipped", name),
            ));
            continue;
        }

        let mut changed = 0;
        let trimmed: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|v| {
                v.map(|s| {
                    let t = s.trim();
                    if t.len() != s.len() {
                        changed += 1;
                    }
                    t.to_string()
                })
            })
            .collect();

        if changed > 0 {
            table.replace(name, Series::new(series.name().clone(), trimmed))?;
            cells_trimmed += changed;
            trimmed_columns.push(name.clone());
            debug!("Trimmed {} cells in '{}'", changed, name);
        }
    }

    // Names of targeted columns are trimmed as well; other columns keep theirs.
    let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let current_names = column_names(&table);
    let proposed: Vec<String> = current_names
        .iter()
        .map(|n| {
            if target_set.contains(n.as_str()) {
                n.trim().to_string()
            } else {
                n.clone()
            }
        })
        .collect();
    let new_names = rename_changed_unique(&current_names, &proposed);
    let renamed = current_names
        .iter()
        .zip(&new_names)
        .filter(|(old, new)| old != new)
        .count();
    if renamed > 0 {
        table.set_column_names(new_names.iter().map(String::as_str))?;
    }

    if cells_trimmed == 0 && renamed == 0 {
        entries.insert(0, ChangeLogEntry::no_op(OP, "No surrounding whitespace found"));
        return Ok(OpOutcome::new(table, entries));
    }

    let mut message = format!(
        "Trimmed whitespace in {} cells across {} columns",
        cells_trimmed,
        trimmed_columns.len()
    );
    if renamed > 0 {
        message.push_str(&format!(" and {} column names", renamed));
    }
    info!("{}", message);
    entries.insert(
        0,
        ChangeLogEntry::applied(OP, message)
            .with_cells(cells_trimmed)
            .with_columns(trimmed_columns.len().max(renamed)),
    );

    Ok(OpOutcome::new(table, entries))
}

/// Drop rows equal to an earlier row, keeping the first occurrence.
///
/// Equality is checked on `subset` (all columns by default). Missing cells
/// compare equal to each other.
pub fn remove_duplicates(df: &DataFrame, subset: Option<&[String]>) -> Result<OpOutcome> {
    const OP: &str = "remove_duplicates";

    let (keys, missing) = resolve_columns(df, subset, OP, |_| true);
    let mut entries: Vec<ChangeLogEntry> = missing.into_iter().collect();

    if keys.is_empty() || df.height() == 0 {
        entries.insert(0, ChangeLogEntry::no_op(OP, "Nothing to compare; no rows removed"));
        return Ok(OpOutcome::new(df.clone(), entries));
    }

    let mut seen = HashSet::with_capacity(df.height());
    let keep: Vec<bool> = row_keys(df, &keys)?
        .into_iter()
        .map(|key| seen.insert(key))
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        entries.insert(0, ChangeLogEntry::no_op(OP, "No duplicate rows found"));
        return Ok(OpOutcome::new(df.clone(), entries));
    }

    let mask = BooleanChunked::from_slice("dedupe".into(), &keep);
    let table = df.filter(&mask)?;
    let pct = removed as f64 / df.height() as f64 * 100.0;
    info!("Removed {} duplicate rows ({:.1}%)", removed, pct);

    entries.insert(
        0,
        ChangeLogEntry::applied(
            OP,
            format!("Removed {} duplicate rows ({:.1}%)", removed, pct),
        )
        .with_rows(removed),
    );
    Ok(OpOutcome::new(table, entries))
}

/// Target letter case for [`normalize_text_case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCase {
    Lower,
    Upper,
    /// First letter after any non-letter upper-cased, all other letters lower-cased.
    Title,
}

impl TextCase {
    pub fn apply(self, value: &str) -> String {
        match self {
            TextCase::Lower => value.to_lowercase(),
            TextCase::Upper => value.to_uppercase(),
            TextCase::Title => title_case(value),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TextCase::Lower => "lower",
            TextCase::Upper => "upper",
            TextCase::Title => "title",
        }
    }
}

impl fmt::Display for TextCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextCase {
    type Err = crate::error::DoctorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lower" | "lowercase" => Ok(TextCase::Lower),
            "upper" | "uppercase" => Ok(TextCase::Upper),
            "title" | "titlecase" => Ok(TextCase::Title),
            other => Err(crate::error::DoctorError::InvalidOperation(format!(
                "unknown text case '{}' (expected lower, upper or title)",
                other
            ))),
        }
    }
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Convert text cells to the requested case.
pub fn normalize_text_case(
    df: &DataFrame,
    case: TextCase,
    columns: Option<&[String]>,
) -> Result<OpOutcome> {
    const OP: &str = "normalize_text_case";

    let (targets, missing) = resolve_columns(df, columns, OP, |s| is_string_dtype(s.dtype()));
    let mut entries: Vec<ChangeLogEntry> = missing.into_iter().collect();
    let mut table = df.clone();
    let mut cells_changed = 0;
    let mut columns_changed = 0;

    for name in &targets {
        let series = table.column(name)?.as_materialized_series().clone();
        if !is_string_dtype(series.dtype()) {
            entries.push(ChangeLogEntry::warning(
                OP,
                format!("Column '{}' is not a text column; skipped", name),
            ));
            continue;
        }

        let mut changed = 0;
        let converted: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|v| {
                v.map(|s| {
                    let out = case.apply(s);
                    if out != s {
                        changed += 1;
                    }
                    out
                })
            })
            .collect();

        if changed > 0 {
            table.replace(name, Series::new(series.name().clone(), converted))?;
            cells_changed += changed;
            columns_changed += 1;
        }
    }

    let summary = if cells_changed == 0 {
        ChangeLogEntry::no_op(OP, format!("All text already in {} case", case))
    } else {
        info!("Converted {} cells to {} case", cells_changed, case);
        ChangeLogEntry::applied(
            OP,
            format!(
                "Converted {} cells in {} columns to {} case",
                cells_changed, columns_changed, case
            ),
        )
        .with_cells(cells_changed)
        .with_columns(columns_changed)
    };
    entries.insert(0, summary);

    Ok(OpOutcome::new(table, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::series_to_strings;
    use pretty_assertions::assert_eq;

    fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        series_to_strings(df.column(name).unwrap().as_materialized_series()).unwrap()
    }

    // ==================== empty rows / columns ====================

    #[test]
    fn test_remove_empty_rows() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[Some(1i64), None, Some(3)]),
            Column::new("b".into(), &[Some("x"), None, None]),
        ])
        .unwrap();

        let outcome = remove_empty_rows(&df).unwrap();
        assert_eq!(outcome.table.height(), 2);
        assert_eq!(outcome.entries[0].rows_affected, 1);
        // Input untouched
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_remove_empty_rows_is_idempotent() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[Some(1i64), None])]).unwrap();
        let first = remove_empty_rows(&df).unwrap();
        let second = remove_empty_rows(&first.table).unwrap();
        assert!(first.table.equals_missing(&second.table));
        assert!(second.entries[0].is_no_op());
    }

    #[test]
    fn test_remove_empty_rows_zero_width() {
        let df = DataFrame::empty();
        let outcome = remove_empty_rows(&df).unwrap();
        assert!(outcome.entries[0].is_no_op());
    }

    #[test]
    fn test_remove_empty_columns() {
        let df = DataFrame::new(vec![
            Column::new("keep".into(), &[Some(1i64), None]),
            Column::new("empty".into(), &[None::<&str>, None]),
        ])
        .unwrap();

        let outcome = remove_empty_columns(&df).unwrap();
        assert_eq!(column_names(&outcome.table), vec!["keep".to_string()]);
        assert_eq!(outcome.entries[0].columns_affected, 1);
    }

    #[test]
    fn test_remove_empty_columns_zero_rows_is_no_op() {
        let df = DataFrame::new(vec![Column::new("a".into(), Vec::<i64>::new())]).unwrap();
        let outcome = remove_empty_columns(&df).unwrap();
        assert_eq!(outcome.table.width(), 1);
        assert!(outcome.entries[0].is_no_op());
    }

    // ==================== trim ====================

    #[test]
    fn test_trim_whitespace_cells_and_names() {
        let df = DataFrame::new(vec![
            Column::new(" name ".into(), &[Some("  alice "), Some("bob"), None]),
            Column::new("age".into(), &[1i64, 2, 3]),
        ])
        .unwrap();

        let outcome = trim_whitespace(&df, None).unwrap();
        assert_eq!(
            column_names(&outcome.table),
            vec!["name".to_string(), "age".to_string()]
        );
        assert_eq!(
            strings(&outcome.table, "name"),
            vec![Some("alice".to_string()), Some("bob".to_string()), None]
        );
        assert_eq!(outcome.entries[0].cells_affected, 1);
    }

    #[test]
    fn test_trim_whitespace_keeps_empty_string() {
        let df = DataFrame::new(vec![Column::new("a".into(), &["   ", "x"])]).unwrap();
        let outcome = trim_whitespace(&df, None).unwrap();
        assert_eq!(
            strings(&outcome.table, "a"),
            vec![Some(String::new()), Some("x".to_string())]
        );
    }

    #[test]
    fn test_trim_whitespace_non_text_target_warns() {
        let df = DataFrame::new(vec![Column::new("n".into(), &[1i64, 2])]).unwrap();
        let targets = vec!["n".to_string()];
        let outcome = trim_whitespace(&df, Some(&targets)).unwrap();
        assert!(outcome.entries[0].is_no_op());
        assert_eq!(outcome.warnings().count(), 1);
    }

    #[test]
    fn test_trim_whitespace_name_collision_gets_suffix() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &["x"]),
            Column::new("a ".into(), &["y"]),
        ])
        .unwrap();
        let outcome = trim_whitespace(&df, None).unwrap();
        assert_eq!(
            column_names(&outcome.table),
            vec!["a".to_string(), "a_1".to_string()]
        );
    }

    #[test]
    fn test_trim_whitespace_never_renames_untargeted_column() {
        let df = DataFrame::new(vec![
            Column::new("a ".into(), &["x", "y"]),
            Column::new("a".into(), &[1i64, 2]),
        ])
        .unwrap();
        let outcome = trim_whitespace(&df, None).unwrap();
        assert_eq!(
            column_names(&outcome.table),
            vec!["a_1".to_string(), "a".to_string()]
        );
        assert_eq!(outcome.table.column("a").unwrap().dtype(), &DataType::Int64);
    }

    // ==================== duplicates ====================

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[1i64, 1, 2, 1]),
            Column::new("b".into(), &[Some("x"), Some("x"), Some("y"), None]),
        ])
        .unwrap();

        let outcome = remove_duplicates(&df, None).unwrap();
        assert_eq!(outcome.table.height(), 3);
        assert_eq!(outcome.entries[0].rows_affected, 1);

        let again = remove_duplicates(&outcome.table, None).unwrap();
        assert!(again.entries[0].is_no_op());
        assert_eq!(again.table.height(), 3);
    }

    #[test]
    fn test_remove_duplicates_nulls_compare_equal() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[None::<i64>, None, Some(1)])]).unwrap();
        let outcome = remove_duplicates(&df, None).unwrap();
        assert_eq!(outcome.table.height(), 2);
    }

    #[test]
    fn test_remove_duplicates_on_subset() {
        let df = DataFrame::new(vec![
            Column::new("id".into(), &[1i64, 1, 2]),
            Column::new("v".into(), &["a", "b", "c"]),
        ])
        .unwrap();
        let subset = vec!["id".to_string(), "nope".to_string()];
        let outcome = remove_duplicates(&df, Some(&subset)).unwrap();
        assert_eq!(outcome.table.height(), 2);
        assert_eq!(outcome.warnings().count(), 1);
    }

    // ==================== text case ====================

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello WORLD"), "Hello World");
        assert_eq!(title_case("o'neil-smith"), "O'Neil-Smith");
        assert_eq!(title_case("abc1def"), "Abc1Def");
    }

    #[test]
    fn test_normalize_text_case_upper() {
        let df = DataFrame::new(vec![
            Column::new("c".into(), &[Some("abc"), Some("DEF"), None]),
            Column::new("n".into(), &[1i64, 2, 3]),
        ])
        .unwrap();

        let outcome = normalize_text_case(&df, TextCase::Upper, None).unwrap();
        assert_eq!(
            strings(&outcome.table, "c"),
            vec![Some("ABC".to_string()), Some("DEF".to_string()), None]
        );
        assert_eq!(outcome.entries[0].cells_affected, 1);
    }

    #[test]
    fn test_text_case_from_str() {
        assert_eq!("Title".parse::<TextCase>().unwrap(), TextCase::Title);
        assert!("sentence".parse::<TextCase>().is_err());
    }
}
