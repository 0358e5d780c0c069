//! Column name standardization.

use super::OpOutcome;
use crate::error::Result;
use crate::types::ChangeLogEntry;
use crate::utils::column_names;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use tracing::info;

// Any run of characters that is not a letter or digit, underscores included.
static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("Invalid regex: separator run"));

/// Standardize a single column name.
///
/// Lowercases, collapses every run of non-alphanumeric characters to one
/// underscore and trims underscores from both ends. A name with nothing left
/// becomes `column`.
pub fn standardize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = SEPARATOR_RUN.replace_all(&lowered, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "column".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Make names unique, keeping the first occurrence of each name as is.
///
/// Later occurrences get `_1`, `_2`, ... skipping suffixed names that are
/// already taken.
pub fn make_unique_names(names: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());

    // First occurrences win their name even when a later suffix could collide.
    let mut first_seen = HashSet::new();
    let is_first: Vec<bool> = names.iter().map(|n| first_seen.insert(n.as_str())).collect();
    for (name, first) in names.iter().zip(&is_first) {
        if *first {
            taken.insert(name.clone());
        }
    }

    for (name, first) in names.iter().zip(is_first) {
        if first {
            result.push(name.clone());
            continue;
        }
        let mut suffix = 1;
        let unique = loop {
            let candidate = format!("{}_{}", name, suffix);
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        taken.insert(unique.clone());
        result.push(unique);
    }

    result
}

/// Rename only the columns whose proposed name differs from the current one.
///
/// Columns that keep their name hold it. A renamed column that collides with
/// any held or already assigned name gets the first free `_1`, `_2`, ... suffix.
pub fn rename_changed_unique(current: &[String], proposed: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = current
        .iter()
        .zip(proposed)
        .filter(|(old, new)| old == new)
        .map(|(old, _)| old.clone())
        .collect();

    current
        .iter()
        .zip(proposed)
        .map(|(old, new)| {
            if old == new {
                return old.clone();
            }
            let mut candidate = new.clone();
            let mut suffix = 1;
            while taken.contains(&candidate) {
                candidate = format!("{}_{}", new, suffix);
                suffix += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Rename every column to its standardized, de-duplicated form.
pub fn standardize_column_names(df: &DataFrame) -> Result<OpOutcome> {
    const OP: &str = "standardize_column_names";

    let current = column_names(df);
    let proposed: Vec<String> = current.iter().map(|n| standardize_name(n)).collect();
    let new_names = make_unique_names(&proposed);

    let renamed: Vec<String> = current
        .iter()
        .zip(&new_names)
        .filter(|(old, new)| old != new)
        .map(|(old, new)| format!("'{}' -> '{}'", old, new))
        .collect();

    if renamed.is_empty() {
        return Ok(OpOutcome::unchanged(
            df,
            ChangeLogEntry::no_op(OP, "Column names already standardized"),
        ));
    }

    let mut table = df.clone();
    table.set_column_names(new_names.iter().map(String::as_str))?;
    info!("Standardized {} column names", renamed.len());

    Ok(OpOutcome::new(
        table,
        vec![
            ChangeLogEntry::applied(
                OP,
                format!(
                    "Standardized {} column names: {}",
                    renamed.len(),
                    renamed.join(", ")
                ),
            )
            .with_columns(renamed.len()),
        ],
    ))
}
