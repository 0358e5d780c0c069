//! Data quality validation module.
//!
//! This module provides read-only checks that never modify the table:
//! - Missing-value distribution
//! - Duplicate and malformed rows
//! - Type consistency against the inferred column types
//! - Column anomalies (constant, mostly missing, near-zero variance, dominant value)
//! - The composite quality score built from the above

mod score;
mod validator;

pub use score::{anomaly_score, compute_quality_score, duplicate_score, null_score};
pub use validator::{Validator, find_duplicate_rows, null_distribution};
