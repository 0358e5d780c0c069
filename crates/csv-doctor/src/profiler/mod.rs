//! Column profiling.
//!
//! This module provides:
//! - Type inference for columns (numeric, categorical, datetime, text)
//! - The statistical kernel used by cleaning, validation and analysis

pub mod statistics;
mod type_inference;

pub use type_inference::{infer_column_type, infer_table_types, value_conforms};

pub(crate) use type_inference::infer_from_values;
