//! Error types for csv-doctor.
//!
//! Only malformed input and missing capabilities are errors. Conditions a
//! caller can work around (a fill requested on a text column, a statistic
//! that is undefined for the data) are reported inside the returned result
//! structures instead.
//!
//! Errors are serializable so that a transport layer can forward them to a
//! client as `{ "code": ..., "message": ... }`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for csv-doctor.
#[derive(Error, Debug)]
pub enum DoctorError {
    /// The input contained no data at all.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// The input has a header row with no usable columns.
    #[error("Dataset has no columns")]
    NoColumns,

    /// A record has a different number of fields than the header.
    #[error("Inconsistent field count on line {line}: expected {expected}, found {found}")]
    InconsistentFieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The input is not valid UTF-8.
    #[error("Dataset is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A requested operation string or plan could not be understood.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An optional capability (export format) is not compiled in.
    #[error("Capability '{capability}' is not available in this build")]
    CapabilityUnavailable { capability: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV structural error raised while validating the input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DoctorError>,
    },
}

impl DoctorError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DoctorError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for client-side handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::NoColumns => "NO_COLUMNS",
            Self::InconsistentFieldCount { .. } => "INCONSISTENT_FIELD_COUNT",
            Self::InvalidEncoding(_) => "INVALID_ENCODING",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::CapabilityUnavailable { .. } => "CAPABILITY_UNAVAILABLE",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the input dataset itself.
    ///
    /// Input errors are surfaced before any table is produced, so the caller
    /// never observes a partially loaded dataset.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::EmptyDataset
            | Self::NoColumns
            | Self::InconsistentFieldCount { .. }
            | Self::InvalidEncoding(_)
            | Self::Csv(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }

    /// Check if this error only reports a missing optional capability.
    pub fn is_capability_unavailable(&self) -> bool {
        match self {
            Self::CapabilityUnavailable { .. } => true,
            Self::WithContext { source, .. } => source.is_capability_unavailable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for DoctorError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DoctorError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for csv-doctor operations.
pub type Result<T> = std::result::Result<T, DoctorError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DoctorError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DoctorError::Io(e).with_context(context))
    }
}
