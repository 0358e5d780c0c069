//! Table export.
//!
//! CSV, TSV and JSON (an array of records) are always available. Parquet and
//! Arrow IPC are compiled in with the `parquet` and `ipc` cargo features;
//! asking for a format that is not compiled in yields
//! [`DoctorError::CapabilityUnavailable`] for that format only.

use crate::error::{DoctorError, Result, ResultExt};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Output format of an exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
    Parquet,
    Ipc,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Csv,
        ExportFormat::Tsv,
        ExportFormat::Json,
        ExportFormat::Parquet,
        ExportFormat::Ipc,
    ];

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Parquet => "parquet",
            Self::Ipc => "arrow",
        }
    }

    /// Whether this build can write the format.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Csv | Self::Tsv | Self::Json => true,
            Self::Parquet => cfg!(feature = "parquet"),
            Self::Ipc => cfg!(feature = "ipc"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Parquet => "parquet",
            Self::Ipc => "ipc",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ExportFormat {
    type Err = DoctorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "parquet" => Ok(Self::Parquet),
            "ipc" | "arrow" | "feather" => Ok(Self::Ipc),
            other => Err(DoctorError::InvalidOperation(format!(
                "Unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Capability flag of one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatAvailability {
    pub format: ExportFormat,
    pub available: bool,
}

/// Which export formats this build supports.
pub fn available_formats() -> Vec<FormatAvailability> {
    ExportFormat::ALL
        .iter()
        .map(|&format| FormatAvailability {
            format,
            available: format.is_available(),
        })
        .collect()
}

fn unavailable(format: ExportFormat) -> DoctorError {
    DoctorError::CapabilityUnavailable {
        capability: format!("{} export", format),
    }
}

fn write_delimited<W: Write>(df: &mut DataFrame, separator: u8, writer: W) -> Result<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(separator)
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(())
}

#[cfg(feature = "parquet")]
fn write_parquet<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    ParquetWriter::new(writer).finish(df)?;
    Ok(())
}

#[cfg(not(feature = "parquet"))]
fn write_parquet<W: Write>(_df: &mut DataFrame, _writer: W) -> Result<()> {
    Err(unavailable(ExportFormat::Parquet))
}

#[cfg(feature = "ipc")]
fn write_ipc<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    IpcWriter::new(writer).finish(df)?;
    Ok(())
}

#[cfg(not(feature = "ipc"))]
fn write_ipc<W: Write>(_df: &mut DataFrame, _writer: W) -> Result<()> {
    Err(unavailable(ExportFormat::Ipc))
}

/// Write a table to `writer` in the given format.
///
/// The table itself is not modified.
pub fn write_table<W: Write>(df: &DataFrame, format: ExportFormat, writer: W) -> Result<()> {
    if !format.is_available() {
        return Err(unavailable(format));
    }

    // The Polars writers take the frame mutably.
    let mut df = df.clone();
    match format {
        ExportFormat::Csv => write_delimited(&mut df, b',', writer),
        ExportFormat::Tsv => write_delimited(&mut df, b'\t', writer),
        ExportFormat::Json => {
            JsonWriter::new(writer)
                .with_json_format(JsonFormat::Json)
                .finish(&mut df)?;
            Ok(())
        }
        ExportFormat::Parquet => write_parquet(&mut df, writer),
        ExportFormat::Ipc => write_ipc(&mut df, writer),
    }
}

/// One file written by [`export_table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub format: ExportFormat,
    pub path: PathBuf,
}

/// Outcome of [`export_table`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub written: Vec<ExportedFile>,
    /// Requested formats that this build cannot write.
    pub unavailable: Vec<ExportFormat>,
}

impl ExportSummary {
    /// Capability errors for the formats that were skipped.
    pub fn unavailable_errors(&self) -> Vec<DoctorError> {
        self.unavailable.iter().map(|&f| unavailable(f)).collect()
    }
}

/// Write the table to `dir/stem.<ext>` for each requested format.
///
/// Formats not compiled in are skipped and listed in
/// [`ExportSummary::unavailable`]; any other failure stops the export.
pub fn export_table(
    df: &DataFrame,
    formats: &[ExportFormat],
    dir: impl AsRef<Path>,
    stem: &str,
) -> Result<ExportSummary> {
    let dir = dir.as_ref();
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .context(format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut summary = ExportSummary::default();
    for &format in formats {
        if !format.is_available() {
            warn!("Skipping {} export: not available in this build", format);
            summary.unavailable.push(format);
            continue;
        }

        let path = dir.join(format!("{}.{}", stem, format.extension()));
        let file = File::create(&path).context(format!("Failed to create {}", path.display()))?;
        write_table(df, format, file).context(format!("Failed to write {}", path.display()))?;

        info!("Exported {} rows to {}", df.height(), path.display());
        summary.written.push(ExportedFile { format, path });
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new("id".into(), &[1i64, 2]),
            Column::new("name".into(), &[Some("ann"), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_write_csv() {
        let mut buf = Vec::new();
        write_table(&sample_df(), ExportFormat::Csv, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "id,name\n1,ann\n2,\n");
    }

    #[test]
    fn test_write_tsv() {
        let mut buf = Vec::new();
        write_table(&sample_df(), ExportFormat::Tsv, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("id\tname\n1\tann\n"));
    }

    #[test]
    fn test_write_json_records() {
        let mut buf = Vec::new();
        write_table(&sample_df(), ExportFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"id": 1, "name": "ann"}, {"id": 2, "name": null}])
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("TSV".parse::<ExportFormat>().unwrap(), ExportFormat::Tsv);
        assert_eq!("arrow".parse::<ExportFormat>().unwrap(), ExportFormat::Ipc);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_available_formats_lists_all() {
        let formats = available_formats();
        assert_eq!(formats.len(), 5);
        assert!(formats.iter().filter(|f| f.available).count() >= 3);
    }

    #[test]
    fn test_export_table_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let summary = export_table(
            &sample_df(),
            &[ExportFormat::Csv, ExportFormat::Json],
            dir.path(),
            "cleaned_sample",
        )
        .unwrap();

        assert_eq!(summary.written.len(), 2);
        assert!(summary.unavailable.is_empty());
        assert!(dir.path().join("cleaned_sample.csv").exists());
        assert!(dir.path().join("cleaned_sample.json").exists());
    }

    #[cfg(not(feature = "ipc"))]
    #[test]
    fn test_unavailable_format_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let summary = export_table(
            &sample_df(),
            &[ExportFormat::Ipc, ExportFormat::Csv],
            dir.path(),
            "out",
        )
        .unwrap();

        assert_eq!(summary.unavailable, vec![ExportFormat::Ipc]);
        assert_eq!(summary.written.len(), 1);
        assert!(summary.unavailable_errors()[0].is_capability_unavailable());

        let err = write_table(&sample_df(), ExportFormat::Ipc, Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "CAPABILITY_UNAVAILABLE");
    }
}
