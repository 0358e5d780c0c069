//! CSV ingestion.
//!
//! Loading happens in three steps:
//! 1. Encoding and delimiter: the bytes must be UTF-8 (a leading BOM is
//!    ignored); the delimiter is sniffed unless one is given
//! 2. Structure: every record must have as many fields as the header
//! 3. Parsing: blank lines outside quoted fields are dropped, then Polars reads the table with schema inference, falling back to
//!    all-string columns when inference fails
//!
//! Nothing is returned until all three succeed.

use crate::error::{DoctorError, Result, ResultExt};
use crate::utils::head_records;
use indexmap::IndexMap;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Delimiters considered by [`detect_delimiter`], in tie-breaking order.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Number of non-empty lines inspected when sniffing the delimiter.
const SNIFF_LINES: usize = 20;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Options for loading a CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Field delimiter; sniffed from the data when `None`.
    pub delimiter: Option<u8>,
    /// Rows used by Polars for schema inference.
    pub infer_schema_rows: usize,
    /// Rows included as JSON records in the metadata.
    pub sample_rows: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            infer_schema_rows: 100,
            sample_rows: 5,
        }
    }
}

/// Descriptive metadata of a loaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub delimiter: char,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    /// Physical dtype of each column, in column order.
    pub dtypes: IndexMap<String, String>,
    pub estimated_bytes: usize,
    pub sample: Vec<IndexMap<String, serde_json::Value>>,
    /// Non-fatal structural observations (no rows, blank headers, columns with no values).
    pub structure_issues: Vec<String>,
}

/// A parsed table together with its metadata.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: DataFrame,
    pub metadata: TableMetadata,
}

/// Count `delimiter` in a line, ignoring occurrences inside double quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let mut count = 0;
    let mut in_quotes = false;

    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }

    count
}

/// Pick the most likely delimiter of a CSV sample.
///
/// Each candidate is scored over the first non-empty lines by how many lines
/// share its most common count. Ties go to the higher count, then to the
/// earlier candidate. A sample in which no candidate appears yields `,`.
pub fn detect_delimiter(sample: &[u8]) -> u8 {
    let text = String::from_utf8_lossy(sample);
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = b',';
    let mut best_score = (0usize, 0usize);

    for &delimiter in &CANDIDATE_DELIMITERS {
        let mut frequency: IndexMap<usize, usize> = IndexMap::new();
        for line in &lines {
            *frequency
                .entry(count_delimiter_in_line(line, delimiter))
                .or_insert(0) += 1;
        }

        let Some((&modal_count, &agreeing)) = frequency
            .iter()
            .filter(|(count, _)| **count > 0)
            .max_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)))
        else {
            continue;
        };

        let score = (agreeing, modal_count);
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    debug!(
        "Detected delimiter {:?} over {} lines",
        best as char,
        lines.len()
    );
    best
}

/// Drop empty lines that sit outside quoted fields.
///
/// Lines holding only delimiters (`,`) are records and stay.
fn drop_blank_lines(text: &str) -> Cow<'_, str> {
    let mut kept = String::with_capacity(text.len());
    let mut in_quotes = false;
    let mut dropped = 0;

    for line in text.split_inclusive('\n') {
        if !in_quotes && line.trim_end_matches(['\n', '\r']).is_empty() {
            dropped += 1;
            continue;
        }
        if line.bytes().filter(|b| *b == b'"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
        kept.push_str(line);
    }

    if dropped == 0 {
        Cow::Borrowed(text)
    } else {
        debug!("Skipped {} blank lines", dropped);
        Cow::Owned(kept)
    }
}

/// Check that the header has at least one column and that every record has
/// the same number of fields as the header.
fn validate_structure(body: &[u8], delimiter: u8) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .quote(b'"')
        .flexible(false)
        .from_reader(body);

    let headers = reader.headers()?;
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(DoctorError::NoColumns);
    }

    for record in reader.records() {
        if let Err(e) = record {
            return Err(match e.kind() {
                csv::ErrorKind::UnequalLengths {
                    pos,
                    expected_len,
                    len,
                } => DoctorError::InconsistentFieldCount {
                    line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
                    expected: *expected_len as usize,
                    found: *len as usize,
                },
                _ => DoctorError::from(e),
            });
        }
    }

    Ok(())
}

fn read_table(body: &[u8], delimiter: u8, infer_schema_rows: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_rows)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_quote_char(Some(b'"')),
        )
        .into_reader_with_file_handle(Cursor::new(body.to_vec()))
        .finish()
}

fn structure_issues(df: &DataFrame) -> Vec<String> {
    let mut issues = Vec::new();
    if df.height() == 0 {
        issues.push("CSV is empty".to_string());
    }
    for col in df.get_columns() {
        let name = col.name().as_str();
        if name.trim().is_empty() {
            issues.push("Column with a blank header".to_string());
        }
        if df.height() > 0 && col.null_count() == df.height() {
            issues.push(format!("Column '{}' has no values", name));
        }
    }
    issues
}

/// Load a CSV document from memory.
///
/// # Errors
///
/// - [`DoctorError::EmptyDataset`] when the input has no content
/// - [`DoctorError::InvalidEncoding`] when it is not UTF-8
/// - [`DoctorError::NoColumns`] when the header is blank
/// - [`DoctorError::InconsistentFieldCount`] when a record is ragged
pub fn load_csv_bytes(bytes: &[u8], file_name: &str, options: &LoadOptions) -> Result<LoadedTable> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(DoctorError::EmptyDataset);
    }
    let text = std::str::from_utf8(body).map_err(|e| DoctorError::InvalidEncoding(e.to_string()))?;

    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(body));
    // Line numbers in structure errors refer to the file as given.
    validate_structure(body, delimiter)?;

    let text = drop_blank_lines(text);
    let body = text.as_bytes();

    let table = match read_table(body, delimiter, Some(options.infer_schema_rows)) {
        Ok(df) => df,
        Err(e) => {
            debug!("Schema inference failed, reading all columns as text: {}", e);
            read_table(body, delimiter, Some(0))?
        }
    };
    if table.width() == 0 {
        return Err(DoctorError::NoColumns);
    }

    let metadata = TableMetadata {
        file_name: file_name.to_string(),
        file_size: bytes.len() as u64,
        delimiter: delimiter as char,
        rows: table.height(),
        columns: table.width(),
        column_names: crate::utils::column_names(&table),
        dtypes: table
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect(),
        estimated_bytes: table.estimated_size(),
        sample: head_records(&table, options.sample_rows)?,
        structure_issues: structure_issues(&table),
    };

    info!(
        "Loaded '{}': {} rows x {} columns (delimiter {:?})",
        file_name, metadata.rows, metadata.columns, metadata.delimiter
    );

    Ok(LoadedTable { table, metadata })
}

/// Load a CSV file from disk.
pub fn load_csv_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadedTable> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
    load_csv_bytes(&bytes, &file_name, options)
}
