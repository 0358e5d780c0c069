//! Reading CSV input and writing cleaned tables.

mod export;
mod ingest;

pub use export::{
    ExportFormat, ExportSummary, ExportedFile, FormatAvailability, available_formats,
    export_table, write_table,
};
pub use ingest::{
    CANDIDATE_DELIMITERS, LoadOptions, LoadedTable, TableMetadata, detect_delimiter,
    load_csv_bytes, load_csv_path,
};
