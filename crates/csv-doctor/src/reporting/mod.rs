//! Report generation module.
//!
//! A [`DatasetReport`] combines the validator and analyzer output for one
//! table with its load metadata and, when the table was cleaned, the
//! before/after comparison and change log. It is used for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON and Markdown files next to the exported data
//! - Programmatic access in library mode
//!
//! Building a report never modifies the table or the session.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv_doctor::reporting::{ReportGenerator, ReportParams, render_markdown};
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"), config);
//! let report = generator.build_report(ReportParams {
//!     input_file: "data/train.csv",
//!     output_file: None,
//!     metadata: Some(&loaded.metadata),
//!     session: Some(&session),
//!     table: None,
//! })?;
//!
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! println!("{}", render_markdown(&report));
//! ```

mod markdown;
mod report;

pub use markdown::{Markdown, render_markdown};
pub use report::{CleaningSummary, DatasetReport, ReportGenerator, ReportParams};
