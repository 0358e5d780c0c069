//! CLI entry point for csv-doctor.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use csv_doctor::charts::chart_data;
use csv_doctor::io::{available_formats, export_table, load_csv_path};
use csv_doctor::{
    Analyzer, CleaningOp, CleaningSession, ColumnType, DatasetReport, DoctorConfig, ExportFormat, LoadOptions,
    LoadedTable, ReportGenerator, ReportParams, Validator, infer_table_types, render_markdown,
};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// CLI-compatible export format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExportFormat {
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// JSON array of records
    Json,
    /// Apache Parquet (requires the `parquet` feature)
    Parquet,
    /// Arrow IPC file (requires the `ipc` feature)
    Ipc,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(cli: CliExportFormat) -> Self {
        match cli {
            CliExportFormat::Csv => ExportFormat::Csv,
            CliExportFormat::Tsv => ExportFormat::Tsv,
            CliExportFormat::Json => ExportFormat::Json,
            CliExportFormat::Parquet => ExportFormat::Parquet,
            CliExportFormat::Ipc => ExportFormat::Ipc,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean CSV files and score their quality",
    long_about = "Inspect, clean, validate and analyze CSV files.\n\n\
                  CLEANING OPERATIONS (--op, repeatable, applied in order):\n  \
                  name[:param][@col1,col2]\n\n  \
                  remove_empty_rows, remove_empty_columns, trim[@cols], dedupe[@cols],\n  \
                  fill:mean|median|mode|ffill|bfill|constant=VALUE[@cols],\n  \
                  standardize_names, case:lower|upper|title[@cols],\n  \
                  outliers[:iqr=1.5|zscore=3][@cols], convert:numeric|datetime|text@cols\n\n\
                  EXAMPLES:\n  \
                  # Describe a file\n  \
                  csv-doctor inspect data.csv\n\n  \
                  # Clean and export\n  \
                  csv-doctor clean data.csv --op trim --op dedupe --op fill:median -o out/\n\n  \
                  # Full report as JSON\n  \
                  csv-doctor --json report data.csv --plan plan.json"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file (missing fields use defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the JSON result is written.
    #[arg(long, global = true)]
    json: bool,

    /// Field delimiter of the input (detected when omitted)
    #[arg(short, long, global = true)]
    delimiter: Option<char>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show file metadata and inferred column types
    Inspect {
        /// Path to the CSV file
        input: PathBuf,
    },

    /// Apply cleaning operations and export the result
    Clean {
        /// Path to the CSV file
        input: PathBuf,

        #[command(flatten)]
        plan: PlanArgs,

        /// Output directory
        #[arg(short, long, default_value = "./outputs")]
        output: PathBuf,

        /// Export formats
        #[arg(short, long, value_enum, default_values_t = [CliExportFormat::Csv])]
        format: Vec<CliExportFormat>,

        /// Also write JSON and Markdown reports to the output directory
        #[arg(short = 'r', long)]
        emit_report: bool,
    },

    /// Check data quality and compute the quality score
    Validate {
        /// Path to the CSV file
        input: PathBuf,

        /// JSON object of expected column types, e.g. {"age": "numeric", "name": "text"}
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Descriptive statistics, correlations and frequencies
    Analyze {
        /// Path to the CSV file
        input: PathBuf,

        /// Show detailed insights for these columns
        #[arg(long = "column")]
        columns: Vec<String>,
    },

    /// Emit chart data as JSON
    Charts {
        /// Path to the CSV file
        input: PathBuf,
    },

    /// Validation, analysis and cleaning history in one report
    Report {
        /// Path to the CSV file
        input: PathBuf,

        #[command(flatten)]
        plan: PlanArgs,

        /// Print Markdown instead of the summary
        #[arg(long)]
        markdown: bool,
    },

    /// List export formats supported by this build
    Formats,
}

#[derive(clap::Args, Debug, Default)]
struct PlanArgs {
    /// Cleaning operation (repeatable)
    #[arg(long = "op")]
    ops: Vec<CleaningOp>,

    /// JSON file with a list of cleaning operations, applied before any --op
    #[arg(long)]
    plan: Option<PathBuf>,
}

impl PlanArgs {
    fn load(&self) -> Result<Vec<CleaningOp>> {
        let mut ops = match &self.plan {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read plan {}", path.display()))?;
                serde_json::from_str::<Vec<CleaningOp>>(&content)
                    .with_context(|| format!("Invalid plan {}", path.display()))?
            }
            None => Vec::new(),
        };
        ops.extend(self.ops.iter().cloned());
        Ok(ops)
    }

    fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.plan.is_none()
    }
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = match &args.config {
        Some(path) => DoctorConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DoctorConfig::default(),
    };
    config.validate()?;

    match &args.command {
        Command::Inspect { input } => run_inspect(&args, &config, input),
        Command::Clean {
            input,
            plan,
            output,
            format,
            emit_report,
        } => run_clean(&args, &config, input, plan, output, format, *emit_report),
        Command::Validate { input, schema } => {
            run_validate(&args, &config, input, schema.as_deref())
        }
        Command::Analyze { input, columns } => run_analyze(&args, &config, input, columns),
        Command::Charts { input } => {
            let loaded = load_input(&args, &config, input)?;
            let charts = chart_data(&loaded.table, &config)?;
            println!("{}", serde_json::to_string_pretty(&charts)?);
            Ok(())
        }
        Command::Report {
            input,
            plan,
            markdown,
        } => run_report(&args, &config, input, plan, *markdown),
        Command::Formats => run_formats(&args),
    }
}

fn load_input(args: &Args, config: &DoctorConfig, input: &Path) -> Result<LoadedTable> {
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", input.display()));
    }

    let delimiter = match args.delimiter {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => bail!("Delimiter must be a single ASCII character, got {:?}", c),
        None => None,
    };
    let options = LoadOptions {
        delimiter,
        sample_rows: config.analysis.sample_rows,
        ..LoadOptions::default()
    };

    info!("Loading dataset from: {}", input.display());
    let loaded = load_csv_path(input, &options)?;
    for issue in &loaded.metadata.structure_issues {
        warn!("{}", issue);
    }
    Ok(loaded)
}

/// Apply a plan to a fresh session; the first failing operation aborts the run.
fn run_plan(loaded: LoadedTable, config: &DoctorConfig, plan: &PlanArgs) -> Result<CleaningSession> {
    let ops = plan.load()?;
    let mut session = CleaningSession::with_config(loaded.table, config.clone());
    let entries = session.apply_all(&ops)?;
    debug!("{} operations produced {} log entries", ops.len(), entries);
    Ok(session)
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

fn run_inspect(args: &Args, config: &DoctorConfig, input: &Path) -> Result<()> {
    let loaded = load_input(args, config, input)?;
    let types = infer_table_types(&loaded.table, &config.inference)?;

    if args.json {
        let value = serde_json::json!({
            "metadata": loaded.metadata,
            "column_types": types
                .iter()
                .map(|(name, t)| (name.clone(), t.to_string()))
                .collect::<indexmap::IndexMap<_, _>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let meta = &loaded.metadata;
    println!();
    println!("FILE OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", meta.file_name);
    println!("  Size: {} bytes", meta.file_size);
    println!("  Delimiter: {:?}", meta.delimiter);
    println!("  Rows: {}", meta.rows);
    println!("  Columns: {}", meta.columns);
    println!();
    println!("{:<24} {:<12} {:<12}", "Column", "Dtype", "Type");
    println!("{}", "-".repeat(50));
    for (name, column_type) in &types {
        let dtype = meta.dtypes.get(name).map(String::as_str).unwrap_or("?");
        println!("{:<24} {:<12} {:<12}", truncate_str(name, 23), dtype, column_type);
    }
    if !meta.structure_issues.is_empty() {
        println!();
        println!("STRUCTURE ISSUES");
        for issue in &meta.structure_issues {
            println!("  - {}", issue);
        }
    }
    println!();
    Ok(())
}

fn run_clean(
    args: &Args,
    config: &DoctorConfig,
    input: &Path,
    plan: &PlanArgs,
    output: &Path,
    formats: &[CliExportFormat],
    emit_report: bool,
) -> Result<()> {
    if plan.is_empty() {
        warn!("No cleaning operations given; exporting the table unchanged");
    }

    let loaded = load_input(args, config, input)?;
    let metadata = loaded.metadata.clone();
    let session = run_plan(loaded, config, plan)?;

    let stem = extract_file_stem(input);
    let formats: Vec<ExportFormat> = formats.iter().map(|&f| f.into()).collect();
    let exported = export_table(session.current(), &formats, output, &format!("cleaned_{}", stem))?;
    for format in &exported.unavailable {
        warn!("Format '{}' is not available in this build", format);
    }

    let generator = ReportGenerator::new(output.to_path_buf(), config.clone());
    let output_file = exported
        .written
        .first()
        .map(|f| f.path.display().to_string());
    let report = generator.build_report(ReportParams {
        input_file: &metadata.file_name,
        output_file: output_file.as_deref(),
        metadata: Some(&metadata),
        session: Some(&session),
        table: None,
    })?;

    if emit_report {
        let json_path = generator.write_report_to_file(&report, &stem)?;
        let md_path = generator.write_markdown_to_file(&report, &stem)?;
        info!("Reports written to: {} and {}", json_path.display(), md_path.display());
    }

    if args.json {
        let value = serde_json::json!({
            "export": exported,
            "cleaning": report.cleaning,
            "quality_score": report.validation.quality_score,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_cleaning_summary(&report);
    for file in &exported.written {
        println!("  Written: {}", file.path.display());
    }
    println!();
    Ok(())
}

fn load_schema(path: &Path) -> Result<IndexMap<String, ColumnType>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid schema {}", path.display()))
}

fn run_validate(
    args: &Args,
    config: &DoctorConfig,
    input: &Path,
    schema: Option<&Path>,
) -> Result<()> {
    let loaded = load_input(args, config, input)?;
    let validator = Validator::new(config.clone());
    let report = validator.validate(&loaded.table)?;
    let schema_check = match schema {
        Some(path) => Some(validator.validate_schema(&loaded.table, &load_schema(path)?)?),
        None => None,
    };

    if args.json {
        let value = match &schema_check {
            Some(check) => serde_json::json!({ "validation": report, "schema": check }),
            None => serde_json::to_value(&report)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let score = &report.quality_score;
    println!();
    println!("{}", "=".repeat(60));
    println!("DATA QUALITY: {:.1}/100", score.overall);
    println!("{}", "=".repeat(60));
    println!("  Null score:        {:>6.1}", score.null_score);
    println!("  Duplicate score:   {:>6.1}", score.duplicate_score);
    println!("  Type consistency:  {:>6.1}", score.type_score);
    println!("  Anomaly score:     {:>6.1}", score.anomaly_score);
    println!();
    println!(
        "  Missing cells: {} ({:.2}%)",
        report.null_distribution.total_null_count, report.null_distribution.total_null_percentage
    );
    println!(
        "  Duplicate rows: {} ({:.2}%)",
        report.duplicates.duplicate_count, report.duplicates.duplicate_percentage
    );
    println!("  Malformed rows: {}", report.malformed_rows.count);

    if report.anomalies.is_empty() {
        println!("  No anomalies detected");
    } else {
        println!();
        println!("ANOMALIES");
        for anomaly in &report.anomalies {
            println!("  - {}", anomaly.message);
        }
    }

    if let Some(check) = &schema_check {
        println!();
        println!("SCHEMA: {}", if check.valid { "valid" } else { "invalid" });
        for error in &check.errors {
            println!("  [error] {}", error);
        }
        for warning in &check.warnings {
            println!("  [warn]  {}", warning);
        }
    }
    println!();
    Ok(())
}

fn run_analyze(args: &Args, config: &DoctorConfig, input: &Path, columns: &[String]) -> Result<()> {
    let loaded = load_input(args, config, input)?;
    let analyzer = Analyzer::new(config.clone());
    let analysis = analyzer.analyze(&loaded.table)?;
    let insights = columns
        .iter()
        .map(|c| analyzer.column_insights(&loaded.table, c))
        .collect::<csv_doctor::DoctorResult<Vec<_>>>()?;

    if args.json {
        let value = serde_json::json!({
            "analysis": analysis,
            "column_insights": insights,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let overview = &analysis.overview;
    println!();
    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Rows: {}", overview.rows);
    println!("  Columns: {}", overview.columns);
    println!(
        "  Numeric / categorical / datetime / text: {} / {} / {} / {}",
        overview.numeric_columns,
        overview.categorical_columns,
        overview.datetime_columns,
        overview.text_columns
    );
    println!("  Estimated memory: {} bytes", overview.estimated_bytes);
    println!();

    println!("NUMERIC COLUMNS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:>8} {:>12} {:>12} {:>12}",
        "Column", "Count", "Mean", "Std", "Median"
    );
    for column in &analysis.summary_stats {
        match column.summary.stats() {
            Some(s) => println!(
                "{:<20} {:>8} {:>12.4} {:>12.4} {:>12.4}",
                truncate_str(&column.column, 19),
                s.count,
                s.mean,
                s.std_dev,
                s.median
            ),
            None => println!("{:<20} {:>8}", truncate_str(&column.column, 19), "n/a"),
        }
    }
    println!();

    if !analysis.high_correlations.is_empty() {
        println!("HIGH CORRELATIONS");
        println!("{}", "-".repeat(40));
        for pair in &analysis.high_correlations {
            println!("  {} ~ {}: {:.3}", pair.first, pair.second, pair.coefficient);
        }
        println!();
    }

    for summary in &analysis.categorical_summary {
        println!(
            "  {}: {} distinct, top {:?} ({})",
            summary.column, summary.distinct_count, summary.top_value, summary.top_count
        );
    }

    for insight in &insights {
        println!();
        println!("{}", serde_json::to_string_pretty(insight)?);
    }
    println!();
    Ok(())
}

fn run_report(
    args: &Args,
    config: &DoctorConfig,
    input: &Path,
    plan: &PlanArgs,
    markdown: bool,
) -> Result<()> {
    let loaded = load_input(args, config, input)?;
    let metadata = loaded.metadata.clone();
    let generator = ReportGenerator::new(PathBuf::from("./outputs"), config.clone());

    let report = if plan.is_empty() {
        generator.build_report(ReportParams {
            input_file: &metadata.file_name,
            output_file: None,
            metadata: Some(&metadata),
            session: None,
            table: Some(&loaded.table),
        })?
    } else {
        let session = run_plan(loaded, config, plan)?;
        generator.build_report(ReportParams {
            input_file: &metadata.file_name,
            output_file: None,
            metadata: Some(&metadata),
            session: Some(&session),
            table: None,
        })?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if markdown {
        print!("{}", render_markdown(&report));
    } else {
        print_cleaning_summary(&report);
    }
    Ok(())
}

fn run_formats(args: &Args) -> Result<()> {
    let formats = available_formats();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&formats)?);
        return Ok(());
    }

    println!("EXPORT FORMATS");
    println!("{}", "-".repeat(40));
    for f in &formats {
        let status = if f.available { "available" } else { "not compiled in" };
        println!("  {:<10} {}", f.format.to_string(), status);
    }
    Ok(())
}

/// Print a human-readable summary of a report.
fn print_cleaning_summary(report: &DatasetReport) {
    let score = &report.validation.quality_score;

    println!();
    println!("{}", "=".repeat(60));
    println!("CSV DOCTOR: {}", report.input_file);
    println!("{}", "=".repeat(60));

    if let Some(cleaning) = &report.cleaning {
        println!(
            "  Rows: {} -> {} ({} removed)",
            cleaning.rows_before,
            cleaning.rows_after,
            cleaning.rows_removed()
        );
        println!(
            "  Columns: {} -> {} ({} removed)",
            cleaning.columns_before,
            cleaning.columns_after,
            cleaning.columns_removed()
        );
        println!(
            "  Quality: {:.1} -> {:.1} ({:+.1})",
            cleaning.quality_before,
            cleaning.quality_after,
            cleaning.quality_improvement()
        );
        println!();
        println!("CHANGES");
        println!("{}", "-".repeat(40));
        if cleaning.changes.is_empty() {
            println!("  No operations applied");
        }
        for change in &cleaning.changes {
            println!("  [{}] {}", change.operation, change);
        }
    } else {
        println!(
            "  Rows: {}  Columns: {}",
            report.validation.rows, report.validation.columns
        );
        println!("  Quality: {:.1}/100", score.overall);
    }

    if !report.validation.anomalies.is_empty() {
        println!();
        println!("ANOMALIES");
        println!("{}", "-".repeat(40));
        for anomaly in &report.validation.anomalies {
            println!("  - {}", anomaly.message);
        }
    }
    println!();
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
