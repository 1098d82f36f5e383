//! Command implementations for the `icsv` tool

use crate::cli::args::{AppendArgs, Args, Commands, FlattenArgs, InfoArgs, ValidateArgs};
use crate::datetime::{format_datetime, parse_with_format, try_parse_datetime};
use crate::profile::{Icsv, append_timepoint, read_with_options};
use crate::{convert, table};
use anyhow::{Context, Result, bail};
use colored::*;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use tracing::{debug, info};

/// Run the selected command. Returns `false` when the command finished but
/// reported failures (e.g. invalid files).
pub fn run(args: Args) -> Result<bool> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Commands::Info(info_args) => run_info(&args, info_args).map(|_| true),
        Commands::Validate(validate_args) => Ok(run_validate(&args, validate_args)),
        Commands::Flatten(flatten_args) => run_flatten(&args, flatten_args).map(|_| true),
        Commands::Append(append_args) => run_append(&args, append_args).map(|_| true),
    }
}

fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    // RUST_LOG overrides the verbosity flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("icsv={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Serializable overview of a file
#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub profile: String,
    pub geometry: String,
    pub metadata: IndexMap<String, String>,
    pub fields: Vec<String>,
    pub column_attributes: IndexMap<String, IndexMap<String, String>>,
    pub dates: Vec<String>,
    pub rows: usize,
    pub columns: usize,
}

impl FileSummary {
    pub fn from_file(file: &Icsv) -> Self {
        let (dates, rows) = match file {
            Icsv::Standard(standard) => (Vec::new(), standard.data().height()),
            Icsv::Timeseries(timeseries) => (
                timeseries
                    .dates()
                    .iter()
                    .map(|d| {
                        format_datetime(d, timeseries.out_datefmt())
                            .unwrap_or_else(|_| d.to_string())
                    })
                    .collect(),
                timeseries.blocks().map(|(_, block)| block.height()).sum(),
            ),
        };
        Self {
            profile: file.profile().to_string(),
            geometry: file.geometry().to_string(),
            metadata: file.metadata().flatten(),
            fields: file.fields().fields.clone(),
            column_attributes: file.fields().column_attributes(),
            dates,
            rows,
            columns: file.fields().len(),
        }
    }
}

fn run_info(args: &Args, info_args: &InfoArgs) -> Result<()> {
    let file = read_with_options(&info_args.file, &args.read_options())
        .with_context(|| format!("Failed to read {}", info_args.file.display()))?;
    let summary = FileSummary::from_file(&file);

    // Machine-readable output
    if info_args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    // Human-readable output
    println!(
        "{} {}",
        info_args.file.display().to_string().bright_white().bold(),
        format!("({} profile)", summary.profile).bright_green()
    );
    println!("  {:<12} {}", "geometry:".cyan(), summary.geometry);
    for (key, value) in &summary.metadata {
        println!("  {:<12} {}", format!("{}:", key).cyan(), value);
    }
    println!("  {:<12} {}", "fields:".cyan(), summary.fields.join(", "));
    if let (Some(first), Some(last)) = (summary.dates.first(), summary.dates.last()) {
        println!(
            "  {:<12} {} ({} to {})",
            "dates:".cyan(),
            summary.dates.len().to_string().bright_white().bold(),
            first,
            last
        );
    }
    println!(
        "  {:<12} {} rows x {} columns",
        "data:".cyan(),
        summary.rows.to_string().bright_white().bold(),
        summary.columns
    );
    Ok(())
}

fn run_validate(args: &Args, validate_args: &ValidateArgs) -> bool {
    let options = args.read_options();
    let mut failed = 0;

    for path in &validate_args.files {
        match read_with_options(path, &options) {
            Ok(file) => {
                info!("{} is a valid {} file", path.display(), file.profile());
                println!("{} {}", "ok".bright_green().bold(), path.display());
            }
            Err(error) => {
                failed += 1;
                println!(
                    "{} {}: {}",
                    "FAILED".bright_red().bold(),
                    path.display(),
                    error
                );
            }
        }
    }

    // Summary
    if failed > 0 {
        println!(
            "\n{} of {} files failed validation",
            failed.to_string().bright_red().bold(),
            validate_args.files.len()
        );
    }
    failed == 0
}

fn run_flatten(args: &Args, flatten_args: &FlattenArgs) -> Result<()> {
    let file = read_with_options(&flatten_args.file, &args.read_options())
        .with_context(|| format!("Failed to read {}", flatten_args.file.display()))?;
    let flat = convert::to_flat_table(&file)?;

    // Write as plain CSV with a header line
    let out = File::create(&flatten_args.output)
        .with_context(|| format!("Failed to create {}", flatten_args.output.display()))?;
    let mut writer = BufWriter::new(out);
    table::write_with_header(&mut writer, &flat.data, ",")?;

    println!(
        "{} {} rows to {}",
        "Wrote".bright_green().bold(),
        flat.data.height(),
        flatten_args.output.display()
    );
    Ok(())
}

fn run_append(args: &Args, append_args: &AppendArgs) -> Result<()> {
    let date = match &args.date_format {
        Some(format) => parse_with_format(&append_args.date, format),
        None => try_parse_datetime(&append_args.date),
    }
    .with_context(|| format!("Invalid date '{}'", append_args.date))?;

    // Fall back to the delimiter declared in the target file
    let delimiter = match &append_args.delimiter {
        Some(delimiter) => delimiter.clone(),
        None => {
            let file = read_with_options(&append_args.file, &args.read_options())
                .with_context(|| format!("Failed to read {}", append_args.file.display()))?;
            if file.as_timeseries().is_none() {
                bail!(
                    "{} is a {} file; only timeseries files take dated blocks",
                    append_args.file.display(),
                    file.profile()
                );
            }
            file.metadata().field_delimiter().to_string()
        }
    };

    // Load the block and append it
    let block = table::read_with_header(&append_args.block, ",")
        .with_context(|| format!("Failed to read block {}", append_args.block.display()))?;
    append_timepoint(
        &append_args.file,
        &date,
        &block,
        &delimiter,
        Some(args.marker_format()),
    )?;

    println!(
        "{} {} rows for {} to {}",
        "Appended".bright_green().bold(),
        block.height(),
        date,
        append_args.file.display()
    );
    Ok(())
}
