//! Command-line argument definitions for the `icsv` tool
//!
//! Uses the clap derive API with one subcommand per file operation.

use crate::config::ReadOptions;
use crate::constants::DEFAULT_DATE_FORMAT;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the iCSV tool
#[derive(Debug, Clone, Parser)]
#[command(
    name = "icsv",
    version,
    about = "Inspect, validate and convert iCSV files",
    long_about = "Reads standard and 2D-timeseries iCSV files, reports their metadata, \
                  flattens them into plain CSV and appends dated blocks to timeseries files."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// chrono format of `[DATE=...]` markers when reading timeseries files
    #[arg(long = "date-format", value_name = "FORMAT", global = true)]
    pub date_format: Option<String>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show profile, metadata, fields and data shape of a file
    Info(InfoArgs),
    /// Fully read one or more files and report whether they are valid
    Validate(ValidateArgs),
    /// Write a file as one plain CSV table with a header row
    Flatten(FlattenArgs),
    /// Append a dated block to a timeseries file
    Append(AppendArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct InfoArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
pub struct FlattenArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output CSV path
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Parser)]
pub struct AppendArgs {
    /// Timeseries file to extend
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Date of the new block
    #[arg(long, value_name = "DATE")]
    pub date: String,

    /// Plain CSV file with a header row holding the block rows
    #[arg(long, value_name = "CSV")]
    pub block: PathBuf,

    /// Delimiter of the timeseries file; read from its header when omitted
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<String>,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            date_format: self.date_format.clone(),
        }
    }

    /// Format used for `[DATE=...]` markers written by `append`
    pub fn marker_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }
}
