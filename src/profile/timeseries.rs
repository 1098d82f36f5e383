//! 2D-timeseries iCSV files: one header, then a sequence of dated blocks.
//!
//! Reading takes two passes. The scan pass walks the header and counts the
//! rows of every `[DATE=...]` block; the load pass parses the whole data
//! body in one go and splits it at the counted offsets. The total row count
//! of the load pass must match the scan pass.

use super::{
    Profile, at_line, check_header, expect_version, prepare_frame, read_lines_from, render_header,
};
use crate::config::ReadOptions;
use crate::constants::DEFAULT_DATE_FORMAT;
use crate::datetime::{format_datetime, parse_with_format, try_parse_datetime};
use crate::error::{IcsvError, Result};
use crate::geometry::Geometry;
use crate::header::section::strip_comment;
use crate::header::{FieldsSection, MetadataSection, Section, SectionParser};
use crate::table;
use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use regex::Regex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static DATE_MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[DATE=(.*)\]$").expect("valid date marker regex"));

/// Token of a `[DATE=...]` marker line (comment prefix already stripped)
fn date_marker(content: &str) -> Option<&str> {
    DATE_MARKER_PATTERN
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().trim())
}

fn parse_date_token(token: &str, options: &ReadOptions) -> Result<NaiveDateTime> {
    let parsed = match &options.date_format {
        Some(format) => parse_with_format(token, format),
        None => try_parse_datetime(token),
    };
    parsed.ok_or_else(|| IcsvError::format(format!("invalid date in marker: '{}'", token)))
}

/// Result of the scan pass
#[derive(Debug)]
struct BlockScan {
    parser: SectionParser,
    dates: Vec<NaiveDateTime>,
    row_counts: Vec<usize>,
    /// 0-based index of the first line after `[DATA]`
    data_start: Option<usize>,
}

fn scan_blocks(path: &Path, options: &ReadOptions) -> Result<BlockScan> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    expect_version(&mut lines, Profile::Timeseries2D)?;

    let mut scan = BlockScan {
        parser: SectionParser::new(),
        dates: Vec::new(),
        row_counts: Vec::new(),
        data_start: None,
    };
    let mut in_block = false;

    for (index, line) in lines.enumerate().map(|(i, l)| (i + 1, l)) {
        let line = line?;
        let line_no = index + 1;

        if let Some(content) = strip_comment(&line) {
            if scan.parser.section() != Section::Data {
                scan.parser.feed(content).map_err(|e| at_line(e, line_no))?;
                if scan.parser.section() == Section::Data {
                    scan.data_start = Some(index + 1);
                }
                continue;
            }

            // Marker opens a new block
            if let Some(token) = date_marker(content) {
                let date = parse_date_token(token, options).map_err(|e| at_line(e, line_no))?;
                scan.dates.push(date);
                scan.row_counts.push(0);
                in_block = true;
                continue;
            }

            // Only markers may appear once blocks have started
            if in_block {
                return Err(at_line(
                    IcsvError::format(format!(
                        "comments inside a data block are not allowed: '{}'",
                        line.trim()
                    )),
                    line_no,
                ));
            }

            scan.parser.feed(content).map_err(|e| at_line(e, line_no))?;
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        if scan.parser.section() != Section::Data {
            return Err(at_line(
                IcsvError::format("data section was not specified"),
                line_no,
            ));
        }

        // Count the row against the current block
        match scan.row_counts.last_mut() {
            Some(count) => *count += 1,
            None => {
                return Err(at_line(
                    IcsvError::format("no [DATE=...] marker before data lines"),
                    line_no,
                ));
            }
        }
    }

    if scan.parser.section() != Section::Data {
        return Err(IcsvError::format("data section was not specified"));
    }
    if scan.dates.is_empty() {
        return Err(IcsvError::format("no [DATE=...] markers found in data section"));
    }

    debug!(
        "Scanned {} blocks with {} rows in {}",
        scan.dates.len(),
        scan.row_counts.iter().sum::<usize>(),
        path.display()
    );
    Ok(scan)
}

/// Cut one frame into consecutive blocks of the given heights
fn split_blocks(df: &DataFrame, row_counts: &[usize]) -> Vec<DataFrame> {
    let mut offset = 0usize;
    row_counts
        .iter()
        .map(|&count| {
            let block = df.slice(offset as i64, count);
            offset += count;
            block
        })
        .collect()
}

/// A 2D-timeseries file held in memory
#[derive(Debug, Clone)]
pub struct Icsv2DTimeseries {
    metadata: MetadataSection,
    fields: FieldsSection,
    geometry: Geometry,
    dates: Vec<NaiveDateTime>,
    blocks: Vec<DataFrame>,
    out_datefmt: String,
}

impl Icsv2DTimeseries {
    /// Assemble a file from a header and dated blocks, in the given order.
    ///
    /// Every block must have one column per declared field.
    pub fn new(
        metadata: MetadataSection,
        fields: FieldsSection,
        blocks: Vec<(NaiveDateTime, DataFrame)>,
    ) -> Result<Self> {
        if blocks.is_empty() {
            return Err(IcsvError::format("a timeseries needs at least one date"));
        }

        let geometry = Geometry::parse(&metadata.required.geometry, &metadata.required.srid)?;

        let mut dates = Vec::with_capacity(blocks.len());
        let mut frames = Vec::with_capacity(blocks.len());
        for (date, block) in blocks {
            let block = prepare_frame(block, &fields).map_err(|e| match e {
                IcsvError::Format { reason } => {
                    IcsvError::format(format!("block {}: {}", date, reason))
                }
                other => other,
            })?;
            dates.push(date);
            frames.push(block);
        }

        Ok(Self {
            metadata,
            fields,
            geometry,
            dates,
            blocks: frames,
            out_datefmt: DEFAULT_DATE_FORMAT.to_string(),
        })
    }

    /// Read a timeseries file with default options
    pub fn read(path: &Path) -> Result<Self> {
        Self::read_with_options(path, &ReadOptions::default())
    }

    /// Read a timeseries file
    pub fn read_with_options(path: &Path, options: &ReadOptions) -> Result<Self> {
        let scan = scan_blocks(path, options)?;
        let (metadata, fields) = scan.parser.finish()?;
        let geometry = Geometry::parse(&metadata.required.geometry, &metadata.required.srid)?;

        // Load every block at once, then cut at the scanned row counts
        let body = match scan.data_start {
            Some(start) => read_lines_from(path, start)?,
            None => Vec::new(),
        };
        let first_line_no = scan.data_start.map_or(1, |start| start + 1);
        let raw =
            table::read_delimited(&body, metadata.field_delimiter(), fields.len(), first_line_no)?;

        // Both passes must agree on the number of records
        let expected_rows: usize = scan.row_counts.iter().sum();
        if raw.height() != expected_rows {
            return Err(IcsvError::format(format!(
                "data section has {} rows but the date blocks account for {}",
                raw.height(),
                expected_rows
            )));
        }

        let data = prepare_frame(raw, &fields)?;
        let blocks = split_blocks(&data, &scan.row_counts);

        Ok(Self {
            metadata,
            fields,
            geometry,
            dates: scan.dates,
            blocks,
            out_datefmt: DEFAULT_DATE_FORMAT.to_string(),
        })
    }

    /// Set the chrono format used for `[DATE=...]` markers when writing
    pub fn with_out_datefmt(mut self, format: impl Into<String>) -> Self {
        self.out_datefmt = format.into();
        self
    }

    /// Write the file. Nothing is written when validation fails.
    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        debug!(
            "Wrote {} blocks to {}",
            self.dates.len(),
            path.display()
        );
        Ok(())
    }

    /// Serialize header and all blocks to memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        for block in &self.blocks {
            self.fields.validate(block.width())?;
        }
        check_header(&self.metadata, &self.fields)?;

        let delimiter = self.metadata.field_delimiter();
        let mut out = render_header(Profile::Timeseries2D, &self.metadata, &self.fields).into_bytes();
        // One marker line per block, then its rows
        for (date, block) in self.blocks() {
            let marker = format_datetime(date, &self.out_datefmt)?;
            writeln!(out, "# [DATE={}]", marker)?;
            table::write_delimited(&mut out, block, delimiter)?;
        }
        Ok(out)
    }

    pub fn metadata(&self) -> &MetadataSection {
        &self.metadata
    }

    pub fn fields(&self) -> &FieldsSection {
        &self.fields
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn dates(&self) -> &[NaiveDateTime] {
        &self.dates
    }

    pub fn out_datefmt(&self) -> &str {
        &self.out_datefmt
    }

    /// First block stored for `date`
    pub fn block(&self, date: &NaiveDateTime) -> Option<&DataFrame> {
        self.dates
            .iter()
            .position(|d| d == date)
            .map(|index| &self.blocks[index])
    }

    /// Dates with their blocks, in stored order
    pub fn blocks(&self) -> impl Iterator<Item = (&NaiveDateTime, &DataFrame)> {
        self.dates.iter().zip(self.blocks.iter())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl fmt::Display for Icsv2DTimeseries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "iCSV file (2D timeseries profile)")?;
        writeln!(f, "  geometry: {}", self.geometry)?;
        for (key, value) in self.metadata.flatten() {
            writeln!(f, "  {}: {}", key, value)?;
        }
        writeln!(f, "  fields: {}", self.fields.fields.join(", "))?;
        match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "  dates: {} blocks from {} to {}",
                self.dates.len(),
                first,
                last
            ),
            _ => write!(f, "  dates: none"),
        }
    }
}

/// Append one dated block to an existing timeseries file.
///
/// The file is not parsed: the caller guarantees that `block` matches the
/// stored fields and delimiter. A mismatch only shows up on the next read.
pub fn append_timepoint(
    path: &Path,
    date: &NaiveDateTime,
    block: &DataFrame,
    field_delimiter: &str,
    date_format: Option<&str>,
) -> Result<()> {
    let marker = format_datetime(date, date_format.unwrap_or(DEFAULT_DATE_FORMAT))?;

    let mut out = Vec::new();
    writeln!(out, "# [DATE={}]", marker)?;
    table::write_delimited(&mut out, block, field_delimiter)?;

    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(&out)?;
    debug!(
        "Appended block {} with {} rows to {}",
        marker,
        block.height(),
        path.display()
    );
    Ok(())
}
