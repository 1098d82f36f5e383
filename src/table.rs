//! Delimited-text I/O for data bodies.
//!
//! Thin layer over the Polars CSV reader and writer: data rows never carry
//! a header line, comment and blank lines are dropped before parsing, and
//! timestamps are written in a fixed ISO layout.

use crate::constants::{COMMENT_PREFIX, DATETIME_OUTPUT_FORMAT};
use crate::error::{IcsvError, Result};
use polars::prelude::*;
use std::io::{Cursor, Write};
use std::path::Path;

/// Single-byte separator for the Polars reader/writer
pub fn separator_byte(delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(IcsvError::format(format!(
            "field delimiter must be a single ASCII character, got '{}'",
            delimiter
        ))),
    }
}

/// Whether a raw data line holds a record
pub fn is_record_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with(COMMENT_PREFIX)
}

/// Parse data lines into a frame with positional `column_N` names.
///
/// Comment and blank lines are skipped. Every record must hold exactly
/// `width` values; `first_line_no` is the file line number of the first
/// element of `lines` and is used in error messages. An empty body yields
/// an empty frame with no columns; callers that know the schema use
/// [`empty_frame`].
pub fn read_delimited<I, S>(
    lines: I,
    delimiter: &str,
    width: usize,
    first_line_no: usize,
) -> Result<DataFrame>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let separator = separator_byte(delimiter)?;

    // Keep only records, remembering where each one came from
    let mut buffer = String::new();
    let mut line_numbers = Vec::new();
    for (offset, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if is_record_line(line) {
            buffer.push_str(line.trim_end_matches(['\r', '\n']));
            buffer.push('\n');
            line_numbers.push(first_line_no + offset);
        }
    }

    if buffer.is_empty() {
        return Ok(DataFrame::empty());
    }

    check_record_widths(&buffer, &line_numbers, separator, width)?;

    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| opts.with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(buffer.into_bytes()))
        .finish()?;

    Ok(df)
}

/// Reject any record whose value count differs from `width`.
///
/// The Polars reader pads short rows with nulls, so the count is taken
/// with a quote-aware split before loading.
fn check_record_widths(
    buffer: &str,
    line_numbers: &[usize],
    separator: u8,
    width: usize,
) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(separator)
        .from_reader(buffer.as_bytes());

    for (record, line_no) in reader.records().zip(line_numbers.iter().copied()) {
        let record = record.map_err(|e| {
            IcsvError::format(format!("line {}: unreadable record: {}", line_no, e))
        })?;
        if record.len() != width {
            return Err(IcsvError::format(format!(
                "line {}: number of fields ({}) does not match number of values ({})",
                line_no,
                width,
                record.len()
            )));
        }
    }
    Ok(())
}

/// Read a plain CSV file whose first line names the columns
pub fn read_with_header(path: &Path, delimiter: &str) -> Result<DataFrame> {
    let separator = separator_byte(delimiter)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| opts.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Zero-row frame with one text column per name
pub fn empty_frame(names: &[String]) -> Result<DataFrame> {
    let columns = names
        .iter()
        .map(|name| Column::new_empty(name.as_str().into(), &DataType::String))
        .collect::<Vec<_>>();
    Ok(DataFrame::new(columns)?)
}

/// Write a frame as delimited rows without a header line
pub fn write_delimited<W: Write>(writer: &mut W, df: &DataFrame, delimiter: &str) -> Result<()> {
    write_frame(writer, df, delimiter, false)
}

/// Write a frame as a plain CSV file with a header line
pub fn write_with_header<W: Write>(
    writer: &mut W,
    df: &DataFrame,
    delimiter: &str,
) -> Result<()> {
    write_frame(writer, df, delimiter, true)
}

fn write_frame<W: Write>(
    writer: &mut W,
    df: &DataFrame,
    delimiter: &str,
    include_header: bool,
) -> Result<()> {
    let separator = separator_byte(delimiter)?;
    if df.height() == 0 && !include_header {
        return Ok(());
    }

    let mut df = df.clone();
    CsvWriter::new(writer)
        .include_header(include_header)
        .with_separator(separator)
        .with_datetime_format(Some(DATETIME_OUTPUT_FORMAT.to_string()))
        .finish(&mut df)?;
    Ok(())
}

/// Rename columns positionally to the declared field names
pub fn rename_columns(df: &mut DataFrame, names: &[String]) -> Result<()> {
    df.set_column_names(names.iter().map(String::as_str))?;
    Ok(())
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}
