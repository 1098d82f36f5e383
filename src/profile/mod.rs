//! iCSV file profiles and the top-level reader.
//!
//! The first line of a file selects the profile:
//! - [`standard`] - one table below the header
//! - [`timeseries`] - dated blocks sharing one schema
//!
//! [`read`] classifies the first line and delegates to the matching engine.

pub mod standard;
pub mod timeseries;

#[cfg(test)]
mod tests;

pub use standard::IcsvFile;
pub use timeseries::{Icsv2DTimeseries, append_timepoint};

use crate::config::ReadOptions;
use crate::constants::{
    DATA_MARKER, FIELDS_MARKER, KEY_VALUE_SEPARATOR, METADATA_MARKER, VERSION_2DTIMESERIES,
    VERSION_STANDARD, field_keys,
};
use crate::error::{IcsvError, Result};
use crate::geometry::Geometry;
use crate::header::{FieldsSection, MetadataSection};
use crate::table;
use polars::prelude::DataFrame;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// File layout announced by the first line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Standard,
    Timeseries2D,
}

impl Profile {
    /// Classify a first line; `None` when it is not an iCSV version line
    pub fn classify(first_line: &str) -> Option<Self> {
        match first_line.trim_end() {
            VERSION_STANDARD => Some(Self::Standard),
            VERSION_2DTIMESERIES => Some(Self::Timeseries2D),
            _ => None,
        }
    }

    pub fn version_line(&self) -> &'static str {
        match self {
            Self::Standard => VERSION_STANDARD,
            Self::Timeseries2D => VERSION_2DTIMESERIES,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Timeseries2D => write!(f, "2D timeseries"),
        }
    }
}

/// A parsed iCSV file of either profile
#[derive(Debug, Clone)]
pub enum Icsv {
    Standard(IcsvFile),
    Timeseries(Icsv2DTimeseries),
}

impl Icsv {
    pub fn profile(&self) -> Profile {
        match self {
            Self::Standard(_) => Profile::Standard,
            Self::Timeseries(_) => Profile::Timeseries2D,
        }
    }

    pub fn metadata(&self) -> &MetadataSection {
        match self {
            Self::Standard(file) => file.metadata(),
            Self::Timeseries(file) => file.metadata(),
        }
    }

    pub fn fields(&self) -> &FieldsSection {
        match self {
            Self::Standard(file) => file.fields(),
            Self::Timeseries(file) => file.fields(),
        }
    }

    pub fn geometry(&self) -> &Geometry {
        match self {
            Self::Standard(file) => file.geometry(),
            Self::Timeseries(file) => file.geometry(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        match self {
            Self::Standard(file) => file.write(path),
            Self::Timeseries(file) => file.write(path),
        }
    }

    pub fn as_standard(&self) -> Option<&IcsvFile> {
        match self {
            Self::Standard(file) => Some(file),
            Self::Timeseries(_) => None,
        }
    }

    pub fn as_timeseries(&self) -> Option<&Icsv2DTimeseries> {
        match self {
            Self::Timeseries(file) => Some(file),
            Self::Standard(_) => None,
        }
    }
}

impl From<IcsvFile> for Icsv {
    fn from(file: IcsvFile) -> Self {
        Self::Standard(file)
    }
}

impl From<Icsv2DTimeseries> for Icsv {
    fn from(file: Icsv2DTimeseries) -> Self {
        Self::Timeseries(file)
    }
}

impl fmt::Display for Icsv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(file) => fmt::Display::fmt(file, f),
            Self::Timeseries(file) => fmt::Display::fmt(file, f),
        }
    }
}

/// Read a file of either profile with default options
pub fn read(path: &Path) -> Result<Icsv> {
    read_with_options(path, &ReadOptions::default())
}

/// Read a file of either profile
pub fn read_with_options(path: &Path, options: &ReadOptions) -> Result<Icsv> {
    let first_line = read_first_line(path)?;
    let profile = Profile::classify(&first_line).ok_or_else(|| {
        IcsvError::format(format!("{}: not an iCSV file", path.display()))
    })?;

    debug!("Reading {} as {} profile", path.display(), profile);
    match profile {
        Profile::Standard => IcsvFile::read(path).map(Icsv::Standard),
        Profile::Timeseries2D => {
            Icsv2DTimeseries::read_with_options(path, options).map(Icsv::Timeseries)
        }
    }
}

fn read_first_line(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line)
}

/// Check the version line read from `lines`
pub(crate) fn expect_version<I>(lines: &mut I, profile: Profile) -> Result<()>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let first = lines.next().transpose()?.unwrap_or_default();
    match Profile::classify(&first) {
        Some(found) if found == profile => Ok(()),
        Some(found) => Err(IcsvError::format(format!(
            "expected a {} file, found a {} file",
            profile, found
        ))),
        None => Err(IcsvError::format("not an iCSV file")),
    }
}

/// Prefix a format error with the line it was found on
pub(crate) fn at_line(err: IcsvError, line_no: usize) -> IcsvError {
    match err {
        IcsvError::Format { reason } => IcsvError::format(format!("line {}: {}", line_no, reason)),
        other => other,
    }
}

/// Lines of a file from index `skip` (0-based) onwards
pub(crate) fn read_lines_from(path: &Path, skip: usize) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let lines = BufReader::new(file)
        .lines()
        .skip(skip)
        .collect::<std::io::Result<Vec<_>>>()?;
    Ok(lines)
}

/// Render the version line and both header sections up to `[DATA]`
pub(crate) fn render_header(
    profile: Profile,
    metadata: &MetadataSection,
    fields: &FieldsSection,
) -> String {
    let delimiter = metadata.field_delimiter();
    let mut out = String::new();

    out.push_str(profile.version_line());
    out.push('\n');

    out.push_str(&format!("# {}\n", METADATA_MARKER));
    for (key, value) in metadata.flatten() {
        out.push_str(&format!("# {} = {}\n", key, value));
    }

    out.push_str(&format!("# {}\n", FIELDS_MARKER));
    out.push_str(&format!(
        "# {} = {}\n",
        field_keys::FIELDS,
        fields.fields.join(delimiter)
    ));
    for (key, values) in fields.attributes() {
        out.push_str(&format!("# {} = {}\n", key, values.join(delimiter)));
    }

    out.push_str(&format!("# {}\n", DATA_MARKER));
    out
}

/// Reject header text that would not parse back.
///
/// Keys and values cannot span lines or contain `=`. Field names and
/// attribute values are joined with the delimiter, so they cannot contain it.
pub(crate) fn check_header(metadata: &MetadataSection, fields: &FieldsSection) -> Result<()> {
    let delimiter = metadata.field_delimiter();
    let unwritable =
        |text: &str| text.contains(['\n', '\r']) || text.contains(KEY_VALUE_SEPARATOR);

    for (key, value) in metadata.flatten() {
        if unwritable(key.as_str()) || unwritable(value.as_str()) {
            return Err(IcsvError::format(format!(
                "metadata entry '{}' cannot be written: keys and values must be single-line \
                 and free of '{}'",
                key, KEY_VALUE_SEPARATOR
            )));
        }
    }

    let entries = std::iter::once((field_keys::FIELDS, fields.fields.as_slice()))
        .chain(fields.attributes());
    for (key, values) in entries {
        if unwritable(key) {
            return Err(IcsvError::format(format!(
                "field attribute name '{}' cannot be written",
                key
            )));
        }
        if let Some(value) = values
            .iter()
            .find(|value| unwritable(value.as_str()) || value.contains(delimiter))
        {
            return Err(IcsvError::format(format!(
                "value '{}' of field attribute '{}' cannot be written: it contains a line \
                 break, '{}' or the field delimiter '{}'",
                value, key, KEY_VALUE_SEPARATOR, delimiter
            )));
        }
    }

    Ok(())
}

/// Validate a loaded body against the fields, then name and type it
pub(crate) fn prepare_frame(mut df: DataFrame, fields: &FieldsSection) -> Result<DataFrame> {
    if df.width() == 0 && df.height() == 0 {
        df = table::empty_frame(&fields.fields)?;
    }

    fields.validate(df.width())?;
    table::rename_columns(&mut df, &fields.fields)?;
    crate::datetime::coerce_time_columns(&mut df)?;
    Ok(df)
}
