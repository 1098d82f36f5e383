//! Timestamp parsing and column coercion.
//!
//! Columns named `time` or `timestamp` are converted to datetime columns
//! after loading, but only when every value parses. A column with a single
//! unparsable value is left exactly as it was read.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

/// Patterns tried in order before the generic fallbacks
const DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Try the known timestamp layouts, first match wins
pub fn try_parse_datetime(token: &str) -> Option<NaiveDateTime> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    DATETIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(token, pattern).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(token)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(token, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse a date marker token with an explicit format, falling back to a
/// date-only reading of the same format
pub fn parse_with_format(token: &str, format: &str) -> Option<NaiveDateTime> {
    let token = token.trim();
    NaiveDateTime::parse_from_str(token, format).ok().or_else(|| {
        NaiveDate::parse_from_str(token, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })
}

/// Render a timestamp, reporting an invalid format string as an error
pub fn format_datetime(value: &NaiveDateTime, format: &str) -> crate::Result<String> {
    use std::fmt::Write;

    let mut out = String::new();
    write!(out, "{}", value.format(format)).map_err(|_| {
        crate::IcsvError::format(format!("invalid date format '{}'", format))
    })?;
    Ok(out)
}

pub fn is_temporal(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Convert a text column to datetimes, all or nothing.
///
/// Returns the (possibly new) series and whether it changed. Nulls become
/// null timestamps and never abort the conversion.
pub fn coerce_column(series: &Series) -> PolarsResult<(Series, bool)> {
    if is_temporal(series.dtype()) || series.dtype() != &DataType::String {
        return Ok((series.clone(), false));
    }

    let values = series.str()?;
    let mut parsed = Vec::with_capacity(values.len());
    for value in values.into_iter() {
        match value {
            None => parsed.push(None),
            Some(token) => match try_parse_datetime(token) {
                Some(dt) => parsed.push(Some(dt)),
                None => {
                    debug!(
                        "Column '{}' keeps its text values: '{}' is not a timestamp",
                        series.name(),
                        token
                    );
                    return Ok((series.clone(), false));
                }
            },
        }
    }

    let coerced = DatetimeChunked::from_naive_datetime_options(
        series.name().clone(),
        parsed,
        TimeUnit::Milliseconds,
    )
    .into_series();
    Ok((coerced, true))
}

/// Coerce every `time`/`timestamp` column of a frame in place
pub fn coerce_time_columns(df: &mut DataFrame) -> PolarsResult<()> {
    for name in crate::constants::TIME_COLUMNS {
        let Ok(column) = df.column(name) else {
            continue;
        };
        let (coerced, changed) = coerce_column(column.as_materialized_series())?;
        if changed {
            debug!("Parsed column '{}' as timestamps", name);
            df.with_column(coerced)?;
        }
    }
    Ok(())
}

/// Read a datetime series back as naive timestamps
pub fn datetime_values(series: &Series) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    match series.dtype() {
        DataType::Datetime(_, _) => Ok(series.datetime()?.as_datetime_iter().collect()),
        DataType::Date => Ok(series
            .date()?
            .as_date_iter()
            .map(|d| d.and_then(|d| d.and_hms_opt(0, 0, 0)))
            .collect()),
        dtype => Err(PolarsError::SchemaMismatch(
            format!("expected a datetime column, got {}", dtype).into(),
        )),
    }
}
