//! Error handling for iCSV operations.
//!
//! Every structural problem with an iCSV file or with the values used to
//! build one is reported as [`IcsvError::Format`]. I/O and Polars failures
//! from the underlying collaborators are wrapped transparently.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IcsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid iCSV format: {reason}")]
    Format { reason: String },
}

impl IcsvError {
    /// Create a format error with the given cause
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    /// Whether this error describes a malformed file or header
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}

pub type Result<T> = std::result::Result<T, IcsvError>;
