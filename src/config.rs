//! Options for reading files and converting them to arrays.
//!
//! Both option sets are plain serde structures with builder methods so that
//! they can be filled from command-line arguments or a configuration file.

use crate::constants::dims;
use serde::{Deserialize, Serialize};

/// Options applied while reading a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// chrono format of `[DATE=...]` tokens; `None` tries the standard
    /// timestamp layouts
    pub date_format: Option<String>,
}

impl ReadOptions {
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }
}

/// Options for [`crate::convert::to_array`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayOptions {
    /// Name of the row (2D) or layer (3D) dimension. `None` selects the
    /// default, which falls back to a positional name when no index column
    /// is used.
    pub row_dim: Option<String>,

    /// Name of the field dimension
    pub col_dim: String,

    /// Name of the time dimension of 3D arrays
    pub time_dim: String,

    /// Column whose values label the rows/layers. `None` picks a
    /// conventional column when present.
    pub index_column: Option<String>,

    /// Drop columns that are not numeric or entirely missing
    pub drop_non_numeric: bool,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            row_dim: None,
            col_dim: dims::FIELD.to_string(),
            time_dim: dims::TIME.to_string(),
            index_column: None,
            drop_non_numeric: true,
        }
    }
}

impl ArrayOptions {
    pub fn with_row_dim(mut self, name: impl Into<String>) -> Self {
        self.row_dim = Some(name.into());
        self
    }

    pub fn with_col_dim(mut self, name: impl Into<String>) -> Self {
        self.col_dim = name.into();
        self
    }

    pub fn with_time_dim(mut self, name: impl Into<String>) -> Self {
        self.time_dim = name.into();
        self
    }

    pub fn with_index_column(mut self, column: impl Into<String>) -> Self {
        self.index_column = Some(column.into());
        self
    }

    /// Keep text and other non-numeric columns
    pub fn keep_non_numeric(mut self) -> Self {
        self.drop_non_numeric = false;
        self
    }

    /// Resolve the row/layer dimension name.
    ///
    /// An explicit name always wins. Otherwise `default` is used when an
    /// index column labels the axis and `fallback` when rows are numbered.
    pub(crate) fn resolve_row_dim(&self, has_index: bool, default: &str, fallback: &str) -> String {
        match &self.row_dim {
            Some(name) => name.clone(),
            None if has_index => default.to_string(),
            None => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_options_defaults() {
        let options = ArrayOptions::default();
        assert_eq!(options.row_dim, None);
        assert_eq!(options.col_dim, "field");
        assert_eq!(options.time_dim, "time");
        assert!(options.drop_non_numeric);
    }

    #[test]
    fn test_resolve_row_dim() {
        let options = ArrayOptions::default();
        assert_eq!(options.resolve_row_dim(true, "time", "index"), "time");
        assert_eq!(options.resolve_row_dim(false, "time", "index"), "index");

        let options = options.with_row_dim("time");
        assert_eq!(options.resolve_row_dim(false, "time", "index"), "time");
    }

    #[test]
    fn test_read_options_serde() {
        let options = ReadOptions::default().with_date_format("%Y-%m-%d");
        let json = serde_json::to_string(&options).unwrap();
        let back: ReadOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
