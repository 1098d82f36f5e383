//! iCSV Library
//!
//! Reading, writing and converting iCSV files: CSV data preceded by a
//! commented header carrying station metadata and per-field attributes.
//!
//! This library provides tools for:
//! - Parsing the `[METADATA]`/`[FIELDS]`/`[DATA]` header of both profiles
//! - Loading standard tables and dated 2D timeseries blocks into Polars frames
//! - Writing files back and appending new dated blocks
//! - Flattening files into one table and converting them to labeled arrays

pub mod cli;
pub mod config;
pub mod constants;
pub mod convert;
pub mod datetime;
pub mod error;
pub mod geometry;
pub mod header;
pub mod profile;
pub mod table;

// Re-export commonly used types
pub use config::{ArrayOptions, ReadOptions};
pub use convert::{FlatTable, LabeledArray, to_array, to_flat_table};
pub use error::{IcsvError, Result};
pub use geometry::Geometry;
pub use header::{FieldsSection, MetadataSection};
pub use profile::{
    Icsv, Icsv2DTimeseries, IcsvFile, Profile, append_timepoint, read, read_with_options,
};

/// Write a file of either profile
pub fn write(file: &Icsv, path: &std::path::Path) -> Result<()> {
    file.write(path)
}
