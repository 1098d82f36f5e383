//! Conversion of parsed files to analysis-friendly structures.
//!
//! - [`flat`] - one table plus metadata and per-column attributes
//! - [`array`] - labeled 2D/3D arrays
//!
//! Both are available as methods on the profile types and through the
//! profile-independent [`to_flat_table`] and [`to_array`].

pub mod array;
pub mod flat;
pub mod labeled;

#[cfg(test)]
mod tests;

pub use flat::FlatTable;
pub use labeled::{ArrayData, ElementKind, Label, LabeledArray, LabeledAxis};

use crate::config::ArrayOptions;
use crate::error::Result;
use crate::profile::Icsv;
use ndarray::IxDyn;

/// Flatten a file of either profile
pub fn to_flat_table(file: &Icsv) -> Result<FlatTable> {
    match file {
        Icsv::Standard(file) => file.to_flat_table(),
        Icsv::Timeseries(file) => file.to_flat_table(),
    }
}

/// Convert a file of either profile to a labeled array; standard files give
/// two dimensions, timeseries files three
pub fn to_array(file: &Icsv, options: &ArrayOptions) -> Result<LabeledArray<IxDyn>> {
    match file {
        Icsv::Standard(file) => file.to_array(options).map(LabeledArray::into_dyn),
        Icsv::Timeseries(file) => file.to_array(options).map(LabeledArray::into_dyn),
    }
}
