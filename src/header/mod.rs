//! iCSV header model and parsing
//!
//! The header of every iCSV file is a run of comment lines split into a
//! `[METADATA]` and a `[FIELDS]` section, closed by the `[DATA]` marker.
//!
//! - [`metadata`] - required/recommended/other metadata keys
//! - [`fields`] - column names and per-column attribute vectors
//! - [`section`] - line classifier shared by both file profiles

pub mod fields;
pub mod metadata;
pub mod section;

#[cfg(test)]
mod tests;

pub use fields::{AttributeValue, FieldsSection, RecommendedFields};
pub use metadata::{MetadataSection, RecommendedMetadata, RequiredMetadata};
pub use section::{Section, SectionParser};
