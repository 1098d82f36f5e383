//! Tests for the metadata and fields models

mod fields_tests;
mod metadata_tests;
