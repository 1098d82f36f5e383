//! Flattening of iCSV files into a single table plus attribute maps.

use crate::constants::DATE_COLUMN;
use crate::error::{IcsvError, Result};
use crate::header::{FieldsSection, MetadataSection};
use crate::profile::{Icsv2DTimeseries, IcsvFile};
use indexmap::IndexMap;
use polars::functions::concat_df_diagonal;
use polars::prelude::*;
use tracing::debug;

/// One table with the file's attributes alongside it
#[derive(Debug, Clone)]
pub struct FlatTable {
    pub data: DataFrame,
    /// File-level metadata, flattened
    pub metadata: IndexMap<String, String>,
    /// Per-column attributes keyed by column name
    pub column_attributes: IndexMap<String, IndexMap<String, String>>,
}

impl FlatTable {
    fn new(data: DataFrame, metadata: &MetadataSection, fields: &FieldsSection) -> Self {
        Self {
            data,
            metadata: metadata.flatten(),
            column_attributes: fields.column_attributes(),
        }
    }
}

impl IcsvFile {
    /// Copy of the body with flattened attributes
    pub fn to_flat_table(&self) -> Result<FlatTable> {
        Ok(FlatTable::new(
            self.data().clone(),
            self.metadata(),
            self.fields(),
        ))
    }
}

impl Icsv2DTimeseries {
    /// All blocks stacked in date order with a `date` column holding the
    /// block date. Columns missing from a block are filled with nulls.
    pub fn to_flat_table(&self) -> Result<FlatTable> {
        if self.fields().position(DATE_COLUMN).is_some() {
            return Err(IcsvError::format(format!(
                "field '{}' collides with the block date column",
                DATE_COLUMN
            )));
        }

        // Tag every row with its block date
        let mut frames = Vec::with_capacity(self.len());
        for (date, block) in self.blocks() {
            let mut frame = block.clone();
            let dates = DatetimeChunked::from_naive_datetime(
                DATE_COLUMN.into(),
                std::iter::repeat_n(*date, block.height()),
                TimeUnit::Milliseconds,
            );
            frame.with_column(dates.into_series())?;
            frames.push(frame);
        }

        let data = concat_df_diagonal(&frames)?;
        debug!(
            "Flattened {} blocks into {} rows",
            frames.len(),
            data.height()
        );
        Ok(FlatTable::new(data, self.metadata(), self.fields()))
    }
}
