//! Conversion of iCSV bodies to labeled arrays.
//!
//! Standard files become `(row, field)` arrays, timeseries files become
//! `(layer, field, time)` arrays. The element type is chosen by scanning
//! every value that ends up in the buffer before anything is allocated.

use super::labeled::{ArrayData, ElementKind, Label, LabeledArray, LabeledAxis};
use crate::config::ArrayOptions;
use crate::constants::{
    DATETIME_OUTPUT_FORMAT, DEFAULT_LAYER_INDEX_COLUMNS, DEFAULT_ROW_INDEX_COLUMNS, TIME_COLUMNS,
    dims,
};
use crate::datetime::datetime_values;
use crate::error::{IcsvError, Result};
use crate::header::{FieldsSection, MetadataSection};
use crate::profile::{Icsv2DTimeseries, IcsvFile};
use crate::table::column_names;
use chrono::NaiveDateTime;
use ndarray::{Array2, Array3, Ix2, Ix3};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// A single value pulled out of a column
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
    Datetime(NaiveDateTime),
}

impl Cell {
    fn kind(&self) -> Option<ElementKind> {
        match self {
            Self::Missing => None,
            Self::Int(_) => Some(ElementKind::Int),
            Self::Float(_) => Some(ElementKind::Float),
            Self::Text(_) | Self::Datetime(_) => Some(ElementKind::Text),
        }
    }

    fn is_numeric_or_missing(&self) -> bool {
        matches!(self, Self::Missing | Self::Int(_) | Self::Float(_))
    }

    fn as_i64(&self) -> i64 {
        match self {
            Self::Int(v) => *v,
            _ => 0,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            _ => f64::NAN,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Self::Missing => None,
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(v) => Some(v.clone()),
            Self::Datetime(v) => Some(v.format(DATETIME_OUTPUT_FORMAT).to_string()),
        }
    }

    fn into_label(self) -> Label {
        match self {
            Self::Missing => Label::Missing,
            Self::Int(v) => Label::Int(v),
            Self::Float(v) => Label::Float(v),
            Self::Text(v) => Label::Text(v),
            Self::Datetime(v) => Label::Datetime(v),
        }
    }
}

/// The `nodata` marker in both of its readings
#[derive(Debug, Default)]
struct Nodata {
    text: Option<String>,
    value: Option<f64>,
}

impl Nodata {
    fn from_metadata(metadata: &MetadataSection) -> Self {
        Self {
            text: metadata.nodata().map(str::to_string),
            value: metadata.nodata_value(),
        }
    }

    fn matches_number(&self, value: f64) -> bool {
        self.value == Some(value)
    }

    fn matches_text(&self, value: &str) -> bool {
        self.text.as_deref() == Some(value.trim())
    }
}

fn column_cells(column: &Column, nodata: &Nodata) -> Result<Vec<Cell>> {
    let series = column.as_materialized_series();
    let dtype = series.dtype();

    let cells = if dtype.is_integer() {
        let cast = series.cast(&DataType::Int64)?;
        cast.i64()?
            .into_iter()
            .map(|value| match value {
                Some(v) if !nodata.matches_number(v as f64) => Cell::Int(v),
                _ => Cell::Missing,
            })
            .collect()
    } else if dtype.is_float() {
        let cast = series.cast(&DataType::Float64)?;
        cast.f64()?
            .into_iter()
            .map(|value| match value {
                Some(v) if !v.is_nan() && !nodata.matches_number(v) => Cell::Float(v),
                _ => Cell::Missing,
            })
            .collect()
    } else if crate::datetime::is_temporal(dtype) {
        datetime_values(series)?
            .into_iter()
            .map(|value| value.map_or(Cell::Missing, Cell::Datetime))
            .collect()
    } else {
        let cast = series.cast(&DataType::String)?;
        cast.str()?
            .into_iter()
            .map(|value| match value {
                Some(v) if !nodata.matches_text(v) => Cell::Text(v.to_string()),
                _ => Cell::Missing,
            })
            .collect()
    };
    Ok(cells)
}

/// Widest element kind over `cells`. Missing values force at least `Float`
/// so they can be stored as NaN; `missing_possible` does the same for
/// buffers that may contain unfilled slots.
fn widest_kind<'a, I>(cells: I, missing_possible: bool) -> ElementKind
where
    I: IntoIterator<Item = &'a Cell>,
{
    let mut widest = None;
    let mut has_missing = missing_possible;
    for cell in cells {
        match cell.kind() {
            Some(kind) => widest = widest.max(Some(kind)),
            None => has_missing = true,
        }
    }
    match widest {
        Some(ElementKind::Int) if has_missing => ElementKind::Float,
        Some(kind) => kind,
        None => ElementKind::Float,
    }
}

/// Resolve the index column against the available names
fn resolve_index_column(
    names: &[String],
    explicit: Option<&str>,
    defaults: &[&str],
) -> Result<Option<String>> {
    if let Some(name) = explicit {
        return match names.iter().any(|n| n == name) {
            true => Ok(Some(name.to_string())),
            false => Err(IcsvError::format(format!(
                "index column '{}' not found in data",
                name
            ))),
        };
    }
    Ok(defaults
        .iter()
        .find(|candidate| names.iter().any(|n| n == **candidate))
        .map(|name| name.to_string()))
}

/// Order columns by their position in `fields`; undeclared columns keep
/// their relative order at the end
fn order_by_declaration(names: &mut [String], fields: &FieldsSection) {
    names.sort_by_key(|name| fields.position(name).unwrap_or(usize::MAX));
}

/// Keep candidates whose sampled values are all numeric or missing
fn numeric_candidates(
    candidates: Vec<String>,
    sample: &BTreeMap<String, Vec<Cell>>,
) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|name| {
            let keep = sample
                .get(name)
                .is_some_and(|cells| cells.iter().all(Cell::is_numeric_or_missing));
            if !keep {
                debug!("Dropping non-numeric column '{}'", name);
            }
            keep
        })
        .collect()
}

impl IcsvFile {
    /// Convert the body to a `(row, field)` array
    pub fn to_array(&self, options: &ArrayOptions) -> Result<LabeledArray<Ix2>> {
        let df = self.data();
        let names = column_names(df);
        let index = resolve_index_column(
            &names,
            options.index_column.as_deref(),
            DEFAULT_ROW_INDEX_COLUMNS,
        )?;
        let nodata = Nodata::from_metadata(self.metadata());

        // Extract every column once
        let mut cells = BTreeMap::new();
        for name in &names {
            cells.insert(name.clone(), column_cells(df.column(name)?, &nodata)?);
        }

        // Pick value columns
        let mut selected: Vec<String> = names
            .iter()
            .filter(|name| Some(*name) != index.as_ref())
            .cloned()
            .collect();
        if options.drop_non_numeric {
            selected = numeric_candidates(selected, &cells);
        }
        order_by_declaration(&mut selected, self.fields());
        if selected.is_empty() {
            return Err(IcsvError::format("no columns left for array conversion"));
        }

        // Choose the element type before allocating
        let columns: Vec<&Vec<Cell>> = selected.iter().filter_map(|n| cells.get(n)).collect();
        let kind = widest_kind(columns.iter().flat_map(|c| c.iter()), false);
        let shape = (df.height(), columns.len());
        debug!("Building {:?} array of shape {:?}", kind, shape);

        let data = match kind {
            ElementKind::Int => {
                ArrayData::Int(Array2::from_shape_fn(shape, |(r, c)| columns[c][r].as_i64()))
            }
            ElementKind::Float => {
                ArrayData::Float(Array2::from_shape_fn(shape, |(r, c)| columns[c][r].as_f64()))
            }
            ElementKind::Text => {
                ArrayData::Text(Array2::from_shape_fn(shape, |(r, c)| columns[c][r].as_text()))
            }
        };

        // Row labels
        let row_labels = match &index {
            Some(name) => cells
                .remove(name)
                .unwrap_or_default()
                .into_iter()
                .map(Cell::into_label)
                .collect(),
            None => (1..=df.height() as i64).map(Label::Int).collect(),
        };
        let row_dim = options.resolve_row_dim(index.is_some(), dims::ROW, dims::ROW_FALLBACK);

        LabeledArray::new(
            data,
            vec![
                LabeledAxis::new(row_dim, row_labels),
                LabeledAxis::new(
                    options.col_dim.clone(),
                    selected.into_iter().map(Label::Text).collect(),
                ),
            ],
        )
    }
}

/// Values of one block, aligned with the field axis
struct BlockCells {
    height: usize,
    index: Option<Vec<Cell>>,
    fields: Vec<Option<Vec<Cell>>>,
}

impl Icsv2DTimeseries {
    /// Convert all blocks to a `(layer, field, time)` array
    pub fn to_array(&self, options: &ArrayOptions) -> Result<LabeledArray<Ix3>> {
        let mut blocks = self.blocks();
        let (_, reference) = blocks
            .next()
            .ok_or_else(|| IcsvError::format("timeseries has no blocks"))?;
        let names = column_names(reference);
        let index = resolve_index_column(
            &names,
            options.index_column.as_deref(),
            DEFAULT_LAYER_INDEX_COLUMNS,
        )?;
        let nodata = Nodata::from_metadata(self.metadata());

        // The first block decides which fields are numeric
        let mut sample = BTreeMap::new();
        for name in &names {
            sample.insert(name.clone(), column_cells(reference.column(name)?, &nodata)?);
        }

        let mut selected: Vec<String> = names
            .iter()
            .filter(|name| Some(*name) != index.as_ref())
            .filter(|name| !TIME_COLUMNS.contains(&name.as_str()))
            .cloned()
            .collect();
        if options.drop_non_numeric {
            selected = numeric_candidates(selected, &sample);
        }
        order_by_declaration(&mut selected, self.fields());
        if selected.is_empty() {
            return Err(IcsvError::format("no columns left for array conversion"));
        }

        // Extract index and value cells of every block
        let mut per_block = Vec::with_capacity(self.len());
        for (_, block) in self.blocks() {
            let index_cells = match &index {
                Some(name) => match block.column(name) {
                    Ok(column) => Some(column_cells(column, &nodata)?),
                    Err(_) => Some(vec![Cell::Missing; block.height()]),
                },
                None => None,
            };
            let mut fields = Vec::with_capacity(selected.len());
            for name in &selected {
                fields.push(match block.column(name) {
                    Ok(column) => Some(column_cells(column, &nodata)?),
                    Err(_) => None,
                });
            }
            per_block.push(BlockCells {
                height: block.height(),
                index: index_cells,
                fields,
            });
        }

        // Layer labels
        let layers: Vec<Label> = match &index {
            Some(_) => {
                let mut unique: Vec<Label> = per_block
                    .iter()
                    .filter_map(|b| b.index.as_ref())
                    .flatten()
                    .filter(|cell| **cell != Cell::Missing)
                    .map(|cell| cell.clone().into_label())
                    .collect();
                unique.sort();
                unique.dedup();
                unique
            }
            None => {
                let max_rows = per_block.iter().map(|b| b.height).max().unwrap_or(0);
                (1..=max_rows as i64).map(Label::Int).collect()
            }
        };
        let positions: BTreeMap<&Label, usize> =
            layers.iter().enumerate().map(|(i, l)| (l, i)).collect();

        // Missing slots are possible whenever blocks differ in height
        let kind = widest_kind(
            per_block
                .iter()
                .flat_map(|b| b.fields.iter().flatten())
                .flatten(),
            true,
        );
        let shape = (layers.len(), selected.len(), self.len());
        debug!("Building {:?} array of shape {:?}", kind, shape);

        // (layer, field, time, value) for every cell that lands in the buffer
        let mut placements = Vec::new();
        for (t, block) in per_block.iter().enumerate() {
            for row in 0..block.height {
                let layer = match &block.index {
                    Some(cells) => match &cells[row] {
                        Cell::Missing => None,
                        cell => positions.get(&cell.clone().into_label()).copied(),
                    },
                    None => Some(row),
                };
                // Unknown or missing index value
                let Some(layer) = layer else { continue };
                for (f, column) in block.fields.iter().enumerate() {
                    if let Some(cells) = column {
                        placements.push((layer, f, t, &cells[row]));
                    }
                }
            }
        }

        // Fill the buffer
        let data = match kind {
            ElementKind::Text => {
                let mut buffer = Array3::<Option<String>>::from_elem(shape, None);
                for (l, f, t, cell) in placements {
                    buffer[[l, f, t]] = cell.as_text();
                }
                ArrayData::Text(buffer)
            }
            _ => {
                let mut buffer = Array3::<f64>::from_elem(shape, f64::NAN);
                for (l, f, t, cell) in placements {
                    buffer[[l, f, t]] = cell.as_f64();
                }
                ArrayData::Float(buffer)
            }
        };

        let layer_dim =
            options.resolve_row_dim(index.is_some(), dims::LAYER, dims::LAYER_FALLBACK);
        LabeledArray::new(
            data,
            vec![
                LabeledAxis::new(layer_dim, layers),
                LabeledAxis::new(
                    options.col_dim.clone(),
                    selected.into_iter().map(Label::Text).collect(),
                ),
                LabeledAxis::new(
                    options.time_dim.clone(),
                    self.dates().iter().copied().map(Label::Datetime).collect(),
                ),
            ],
        )
    }
}
