//! The `[FIELDS]` section: declared column names and per-column attribute
//! vectors.

use crate::constants::field_keys;
use crate::error::{IcsvError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Value handed to [`FieldsSection::build`] for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    Scalar(String),
    Sequence(Vec<String>),
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Sequence(values)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Sequence(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

/// Per-column attributes with a defined meaning; empty when not given
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedFields {
    pub units_multiplier: Vec<String>,
    pub units: Vec<String>,
    pub long_name: Vec<String>,
    pub standard_name: Vec<String>,
}

impl RecommendedFields {
    fn slot(&mut self, key: &str) -> Option<&mut Vec<String>> {
        match key {
            field_keys::UNITS_MULTIPLIER => Some(&mut self.units_multiplier),
            field_keys::UNITS => Some(&mut self.units),
            field_keys::LONG_NAME => Some(&mut self.long_name),
            field_keys::STANDARD_NAME => Some(&mut self.standard_name),
            _ => None,
        }
    }

    fn entries(&self) -> [(&'static str, &Vec<String>); 4] {
        [
            (field_keys::UNITS_MULTIPLIER, &self.units_multiplier),
            (field_keys::UNITS, &self.units),
            (field_keys::LONG_NAME, &self.long_name),
            (field_keys::STANDARD_NAME, &self.standard_name),
        ]
    }
}

/// Parsed `[FIELDS]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsSection {
    pub fields: Vec<String>,
    pub recommended: RecommendedFields,
    pub other: IndexMap<String, Vec<String>>,
}

impl FieldsSection {
    /// Create a section declaring only column names
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut kv = IndexMap::new();
        kv.insert(
            field_keys::FIELDS.to_string(),
            AttributeValue::Sequence(fields),
        );
        Self::build(kv)
    }

    /// Build a section from key/value pairs.
    ///
    /// `fields` is mandatory and must be a sequence. Attribute values must be
    /// sequences too; a scalar attribute is dropped with a warning rather
    /// than widened to a vector.
    pub fn build(mut fields_kv: IndexMap<String, AttributeValue>) -> Result<Self> {
        let fields = match fields_kv.shift_remove(field_keys::FIELDS) {
            Some(AttributeValue::Sequence(fields)) => fields,
            Some(AttributeValue::Scalar(field)) => {
                return Err(IcsvError::format(format!(
                    "'fields' must be a sequence of column names, got scalar '{}'",
                    field
                )));
            }
            None => {
                return Err(IcsvError::format(
                    "fields section does not define 'fields'",
                ));
            }
        };

        if fields.is_empty() {
            return Err(IcsvError::format("'fields' must name at least one column"));
        }

        let mut recommended = RecommendedFields::default();
        let mut other = IndexMap::new();

        for (key, value) in fields_kv {
            let values = match value {
                AttributeValue::Sequence(values) => values,
                AttributeValue::Scalar(value) => {
                    warn!(
                        "Dropping field attribute '{}': expected one value per column, got scalar '{}'",
                        key, value
                    );
                    continue;
                }
            };
            match recommended.slot(&key) {
                Some(slot) => *slot = values,
                None => {
                    other.insert(key, values);
                }
            }
        }

        Ok(Self {
            fields,
            recommended,
            other,
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a column in the declaration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Non-empty attribute vectors, excluding `fields`, in serialization
    /// order: recommended first, then other keys
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.recommended
            .entries()
            .into_iter()
            .map(|(key, values)| (key, values.as_slice()))
            .chain(
                self.other
                    .iter()
                    .map(|(key, values)| (key.as_str(), values.as_slice())),
            )
            .filter(|(_, values)| !values.is_empty())
    }

    /// Look up an attribute vector by name, `fields` included
    pub fn get(&self, key: &str) -> Option<&[String]> {
        if key == field_keys::FIELDS {
            return Some(&self.fields);
        }
        self.attributes()
            .find(|(k, _)| *k == key)
            .map(|(_, values)| values)
    }

    /// Check the column count and every attribute vector against `ncols`.
    /// The first mismatch is reported.
    pub fn validate(&self, ncols: usize) -> Result<()> {
        if self.fields.len() != ncols {
            return Err(IcsvError::format(format!(
                "number of fields ({}) does not match number of columns ({})",
                self.fields.len(),
                ncols
            )));
        }

        for (key, values) in self.attributes() {
            if values.len() != ncols {
                return Err(IcsvError::format(format!(
                    "field attribute '{}' has {} values, expected {}",
                    key,
                    values.len(),
                    ncols
                )));
            }
        }

        Ok(())
    }

    /// Per-column attribute maps; vectors whose length differs from the
    /// column count are skipped
    pub fn column_attributes(&self) -> IndexMap<String, IndexMap<String, String>> {
        let ncols = self.fields.len();
        let mut columns: IndexMap<String, IndexMap<String, String>> = self
            .fields
            .iter()
            .map(|name| (name.clone(), IndexMap::new()))
            .collect();

        for (key, values) in self.attributes().filter(|(_, v)| v.len() == ncols) {
            for (column, value) in self.fields.iter().zip(values) {
                if let Some(attrs) = columns.get_mut(column) {
                    attrs.insert(key.to_string(), value.clone());
                }
            }
        }
        columns
    }

    pub fn with_units(mut self, units: Vec<String>) -> Self {
        self.recommended.units = units;
        self
    }

    pub fn with_units_multiplier(mut self, multipliers: Vec<String>) -> Self {
        self.recommended.units_multiplier = multipliers;
        self
    }

    pub fn with_long_name(mut self, long_names: Vec<String>) -> Self {
        self.recommended.long_name = long_names;
        self
    }

    pub fn with_standard_name(mut self, standard_names: Vec<String>) -> Self {
        self.recommended.standard_name = standard_names;
        self
    }

    pub fn with_other(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        let key = key.into();
        match self.recommended.slot(&key) {
            Some(slot) => *slot = values,
            None => {
                self.other.insert(key, values);
            }
        }
        self
    }
}
