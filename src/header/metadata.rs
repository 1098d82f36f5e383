//! The `[METADATA]` section: required keys, recommended keys and a bag of
//! any other key/value pairs.

use crate::constants::metadata_keys;
use crate::error::{IcsvError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keys every iCSV file must define
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredMetadata {
    pub field_delimiter: String,
    pub geometry: String,
    pub srid: String,
}

/// Optional keys with a defined meaning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedMetadata {
    pub station_id: Option<String>,
    pub nodata: Option<String>,
    pub timezone: Option<String>,
    pub doi: Option<String>,
    pub timestamp_meaning: Option<String>,
}

impl RecommendedMetadata {
    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            metadata_keys::STATION_ID => Some(&mut self.station_id),
            metadata_keys::NODATA => Some(&mut self.nodata),
            metadata_keys::TIMEZONE => Some(&mut self.timezone),
            metadata_keys::DOI => Some(&mut self.doi),
            metadata_keys::TIMESTAMP_MEANING => Some(&mut self.timestamp_meaning),
            _ => None,
        }
    }

    /// Set entries in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (metadata_keys::STATION_ID, &self.station_id),
            (metadata_keys::NODATA, &self.nodata),
            (metadata_keys::TIMEZONE, &self.timezone),
            (metadata_keys::DOI, &self.doi),
            (metadata_keys::TIMESTAMP_MEANING, &self.timestamp_meaning),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }
}

/// Parsed `[METADATA]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSection {
    pub required: RequiredMetadata,
    pub recommended: RecommendedMetadata,
    pub other: IndexMap<String, String>,
}

impl MetadataSection {
    /// Create a section holding only the required keys
    pub fn new(
        field_delimiter: impl Into<String>,
        geometry: impl Into<String>,
        srid: impl Into<String>,
    ) -> Result<Self> {
        let mut required = IndexMap::new();
        required.insert(
            metadata_keys::FIELD_DELIMITER.to_string(),
            field_delimiter.into(),
        );
        required.insert(metadata_keys::GEOMETRY.to_string(), geometry.into());
        required.insert(metadata_keys::SRID.to_string(), srid.into());
        Self::build(required, IndexMap::new())
    }

    /// Build a section from required and optional key/value pairs.
    ///
    /// Required keys must be present and non-empty. Optional entries with a
    /// `None` value are dropped; keys that are neither required nor
    /// recommended are kept in [`MetadataSection::other`]. Unknown keys in
    /// `required_kv` are routed the same way.
    pub fn build(
        required_kv: IndexMap<String, String>,
        optional_kv: IndexMap<String, Option<String>>,
    ) -> Result<Self> {
        let mut entries: IndexMap<String, Option<String>> = required_kv
            .into_iter()
            .map(|(key, value)| (key, Some(value)))
            .collect();
        for (key, value) in optional_kv {
            entries.insert(key, value);
        }
        Self::from_entries(entries)
    }

    pub(crate) fn from_entries(mut entries: IndexMap<String, Option<String>>) -> Result<Self> {
        let mut take_required = |key: &str| -> Result<String> {
            match entries.shift_remove(key).flatten() {
                Some(value) if !value.trim().is_empty() => Ok(value),
                Some(_) => Err(IcsvError::format(format!(
                    "required metadata key '{}' is empty",
                    key
                ))),
                None => Err(IcsvError::format(format!(
                    "missing required metadata key '{}'",
                    key
                ))),
            }
        };

        let required = RequiredMetadata {
            field_delimiter: take_required(metadata_keys::FIELD_DELIMITER)?,
            geometry: take_required(metadata_keys::GEOMETRY)?,
            srid: take_required(metadata_keys::SRID)?,
        };

        let mut recommended = RecommendedMetadata::default();
        let mut other = IndexMap::new();

        for (key, value) in entries {
            let Some(value) = value else {
                debug!("Dropping metadata key '{}' without a value", key);
                continue;
            };
            match recommended.slot(&key) {
                Some(slot) => *slot = Some(value),
                None => {
                    other.insert(key, value);
                }
            }
        }

        Ok(Self {
            required,
            recommended,
            other,
        })
    }

    pub fn field_delimiter(&self) -> &str {
        &self.required.field_delimiter
    }

    pub fn nodata(&self) -> Option<&str> {
        self.recommended.nodata.as_deref()
    }

    /// Numeric view of the `nodata` marker, when it is a number
    pub fn nodata_value(&self) -> Option<f64> {
        self.nodata().and_then(|v| v.trim().parse::<f64>().ok())
    }

    /// Look up any key, required, recommended or other
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            metadata_keys::FIELD_DELIMITER => Some(&self.required.field_delimiter),
            metadata_keys::GEOMETRY => Some(&self.required.geometry),
            metadata_keys::SRID => Some(&self.required.srid),
            _ => self
                .recommended
                .entries()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v)
                .or_else(|| self.other.get(key).map(String::as_str)),
        }
    }

    /// Flattened view used for serialization: required keys, then set
    /// recommended keys, then the other keys in insertion order
    pub fn flatten(&self) -> IndexMap<String, String> {
        let mut flat = IndexMap::new();
        flat.insert(
            metadata_keys::FIELD_DELIMITER.to_string(),
            self.required.field_delimiter.clone(),
        );
        flat.insert(
            metadata_keys::GEOMETRY.to_string(),
            self.required.geometry.clone(),
        );
        flat.insert(metadata_keys::SRID.to_string(), self.required.srid.clone());

        for (key, value) in self.recommended.entries() {
            flat.insert(key.to_string(), value.to_string());
        }
        for (key, value) in &self.other {
            flat.insert(key.clone(), value.clone());
        }
        flat
    }

    pub fn with_station_id(mut self, station_id: impl Into<String>) -> Self {
        self.recommended.station_id = Some(station_id.into());
        self
    }

    pub fn with_nodata(mut self, nodata: impl Into<String>) -> Self {
        self.recommended.nodata = Some(nodata.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.recommended.timezone = Some(timezone.into());
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.recommended.doi = Some(doi.into());
        self
    }

    pub fn with_timestamp_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.recommended.timestamp_meaning = Some(meaning.into());
        self
    }

    /// Add a key outside the recognized set
    pub fn with_other(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.recommended.slot(&key) {
            Some(slot) => *slot = Some(value),
            None => {
                self.other.insert(key, value);
            }
        }
        self
    }
}
