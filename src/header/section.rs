//! Line classifier for the commented header sections.
//!
//! Header lines are fed one at a time with their comment prefix already
//! stripped. The parser walks `None -> Metadata -> Fields -> Data` and never
//! moves backwards. Crossing into `Fields` finalizes the metadata section,
//! because field values can only be split once the delimiter is known.

use super::fields::{AttributeValue, FieldsSection};
use super::metadata::MetadataSection;
use crate::constants::{DATA_MARKER, FIELDS_MARKER, KEY_VALUE_SEPARATOR, METADATA_MARKER};
use crate::error::{IcsvError, Result};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Header region the parser is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    None,
    Metadata,
    Fields,
    Data,
}

impl Section {
    fn from_marker(line: &str) -> Option<Self> {
        match line {
            METADATA_MARKER => Some(Self::Metadata),
            FIELDS_MARKER => Some(Self::Fields),
            DATA_MARKER => Some(Self::Data),
            _ => None,
        }
    }
}

/// Strip the comment prefix from a physical line, `None` for data lines
pub fn strip_comment(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(crate::constants::COMMENT_PREFIX)
        .map(str::trim)
}

/// Split a `key = value` line; exactly one separator is allowed
pub fn split_key_value(line: &str) -> Result<(String, String)> {
    let mut parts = line.split(KEY_VALUE_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        (Some(_), Some(_), None) => Err(IcsvError::format(format!(
            "header line '{}' has an empty key",
            line
        ))),
        _ => Err(IcsvError::format(format!(
            "header line '{}' must contain exactly one '{}'",
            line, KEY_VALUE_SEPARATOR
        ))),
    }
}

/// Accumulates header key/value pairs while scanning
#[derive(Debug)]
pub struct SectionParser {
    section: Section,
    metadata_kv: IndexMap<String, Option<String>>,
    fields_kv: IndexMap<String, String>,
    metadata: Option<MetadataSection>,
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionParser {
    pub fn new() -> Self {
        Self {
            section: Section::None,
            metadata_kv: IndexMap::new(),
            fields_kv: IndexMap::new(),
            metadata: None,
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Metadata, once the fields section has been entered
    pub fn metadata(&self) -> Option<&MetadataSection> {
        self.metadata.as_ref()
    }

    /// Feed one header line (comment prefix already stripped).
    ///
    /// Returns `true` when the line was a section marker.
    pub fn feed(&mut self, content: &str) -> Result<bool> {
        if let Some(next) = Section::from_marker(content) {
            self.transition(next)?;
            return Ok(true);
        }

        if content.is_empty() {
            return Ok(false);
        }

        match self.section {
            Section::Metadata => {
                let (key, value) = split_key_value(content)?;
                if self.metadata_kv.insert(key.clone(), Some(value)).is_some() {
                    warn!("Metadata key '{}' defined more than once, keeping the last", key);
                }
            }
            Section::Fields => {
                let (key, value) = split_key_value(content)?;
                if self.fields_kv.insert(key.clone(), value).is_some() {
                    warn!("Field key '{}' defined more than once, keeping the last", key);
                }
            }
            Section::None | Section::Data => {
                debug!("Ignoring comment outside header sections: {}", content);
            }
        }

        Ok(false)
    }

    fn transition(&mut self, next: Section) -> Result<()> {
        if next <= self.section {
            return Err(IcsvError::format(format!(
                "section {:?} cannot follow section {:?}",
                next, self.section
            )));
        }

        if next >= Section::Fields && self.metadata.is_none() {
            let entries = std::mem::take(&mut self.metadata_kv);
            self.metadata = Some(MetadataSection::from_entries(entries)?);
        }

        debug!("Entering header section {:?}", next);
        self.section = next;
        Ok(())
    }

    /// Finalize both sections; the data section must have been reached
    pub fn finish(self) -> Result<(MetadataSection, FieldsSection)> {
        if self.section != Section::Data {
            return Err(IcsvError::format("data section was not specified"));
        }

        let metadata = self
            .metadata
            .ok_or_else(|| IcsvError::format("metadata section was not specified"))?;

        let delimiter = metadata.field_delimiter().to_string();
        let fields_kv = self
            .fields_kv
            .into_iter()
            .map(|(key, value)| {
                let values = value
                    .split(delimiter.as_str())
                    .map(|v| v.trim().to_string())
                    .collect::<Vec<_>>();
                (key, AttributeValue::Sequence(values))
            })
            .collect();

        let fields = FieldsSection::build(fields_kv)?;
        Ok((metadata, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut SectionParser, lines: &[&str]) -> Result<()> {
        for line in lines {
            parser.feed(line)?;
        }
        Ok(())
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("# [DATA]"), Some("[DATA]"));
        assert_eq!(strip_comment("#key = value  "), Some("key = value"));
        assert_eq!(strip_comment("1,2,3"), None);
    }

    #[test]
    fn test_split_key_value() {
        assert_eq!(
            split_key_value(" srid =  EPSG:2056 ").unwrap(),
            ("srid".to_string(), "EPSG:2056".to_string())
        );
        assert!(split_key_value("doi = a=b").unwrap_err().is_format());
        assert!(split_key_value("no separator").unwrap_err().is_format());
        assert!(split_key_value(" = value").unwrap_err().is_format());
    }

    #[test]
    fn test_full_header() {
        let mut parser = SectionParser::new();
        feed_all(
            &mut parser,
            &[
                "[METADATA]",
                "field_delimiter = ;",
                "geometry = POINT(1 2)",
                "srid = EPSG:4326",
                "nodata = -999",
                "creator = SLF",
                "[FIELDS]",
                "fields = timestamp;ta;rh",
                "units = ;K;1",
                "[DATA]",
            ],
        )
        .unwrap();

        let (metadata, fields) = parser.finish().unwrap();
        assert_eq!(metadata.field_delimiter(), ";");
        assert_eq!(metadata.nodata(), Some("-999"));
        assert_eq!(metadata.other.get("creator").map(String::as_str), Some("SLF"));
        assert_eq!(fields.fields, vec!["timestamp", "ta", "rh"]);
        assert_eq!(fields.recommended.units, vec!["", "K", "1"]);
    }

    #[test]
    fn test_metadata_finalized_on_fields_marker() {
        let mut parser = SectionParser::new();
        feed_all(&mut parser, &["[METADATA]", "field_delimiter = ,"]).unwrap();

        let err = parser.feed("[FIELDS]").unwrap_err();
        assert!(err.to_string().contains("geometry"));
    }

    #[test]
    fn test_sections_are_monotonic() {
        let mut parser = SectionParser::new();
        feed_all(
            &mut parser,
            &[
                "[METADATA]",
                "field_delimiter = ,",
                "geometry = POINT(1 2)",
                "srid = EPSG:4326",
                "[FIELDS]",
            ],
        )
        .unwrap();

        assert!(parser.feed("[METADATA]").unwrap_err().is_format());
        assert!(parser.feed("[FIELDS]").unwrap_err().is_format());
    }

    #[test]
    fn test_finish_without_data_section() {
        let mut parser = SectionParser::new();
        feed_all(
            &mut parser,
            &[
                "[METADATA]",
                "field_delimiter = ,",
                "geometry = POINT(1 2)",
                "srid = EPSG:4326",
                "[FIELDS]",
                "fields = a,b",
            ],
        )
        .unwrap();

        let err = parser.finish().unwrap_err();
        assert!(err.to_string().contains("data section was not specified"));
    }

    #[test]
    fn test_missing_fields_key() {
        let mut parser = SectionParser::new();
        feed_all(
            &mut parser,
            &[
                "[METADATA]",
                "field_delimiter = ,",
                "geometry = POINT(1 2)",
                "srid = EPSG:4326",
                "[FIELDS]",
                "units = m,s",
                "[DATA]",
            ],
        )
        .unwrap();

        assert!(parser.finish().unwrap_err().is_format());
    }
}
