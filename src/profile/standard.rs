//! Standard-profile iCSV files: one header, one table.

use super::{
    Profile, at_line, check_header, expect_version, prepare_frame, read_lines_from, render_header,
};
use crate::error::{IcsvError, Result};
use crate::geometry::Geometry;
use crate::header::section::strip_comment;
use crate::header::{FieldsSection, MetadataSection, Section, SectionParser};
use crate::table;
use polars::prelude::DataFrame;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// A standard-profile file held in memory
#[derive(Debug, Clone)]
pub struct IcsvFile {
    metadata: MetadataSection,
    fields: FieldsSection,
    geometry: Geometry,
    data: DataFrame,
}

impl IcsvFile {
    /// Assemble a file from a header and a data body.
    ///
    /// The body must have one column per declared field; columns are renamed
    /// to the field names and `time`/`timestamp` columns are parsed.
    pub fn new(metadata: MetadataSection, fields: FieldsSection, data: DataFrame) -> Result<Self> {
        let geometry = Geometry::parse(&metadata.required.geometry, &metadata.required.srid)?;
        let data = prepare_frame(data, &fields)?;
        Ok(Self {
            metadata,
            fields,
            geometry,
            data,
        })
    }

    /// Read a standard-profile file
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();
        expect_version(&mut lines, Profile::Standard)?;

        let mut parser = SectionParser::new();
        let mut data_start = None;

        // line index 0 is the version line
        for (index, line) in lines.enumerate().map(|(i, l)| (i + 1, l)) {
            let line = line?;
            let line_no = index + 1;

            if let Some(content) = strip_comment(&line) {
                parser.feed(content).map_err(|e| at_line(e, line_no))?;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            if parser.section() != Section::Data {
                return Err(at_line(
                    IcsvError::format("data section was not specified"),
                    line_no,
                ));
            }
            data_start = Some(index);
            break;
        }

        // Header is complete; load the body in one go
        let (metadata, fields) = parser.finish()?;
        let geometry = Geometry::parse(&metadata.required.geometry, &metadata.required.srid)?;

        let body = match data_start {
            Some(start) => read_lines_from(path, start)?,
            None => Vec::new(),
        };
        debug!(
            "Loading {} data lines from {}",
            body.len(),
            path.display()
        );
        let first_line_no = data_start.map_or(1, |start| start + 1);
        let raw =
            table::read_delimited(&body, metadata.field_delimiter(), fields.len(), first_line_no)?;
        let data = prepare_frame(raw, &fields)?;

        Ok(Self {
            metadata,
            fields,
            geometry,
            data,
        })
    }

    /// Write the file. Nothing is written when validation fails.
    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        debug!("Wrote {} rows to {}", self.data.height(), path.display());
        Ok(())
    }

    /// Serialize header and body to memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.fields.validate(self.data.width())?;
        check_header(&self.metadata, &self.fields)?;

        let mut out = render_header(Profile::Standard, &self.metadata, &self.fields).into_bytes();
        table::write_delimited(&mut out, &self.data, self.metadata.field_delimiter())?;
        Ok(out)
    }

    pub fn metadata(&self) -> &MetadataSection {
        &self.metadata
    }

    pub fn fields(&self) -> &FieldsSection {
        &self.fields
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }
}

impl fmt::Display for IcsvFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "iCSV file (standard profile)")?;
        writeln!(f, "  geometry: {}", self.geometry)?;
        for (key, value) in self.metadata.flatten() {
            writeln!(f, "  {}: {}", key, value)?;
        }
        writeln!(f, "  fields: {}", self.fields.fields.join(", "))?;
        write!(
            f,
            "  data: {} rows x {} columns",
            self.data.height(),
            self.data.width()
        )
    }
}
