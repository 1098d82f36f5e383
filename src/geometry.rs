//! Station geometry and spatial reference handling.
//!
//! The `geometry` metadata value is either a WKT-like point
//! (`POINT(x y)` / `POINTZ(x y z)`) or the name of a data column that
//! carries the geometry per row. The `srid` value is an `EPSG:<code>`
//! identifier.

use crate::error::{IcsvError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::warn;

static SRID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z]+\s*:\s*(\d+)\s*$").expect("valid srid regex"));

static POINTZ_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*POINTZ\s*\(([^()]*)\)\s*$").expect("valid POINTZ regex"));

static POINT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*POINT\s*\(([^()]*)\)\s*$").expect("valid POINT regex"));

/// A fixed point location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// Where the geometry of a file lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryKind {
    /// One point for the whole file
    Location(Location),
    /// Per-row geometry stored in the named data column
    Column(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub epsg: u32,
    pub kind: GeometryKind,
}

impl Geometry {
    /// Parse the `geometry` and `srid` metadata values
    pub fn parse(geometry: &str, srid: &str) -> Result<Self> {
        let epsg = parse_srid(srid)?;

        let kind = match parse_point(geometry) {
            Some(location) => GeometryKind::Location(location),
            None => {
                warn!(
                    "Geometry '{}' is not a POINT/POINTZ, treating it as a column name",
                    geometry
                );
                GeometryKind::Column(geometry.trim().to_string())
            }
        };

        Ok(Self { epsg, kind })
    }

    /// Render back to the `(geometry, srid)` metadata strings
    pub fn render(&self) -> (String, String) {
        let geometry = match &self.kind {
            GeometryKind::Location(Location { x, y, z: Some(z) }) => {
                format!("POINTZ({} {} {})", x, y, z)
            }
            GeometryKind::Location(Location { x, y, z: None }) => format!("POINT({} {})", x, y),
            GeometryKind::Column(name) => name.clone(),
        };
        (geometry, format!("EPSG:{}", self.epsg))
    }

    pub fn location(&self) -> Option<&Location> {
        match &self.kind {
            GeometryKind::Location(location) => Some(location),
            GeometryKind::Column(_) => None,
        }
    }

    pub fn column_name(&self) -> Option<&str> {
        match &self.kind {
            GeometryKind::Column(name) => Some(name),
            GeometryKind::Location(_) => None,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (geometry, srid) = self.render();
        write!(f, "{} ({})", geometry, srid)
    }
}

fn parse_srid(srid: &str) -> Result<u32> {
    let captures = SRID_PATTERN.captures(srid).ok_or_else(|| {
        IcsvError::format(format!(
            "invalid srid '{}' (expected EPSG:<code>)",
            srid
        ))
    })?;

    let epsg = captures[1]
        .parse::<u32>()
        .map_err(|e| IcsvError::format(format!("invalid EPSG code in '{}': {}", srid, e)))?;

    if epsg == 0 {
        return Err(IcsvError::format(format!(
            "EPSG code must be positive, got '{}'",
            srid
        )));
    }

    Ok(epsg)
}

/// Parse `POINTZ(x y z)` or `POINT(x y)`; `None` for anything else
fn parse_point(geometry: &str) -> Option<Location> {
    if let Some(captures) = POINTZ_PATTERN.captures(geometry) {
        let coords = parse_coordinates(&captures[1], 3)?;
        return Some(Location {
            x: coords[0],
            y: coords[1],
            z: Some(coords[2]),
        });
    }

    if let Some(captures) = POINT_PATTERN.captures(geometry) {
        let coords = parse_coordinates(&captures[1], 2)?;
        return Some(Location {
            x: coords[0],
            y: coords[1],
            z: None,
        });
    }

    None
}

fn parse_coordinates(body: &str, arity: usize) -> Option<Vec<f64>> {
    let coords: Vec<f64> = body
        .split_whitespace()
        .map(|token| token.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    (coords.len() == arity).then_some(coords)
}
