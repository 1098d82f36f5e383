//! Format constants for iCSV files
//!
//! Version markers, section markers, recognized header keys, default date
//! formats and the default dimension names used by array conversion.

// =============================================================================
// Version and Section Markers
// =============================================================================

/// First line of a standard-profile file
pub const VERSION_STANDARD: &str = "# iCSV 1.0 UTF-8";

/// First line of a 2D-timeseries file
pub const VERSION_2DTIMESERIES: &str = "# iCSV 1.0 UTF-8 2DTIMESERIES";

/// Prefix of every header and marker line
pub const COMMENT_PREFIX: &str = "#";

pub const METADATA_MARKER: &str = "[METADATA]";
pub const FIELDS_MARKER: &str = "[FIELDS]";
pub const DATA_MARKER: &str = "[DATA]";

/// Key/value separator inside header sections
pub const KEY_VALUE_SEPARATOR: char = '=';

// =============================================================================
// Recognized Header Keys
// =============================================================================

/// Recognized metadata keys; the first three are required
pub mod metadata_keys {
    pub const FIELD_DELIMITER: &str = "field_delimiter";
    pub const GEOMETRY: &str = "geometry";
    pub const SRID: &str = "srid";

    pub const STATION_ID: &str = "station_id";
    pub const NODATA: &str = "nodata";
    pub const TIMEZONE: &str = "timezone";
    pub const DOI: &str = "doi";
    pub const TIMESTAMP_MEANING: &str = "timestamp_meaning";
}

/// Keys of the fields section
pub mod field_keys {
    pub const FIELDS: &str = "fields";
    pub const UNITS_MULTIPLIER: &str = "units_multiplier";
    pub const UNITS: &str = "units";
    pub const LONG_NAME: &str = "long_name";
    pub const STANDARD_NAME: &str = "standard_name";
}

// =============================================================================
// Time Handling
// =============================================================================

/// Column names that are coerced to timestamps after loading
pub const TIME_COLUMNS: &[&str] = &["time", "timestamp"];

/// Candidate index columns for 2D arrays, in priority order
pub const DEFAULT_ROW_INDEX_COLUMNS: &[&str] = &["timestamp", "time"];

/// Candidate layer index columns for 3D arrays, in priority order
pub const DEFAULT_LAYER_INDEX_COLUMNS: &[&str] = &["layer_index"];

/// Date format used for `[DATE=...]` markers unless configured otherwise
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format used when timestamp columns are written back as text; the
/// fraction is omitted for whole seconds
pub const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Name of the date column added when timeseries blocks are flattened
pub const DATE_COLUMN: &str = "date";

// =============================================================================
// Array Dimension Names
// =============================================================================

pub mod dims {
    /// Row dimension when an index column supplies labels
    pub const ROW: &str = "time";
    /// Row dimension substituted when rows are only numbered
    pub const ROW_FALLBACK: &str = "index";
    pub const FIELD: &str = "field";
    pub const LAYER: &str = "layer_index";
    pub const LAYER_FALLBACK: &str = "layer";
    pub const TIME: &str = "time";
}
