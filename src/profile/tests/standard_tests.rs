//! Tests for reading and writing standard-profile files

use super::{at, int_at, write_file};
use crate::datetime::datetime_values;
use crate::header::{FieldsSection, MetadataSection};
use crate::profile::IcsvFile;
use crate::table::column_names;
use polars::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ,
# geometry = POINT(600000 200000)
# srid = EPSG:2056
# station_id = WFJ
# nodata = -999
# source = test run
#
# [FIELDS]
# fields = timestamp,a,b
# units = -,m,s
# long_name = time,height,duration
# [DATA]
2024-01-01T00:00:00,1,2
2024-01-01T01:00:00,3,4
";

#[test]
fn test_read_sample() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "sample.icsv", SAMPLE);

    let file = IcsvFile::read(&path).unwrap();
    let metadata = file.metadata();
    assert_eq!(metadata.field_delimiter(), ",");
    assert_eq!(metadata.recommended.station_id.as_deref(), Some("WFJ"));
    assert_eq!(metadata.nodata_value(), Some(-999.0));
    assert_eq!(metadata.other.get("source").map(String::as_str), Some("test run"));

    let fields = file.fields();
    assert_eq!(fields.fields, vec!["timestamp", "a", "b"]);
    assert_eq!(fields.recommended.units, vec!["-", "m", "s"]);

    let data = file.data();
    assert_eq!(data.shape(), (2, 3));
    assert_eq!(column_names(data), vec!["timestamp", "a", "b"]);
    assert_eq!(int_at(data, "b", 1), Some(4));
    assert_eq!(file.geometry().location().unwrap().x, 600000.0);
}

#[test]
fn test_roundtrip_single_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roundtrip.icsv");

    let metadata = MetadataSection::new(",", "POINT(600000 200000)", "EPSG:2056").unwrap();
    let fields = FieldsSection::new(["timestamp", "a", "b"]).unwrap();
    let df = df!(
        "column_1" => &["2024-01-01T00:00:00"],
        "column_2" => &[1i64],
        "column_3" => &[2i64]
    )
    .unwrap();
    IcsvFile::new(metadata, fields, df).unwrap().write(&path).unwrap();

    let file = IcsvFile::read(&path).unwrap();
    let data = file.data();
    assert_eq!(data.height(), 1);
    assert_eq!(int_at(data, "a", 0), Some(1));
    assert_eq!(int_at(data, "b", 0), Some(2));

    let timestamps =
        datetime_values(data.column("timestamp").unwrap().as_materialized_series()).unwrap();
    assert_eq!(timestamps, vec![Some(at(1, 0))]);
}

#[test]
fn test_written_header_layout() {
    let metadata = MetadataSection::new(";", "POINT(1 2)", "EPSG:4326")
        .unwrap()
        .with_station_id("X1");
    let fields = FieldsSection::new(["a", "b"])
        .unwrap()
        .with_units(vec!["m".into(), "s".into()]);
    let df = df!("a" => &[1i64], "b" => &[2.5f64]).unwrap();
    let bytes = IcsvFile::new(metadata, fields, df).unwrap().to_bytes().unwrap();

    let expected = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ;
# geometry = POINT(1 2)
# srid = EPSG:4326
# station_id = X1
# [FIELDS]
# fields = a;b
# units = m;s
# [DATA]
1;2.5
";
    assert_eq!(String::from_utf8(bytes).unwrap(), expected);
}

#[test]
fn test_empty_body_gives_typed_empty_frame() {
    let dir = TempDir::new().unwrap();
    let content = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ,
# geometry = POINT(1 2)
# srid = EPSG:4326
# [FIELDS]
# fields = a,b
# [DATA]
";
    let path = write_file(dir.path(), "empty.icsv", content);

    let file = IcsvFile::read(&path).unwrap();
    assert_eq!(file.data().shape(), (0, 2));
    assert_eq!(column_names(file.data()), vec!["a", "b"]);
}

#[test]
fn test_data_line_before_data_marker() {
    let dir = TempDir::new().unwrap();
    let content = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ,
# geometry = POINT(1 2)
# srid = EPSG:4326
# [FIELDS]
# fields = a,b
1,2
";
    let path = write_file(dir.path(), "early.icsv", content);

    let err = IcsvFile::read(&path).unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("line 8"));
    assert!(err.to_string().contains("data section was not specified"));
}

#[test]
fn test_missing_data_marker() {
    let dir = TempDir::new().unwrap();
    let content = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ,
# geometry = POINT(1 2)
# srid = EPSG:4326
# [FIELDS]
# fields = a,b
";
    let path = write_file(dir.path(), "nodata.icsv", content);

    let err = IcsvFile::read(&path).unwrap_err();
    assert!(err.to_string().contains("data section was not specified"));
}

#[test]
fn test_missing_required_metadata() {
    let dir = TempDir::new().unwrap();
    let content = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ,
# geometry = POINT(1 2)
# [FIELDS]
# fields = a,b
# [DATA]
1,2
";
    let path = write_file(dir.path(), "nosrid.icsv", content);

    let err = IcsvFile::read(&path).unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("srid"));
}

#[test]
fn test_field_count_mismatch() {
    let dir = TempDir::new().unwrap();
    let content = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ,
# geometry = POINT(1 2)
# srid = EPSG:4326
# [FIELDS]
# fields = a,b,c
# [DATA]
1,2
3,4
";
    let path = write_file(dir.path(), "short.icsv", content);
    assert!(IcsvFile::read(&path).unwrap_err().is_format());
}

#[test]
fn test_short_row_after_full_row() {
    let dir = TempDir::new().unwrap();
    let content = "\
# iCSV 1.0 UTF-8
# [METADATA]
# field_delimiter = ,
# geometry = POINT(1 2)
# srid = EPSG:4326
# [FIELDS]
# fields = a,b,c
# [DATA]
1,2,3
4,5
";
    let path = write_file(dir.path(), "ragged.icsv", content);

    let err = IcsvFile::read(&path).unwrap_err();
    assert!(err.is_format());
    let message = err.to_string();
    assert!(message.contains("line 10"), "{}", message);
    assert!(message.contains("number of fields (3)"), "{}", message);
}

#[test]
fn test_subsecond_timestamps_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subsecond.icsv");

    let metadata = MetadataSection::new(",", "POINT(1 2)", "EPSG:4326").unwrap();
    let fields = FieldsSection::new(["timestamp", "a"]).unwrap();
    let df = df!(
        "timestamp" => &["2024-01-01T00:00:00.500", "2024-01-01T00:00:01"],
        "a" => &[1i64, 2]
    )
    .unwrap();
    let original = IcsvFile::new(metadata, fields, df).unwrap();
    original.write(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("2024-01-01T00:00:00.500,1\n"), "{}", text);
    assert!(text.contains("2024-01-01T00:00:01,2\n"), "{}", text);

    let timestamps = |file: &IcsvFile| {
        datetime_values(file.data().column("timestamp").unwrap().as_materialized_series())
            .unwrap()
    };
    let before = timestamps(&original);
    assert_eq!(
        before[0],
        Some(at(1, 0) + chrono::Duration::milliseconds(500))
    );
    assert_eq!(timestamps(&IcsvFile::read(&path).unwrap()), before);
}

#[test]
fn test_write_rejects_unserializable_header() {
    let dir = TempDir::new().unwrap();
    let df = || df!("a" => &[1i64], "b" => &[2i64]).unwrap();

    let metadata = MetadataSection::new(",", "POINT(1 2)", "EPSG:4326")
        .unwrap()
        .with_doi("https://x.org/?a=b");
    let fields = FieldsSection::new(["a", "b"]).unwrap();
    let path = dir.path().join("equals.icsv");
    let err = IcsvFile::new(metadata, fields, df())
        .unwrap()
        .write(&path)
        .unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("doi"), "{}", err);
    assert!(!path.exists());

    let metadata = MetadataSection::new(",", "POINT(1 2)", "EPSG:4326").unwrap();
    let fields = FieldsSection::new(["a", "b"])
        .unwrap()
        .with_long_name(vec!["height, snow".into(), "depth".into()]);
    let path = dir.path().join("delimiter.icsv");
    let err = IcsvFile::new(metadata, fields, df())
        .unwrap()
        .write(&path)
        .unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("long_name"), "{}", err);
    assert!(!path.exists());

    let metadata = MetadataSection::new(",", "POINT(1 2)", "EPSG:4326")
        .unwrap()
        .with_other("comment", "two\nlines");
    let fields = FieldsSection::new(["a", "b"]).unwrap();
    let bytes = IcsvFile::new(metadata, fields, df()).unwrap().to_bytes();
    assert!(bytes.unwrap_err().is_format());
}

#[test]
fn test_new_rejects_mismatched_frame() {
    let metadata = MetadataSection::new(",", "POINT(1 2)", "EPSG:4326").unwrap();
    let fields = FieldsSection::new(["a", "b", "c"]).unwrap();
    let df = df!("a" => &[1i64], "b" => &[2i64]).unwrap();

    assert!(IcsvFile::new(metadata, fields, df).unwrap_err().is_format());
}

#[test]
fn test_read_rejects_timeseries_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "ts.icsv",
        "# iCSV 1.0 UTF-8 2DTIMESERIES\n# [METADATA]\n",
    );

    let err = IcsvFile::read(&path).unwrap_err();
    assert!(err.to_string().contains("expected a standard file"));
}
