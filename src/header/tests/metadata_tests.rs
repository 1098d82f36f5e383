//! Tests for metadata section construction and flattening

use super::super::metadata::MetadataSection;
use indexmap::IndexMap;

fn required() -> IndexMap<String, String> {
    let mut kv = IndexMap::new();
    kv.insert("field_delimiter".to_string(), ",".to_string());
    kv.insert("geometry".to_string(), "POINT(600000 200000)".to_string());
    kv.insert("srid".to_string(), "EPSG:2056".to_string());
    kv
}

#[test]
fn test_build_routes_keys() {
    let mut optional = IndexMap::new();
    optional.insert("station_id".to_string(), Some("WFJ2".to_string()));
    optional.insert("doi".to_string(), None);
    optional.insert("creator".to_string(), Some("SLF".to_string()));
    optional.insert("comment".to_string(), None);

    let metadata = MetadataSection::build(required(), optional).unwrap();

    assert_eq!(metadata.field_delimiter(), ",");
    assert_eq!(metadata.recommended.station_id.as_deref(), Some("WFJ2"));
    assert_eq!(metadata.recommended.doi, None);
    assert_eq!(metadata.other.len(), 1);
    assert_eq!(metadata.get("creator"), Some("SLF"));
    assert_eq!(metadata.get("comment"), None);
}

#[test]
fn test_missing_required_key() {
    let mut kv = required();
    kv.shift_remove("srid");

    let err = MetadataSection::build(kv, IndexMap::new()).unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("srid"));
}

#[test]
fn test_empty_required_key() {
    let mut kv = required();
    kv.insert("field_delimiter".to_string(), "  ".to_string());

    let err = MetadataSection::build(kv, IndexMap::new()).unwrap_err();
    assert!(err.to_string().contains("field_delimiter"));
}

#[test]
fn test_flatten_order_and_omission() {
    let metadata = MetadataSection::new(";", "POINT(1 2)", "EPSG:4326")
        .unwrap()
        .with_other("creator", "SLF")
        .with_nodata("-999")
        .with_station_id("WFJ2");

    let flat = metadata.flatten();
    let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "field_delimiter",
            "geometry",
            "srid",
            "station_id",
            "nodata",
            "creator"
        ]
    );
    assert_eq!(flat["nodata"], "-999");
}

#[test]
fn test_nodata_value() {
    let metadata = MetadataSection::new(",", "POINT(1 2)", "EPSG:4326")
        .unwrap()
        .with_nodata("-999.0");
    assert_eq!(metadata.nodata_value(), Some(-999.0));

    let metadata = metadata.with_nodata("NA");
    assert_eq!(metadata.nodata_value(), None);
    assert_eq!(metadata.nodata(), Some("NA"));
}

#[test]
fn test_with_other_routes_recommended_keys() {
    let metadata = MetadataSection::new(",", "POINT(1 2)", "EPSG:4326")
        .unwrap()
        .with_other("timezone", "+1");
    assert_eq!(metadata.recommended.timezone.as_deref(), Some("+1"));
    assert!(metadata.other.is_empty());
}
