//! Tests for fields section construction and validation

use super::super::fields::{AttributeValue, FieldsSection};
use indexmap::IndexMap;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_build_requires_fields() {
    let mut kv = IndexMap::new();
    kv.insert("units".to_string(), AttributeValue::from(vec!["m", "s"]));

    let err = FieldsSection::build(kv).unwrap_err();
    assert!(err.is_format());
}

#[test]
fn test_build_rejects_empty_fields() {
    assert!(FieldsSection::new(Vec::<String>::new()).unwrap_err().is_format());
}

#[test]
fn test_build_rejects_scalar_fields() {
    let mut kv = IndexMap::new();
    kv.insert("fields".to_string(), AttributeValue::from("a"));

    let err = FieldsSection::build(kv).unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("scalar 'a'"), "{}", err);
}

#[test]
fn test_scalar_attribute_is_dropped() {
    let mut kv = IndexMap::new();
    kv.insert("fields".to_string(), AttributeValue::from(vec!["a", "b"]));
    kv.insert("units".to_string(), AttributeValue::from("m"));
    kv.insert("sensor".to_string(), AttributeValue::from("x"));
    kv.insert("height".to_string(), AttributeValue::from(vec!["1", "2"]));

    let fields = FieldsSection::build(kv).unwrap();
    assert!(fields.recommended.units.is_empty());
    assert!(!fields.other.contains_key("sensor"));
    assert_eq!(fields.get("height"), Some(&strings(&["1", "2"])[..]));
}

#[test]
fn test_validate_column_count() {
    let fields = FieldsSection::new(["a", "b", "c"]).unwrap();
    assert!(fields.validate(3).is_ok());

    let err = fields.validate(2).unwrap_err();
    assert!(err.to_string().contains("number of fields (3)"));
}

#[test]
fn test_validate_reports_first_bad_attribute() {
    let fields = FieldsSection::new(["a", "b"])
        .unwrap()
        .with_units(strings(&["m"]))
        .with_other("height", strings(&["1", "2", "3"]));

    let err = fields.validate(2).unwrap_err();
    assert!(err.to_string().contains("'units'"));
}

#[test]
fn test_validate_ignores_empty_attributes() {
    let fields = FieldsSection::new(["a", "b"])
        .unwrap()
        .with_long_name(Vec::new())
        .with_other("height", Vec::new());
    assert!(fields.validate(2).is_ok());
    assert_eq!(fields.attributes().count(), 0);
}

#[test]
fn test_attribute_order() {
    let fields = FieldsSection::new(["a", "b"])
        .unwrap()
        .with_other("height", strings(&["1", "2"]))
        .with_standard_name(strings(&["x", "y"]))
        .with_units(strings(&["m", "s"]));

    let keys: Vec<&str> = fields.attributes().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["units", "standard_name", "height"]);
}

#[test]
fn test_column_attributes_skip_mismatched_vectors() {
    let fields = FieldsSection::new(["a", "b"])
        .unwrap()
        .with_units(strings(&["m", "s"]))
        .with_long_name(strings(&["only one"]));

    let columns = fields.column_attributes();
    assert_eq!(columns["a"].get("units").map(String::as_str), Some("m"));
    assert_eq!(columns["b"].get("units").map(String::as_str), Some("s"));
    assert!(!columns["a"].contains_key("long_name"));
}
