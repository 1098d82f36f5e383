//! Tests for flat-table and array conversion


use crate::header::MetadataSection;
use chrono::{NaiveDate, NaiveDateTime};

pub(super) fn metadata() -> MetadataSection {
    MetadataSection::new(",", "POINT(600000 200000)", "EPSG:2056").unwrap()
}

pub(super) fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}
