//! Catalog-shaped records for tests

use cmr_core::Item;
use serde_json::{json, Value};

pub fn collection(concept_id: &str, provider: &str, short_name: &str) -> Item {
    Item::new(json!({
        "meta": {"concept-id": concept_id, "provider-id": provider},
        "umm": {"ShortName": short_name}
    }))
}

/// Collection carrying one platform with the given instruments
pub fn collection_with_instruments(concept_id: &str, provider: &str, instruments: &[&str]) -> Item {
    let instruments: Vec<Value> = instruments
        .iter()
        .map(|name| json!({"ShortName": name}))
        .collect();
    Item::new(json!({
        "meta": {"concept-id": concept_id, "provider-id": provider},
        "umm": {
            "ShortName": concept_id,
            "Platforms": [{"ShortName": "Terra", "Instruments": instruments}]
        }
    }))
}

/// Collection declaring a spatial resolution attribute
pub fn collection_with_resolution(concept_id: &str, resolution: &str) -> Item {
    Item::new(json!({
        "meta": {"concept-id": concept_id, "provider-id": "PODAAC"},
        "umm": {
            "ShortName": concept_id,
            "AdditionalAttributes": [{"Name": "Spatial Resolution", "Values": [resolution]}]
        }
    }))
}

pub fn granule(begin: &str, end: &str) -> Item {
    Item::new(json!({"umm": {"TemporalExtent": {"RangeDateTime": {
        "BeginningDateTime": begin,
        "EndingDateTime": end
    }}}}))
}

pub fn granule_with_box(begin: &str, end: &str, bbox: [f64; 4]) -> Item {
    let [west, south, east, north] = bbox;
    Item::new(json!({"umm": {
        "TemporalExtent": {"RangeDateTime": {
            "BeginningDateTime": begin,
            "EndingDateTime": end
        }},
        "SpatialExtent": {"HorizontalSpatialDomain": {"Geometry": {"BoundingRectangles": [{
            "WestBoundingCoordinate": west,
            "SouthBoundingCoordinate": south,
            "EastBoundingCoordinate": east,
            "NorthBoundingCoordinate": north
        }]}}}
    }}))
}

pub fn variable(name: &str, collections: &[&str]) -> Item {
    let associated: Vec<Value> = collections
        .iter()
        .map(|id| json!({"concept_id": id}))
        .collect();
    Item::new(json!({
        "meta": {"concept-id": format!("V-{name}")},
        "umm": {"Name": name},
        "associations": {"collections": associated}
    }))
}
