//! Granule spatial extents

use crate::item::{as_f64, one_or_many, Item};
use crate::types::BoundingBox;
use serde_json::Value;

const GEOMETRY: &[&str] = &["umm", "SpatialExtent", "HorizontalSpatialDomain", "Geometry"];

/// Keys under `Geometry` that may hold rectangles, each a mapping or a list
const RECTANGLE_KEYS: &[&str] = &["BoundingBox", "BoundingRectangles"];

/// Rectangles declared by a granule; malformed rectangles are dropped
#[must_use]
pub fn granule_boxes(item: &Item) -> Vec<BoundingBox> {
    let Some(geometry) = item.get_path(GEOMETRY) else {
        return Vec::new();
    };
    RECTANGLE_KEYS
        .iter()
        .filter_map(|key| geometry.get(*key))
        .flat_map(one_or_many)
        .filter_map(parse_rectangle)
        .collect()
}

fn parse_rectangle(value: &Value) -> Option<BoundingBox> {
    let coord = |key: &str| value.get(key).and_then(as_f64);
    Some(BoundingBox::new(
        coord("WestBoundingCoordinate")?,
        coord("SouthBoundingCoordinate")?,
        coord("EastBoundingCoordinate")?,
        coord("NorthBoundingCoordinate")?,
    ))
}

/// Union of all boxes
#[must_use]
pub fn union_all(boxes: &[BoundingBox]) -> Option<BoundingBox> {
    let (first, rest) = boxes.split_first()?;
    Some(rest.iter().fold(*first, |acc, b| acc.union(b)))
}
