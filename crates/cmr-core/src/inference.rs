//! Constraint inference
//!
//! Deterministic pattern rules that derive search constraints from free text:
//! - `infer_temporal`: year range from four-digit years in 1900..=2099
//! - `infer_bbox`: bounding box from known region names

use crate::types::{BoundingBox, TemporalRange};
use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year pattern compiles"));

const SUB_SAHARAN_AFRICA: BoundingBox = BoundingBox::new(-20.0, -35.0, 52.0, 20.0);
const GLOBAL: BoundingBox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);

/// Region aliases, matched in table order as lowercase substrings
const REGIONS: &[(&str, BoundingBox)] = &[
    ("sub-saharan africa", SUB_SAHARAN_AFRICA),
    ("subsaharan africa", SUB_SAHARAN_AFRICA),
    ("sub saharan africa", SUB_SAHARAN_AFRICA),
    ("global", GLOBAL),
    ("worldwide", GLOBAL),
];

/// Infer a year range from text
///
/// Returns `min-01-01T00:00:00Z ..= max-12-31T23:59:59Z` when at least two
/// distinct years appear; `None` otherwise.
#[must_use]
pub fn infer_temporal(text: &str) -> Option<TemporalRange> {
    let years: BTreeSet<i32> = YEAR
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if years.len() < 2 {
        return None;
    }
    let first = *years.first()?;
    let last = *years.last()?;
    let start = Utc.with_ymd_and_hms(first, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(last, 12, 31, 23, 59, 59).single()?;
    Some(TemporalRange::new(start, end))
}

/// Infer a bounding box from a known region name in the text
#[must_use]
pub fn infer_bbox(text: &str) -> Option<BoundingBox> {
    let lowered = text.to_lowercase();
    REGIONS
        .iter()
        .find(|(alias, _)| lowered.contains(alias))
        .map(|(_, bbox)| *bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn year_range_from_text() {
        let range = infer_temporal("rainfall 2010-2012 over sub-saharan africa").unwrap();
        assert_eq!(range.to_param(), "2010-01-01T00:00:00Z,2012-12-31T23:59:59Z");
    }

    #[test]
    fn single_or_no_year_is_none() {
        assert!(infer_temporal("MODIS aerosol 2020 global").is_none());
        assert!(infer_temporal("MODIS aerosol 2020 and again 2020").is_none());
        assert!(infer_temporal("sea surface temperature").is_none());
    }

    #[test]
    fn out_of_range_years_ignored() {
        assert!(infer_temporal("from 1850 to 2150").is_none());
        assert!(infer_temporal("codes 12019 and 20201").is_none());
    }

    #[test]
    fn sub_saharan_bbox() {
        assert_eq!(
            infer_bbox("Datasets for Sub-Saharan Africa"),
            Some(BoundingBox::new(-20.0, -35.0, 52.0, 20.0))
        );
    }

    #[test]
    fn first_alias_wins() {
        assert_eq!(
            infer_bbox("global and sub-saharan africa comparison"),
            Some(SUB_SAHARAN_AFRICA)
        );
        assert_eq!(infer_bbox("GLOBAL aerosol"), Some(GLOBAL));
        assert_eq!(infer_bbox("arctic sea ice"), None);
    }

    proptest! {
        #[test]
        fn prop_temporal_ignores_year_order(
            years in proptest::collection::vec(1900i32..2100, 0..6),
            seed in any::<u64>()
        ) {
            let forward = years
                .iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>()
                .join(" then ");

            let mut shuffled = years.clone();
            let len = shuffled.len().max(1);
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();
            let backward = shuffled
                .iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>()
                .join(" then ");

            prop_assert_eq!(infer_temporal(&forward), infer_temporal(&backward));

            let distinct: BTreeSet<i32> = years.iter().copied().collect();
            match infer_temporal(&forward) {
                Some(range) => {
                    prop_assert!(distinct.len() >= 2);
                    prop_assert_eq!(range.start.format("%Y").to_string(), distinct.first().unwrap().to_string());
                    prop_assert_eq!(range.end.format("%Y").to_string(), distinct.last().unwrap().to_string());
                }
                None => prop_assert!(distinct.len() < 2),
            }
        }
    }
}
