//! Granule temporal extents: coverage and gap detection

use crate::item::{non_empty_str, Item};
use crate::types::{TemporalCoverage, TemporalGap, TemporalRange};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse an ISO-8601 timestamp; a trailing `Z` is UTC, naive values are taken as UTC
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `umm.TemporalExtent.RangeDateTime` of a granule, if both ends parse
#[must_use]
pub fn granule_interval(item: &Item) -> Option<TemporalRange> {
    let range = item.get_path(&["umm", "TemporalExtent", "RangeDateTime"])?;
    let begin = range.get("BeginningDateTime").and_then(non_empty_str)?;
    let end = range.get("EndingDateTime").and_then(non_empty_str)?;
    Some(TemporalRange::new(parse_timestamp(begin)?, parse_timestamp(end)?))
}

/// Earliest begin and latest end across intervals
#[must_use]
pub fn coverage(intervals: &[TemporalRange]) -> Option<TemporalRange> {
    let start = intervals.iter().map(|r| r.start).min()?;
    let end = intervals.iter().map(|r| r.end).max()?;
    Some(TemporalRange::new(start, end))
}

/// Coverage reported as calendar dates
#[inline]
#[must_use]
pub fn as_dates(range: &TemporalRange) -> TemporalCoverage {
    TemporalCoverage {
        start: range.start.date_naive(),
        end: range.end.date_naive(),
    }
}

/// Gaps between consecutive intervals after sorting by begin
///
/// Only the immediately preceding interval is compared, so overlapping or
/// touching neighbours produce no gap.
#[must_use]
pub fn detect_gaps(intervals: &[TemporalRange]) -> Vec<TemporalGap> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|r| (r.start, r.end));

    sorted
        .windows(2)
        .filter(|pair| pair[1].start > pair[0].end)
        .map(|pair| TemporalGap {
            gap_start: pair[0].end.date_naive(),
            gap_end: pair[1].start.date_naive(),
            gap_days: (pair[1].start - pair[0].end).num_days(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range(begin: &str, end: &str) -> TemporalRange {
        TemporalRange::new(parse_timestamp(begin).unwrap(), parse_timestamp(end).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn timestamp_forms() {
        let z = parse_timestamp("2020-01-01T00:00:00Z").unwrap();
        assert_eq!(parse_timestamp("2020-01-01T00:00:00+00:00"), Some(z));
        assert_eq!(parse_timestamp("2020-01-01T00:00:00.000Z"), Some(z));
        assert_eq!(parse_timestamp("2020-01-01T00:00:00"), Some(z));
        assert_eq!(parse_timestamp("2020-01-01"), Some(z));
        assert_eq!(
            parse_timestamp("2020-01-01T02:00:00+02:00"),
            Some(z),
            "offsets normalize to UTC"
        );
        assert!(parse_timestamp("01/02/2020").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn interval_requires_both_ends() {
        let ok = Item::new(json!({"umm": {"TemporalExtent": {"RangeDateTime": {
            "BeginningDateTime": "2020-01-01T00:00:00Z",
            "EndingDateTime": "2020-01-10T00:00:00Z"
        }}}}));
        assert!(granule_interval(&ok).is_some());

        let open = Item::new(json!({"umm": {"TemporalExtent": {"RangeDateTime": {
            "BeginningDateTime": "2020-01-01T00:00:00Z"
        }}}}));
        assert!(granule_interval(&open).is_none());

        let garbage = Item::new(json!({"umm": {"TemporalExtent": {"RangeDateTime": {
            "BeginningDateTime": "soon",
            "EndingDateTime": "later"
        }}}}));
        assert!(granule_interval(&garbage).is_none());
    }

    #[test]
    fn overlapping_intervals_have_no_gap() {
        let intervals = vec![
            range("2020-01-05T00:00:00Z", "2020-01-20T00:00:00Z"),
            range("2020-01-01T00:00:00Z", "2020-01-10T00:00:00Z"),
        ];
        let covered = as_dates(&coverage(&intervals).unwrap());
        assert_eq!(covered.start, date(2020, 1, 1));
        assert_eq!(covered.end, date(2020, 1, 20));
        assert!(detect_gaps(&intervals).is_empty());
    }

    #[test]
    fn disjoint_intervals_have_gap() {
        let intervals = vec![
            range("2020-01-10T00:00:00Z", "2020-01-15T00:00:00Z"),
            range("2020-01-01T00:00:00Z", "2020-01-05T00:00:00Z"),
        ];
        assert_eq!(
            detect_gaps(&intervals),
            vec![TemporalGap {
                gap_start: date(2020, 1, 5),
                gap_end: date(2020, 1, 10),
                gap_days: 5,
            }]
        );
    }

    #[test]
    fn touching_intervals_have_no_gap() {
        let intervals = vec![
            range("2020-01-01T00:00:00Z", "2020-01-05T00:00:00Z"),
            range("2020-01-05T00:00:00Z", "2020-01-07T00:00:00Z"),
        ];
        assert!(detect_gaps(&intervals).is_empty());
    }

    #[test]
    fn no_intervals_no_coverage() {
        assert!(coverage(&[]).is_none());
        assert!(detect_gaps(&[]).is_empty());
    }
}
