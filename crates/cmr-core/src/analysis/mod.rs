//! Aggregation & analysis engine
//!
//! Turns raw retrieval output into an `AnalysisSummary`:
//! - Totals and per sub-query counts, providers and examples
//! - Temporal coverage, gaps and latency from granule ranges
//! - Spatial union of granule rectangles
//! - Relevance score against caller constraints
//! - A global knowledge graph
//!
//! Malformed items or fields are skipped; nothing here returns an error.

pub mod graph;
pub mod spatial;
pub mod temporal;

use crate::item::{as_f64, non_empty_str, Item};
use crate::types::{
    AnalysisSummary, BoundingBox, QueryAnalysis, RetrievalOutput, SearchResult, TemporalRange,
};
use chrono::{DateTime, Utc};
use graph::GraphBuilder;
use serde_json::Value;
use std::collections::BTreeSet;

/// Records considered for examples and resolution attributes
pub const EXAMPLE_LIMIT: usize = 5;

/// Score weight of temporal overlap (per 365 days)
pub const TEMPORAL_WEIGHT: f64 = 0.5;
/// Score weight of spatial IoU
pub const SPATIAL_WEIGHT: f64 = 0.3;
/// Score weight of declared resolution
pub const RESOLUTION_WEIGHT: f64 = 0.2;

const RESOLUTION_PREFIX: &str = "spatial resolution";

/// Time source for latency
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Wall clock
    #[default]
    System,
    /// Frozen instant
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Current instant
    #[inline]
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Aggregation engine
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    clock: Clock,
}

impl AnalysisEngine {
    /// Create engine on the wall clock
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a frozen clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Summarize a retrieval against optional constraints
    #[must_use]
    pub fn analyze(
        &self,
        retrieval: &RetrievalOutput,
        temporal: Option<&TemporalRange>,
        bbox: Option<&BoundingBox>,
    ) -> AnalysisSummary {
        let now = self.clock.now();
        let mut summary = AnalysisSummary::default();
        let mut graph = GraphBuilder::new();

        for search in &retrieval.searches {
            let analysis = analyze_search(search, temporal, bbox, now);
            summary.total_collections += analysis.collections_found;
            summary.total_granules += analysis.granules_found;
            summary.total_variables += analysis.variables_found;

            for collection in search.collections.items() {
                graph.add_collection(collection);
            }
            for variable in search.variables.items() {
                graph.add_variable(variable);
            }

            tracing::debug!(
                query = %analysis.query,
                collections = analysis.collections_found,
                granules = analysis.granules_found,
                variables = analysis.variables_found,
                score = analysis.score,
                "analyzed sub-query"
            );
            summary.queries.push(analysis);
        }

        summary.knowledge_graph = graph.build();
        summary
    }
}

/// Analysis of a single search result
fn analyze_search(
    search: &SearchResult,
    temporal: Option<&TemporalRange>,
    bbox: Option<&BoundingBox>,
    now: DateTime<Utc>,
) -> QueryAnalysis {
    let collections = search.collections.items();
    let granules = search.granules.items();
    let variables = search.variables.items();

    let providers = collections
        .iter()
        .map(|c| c.provider_id().unwrap_or("unknown").to_string())
        .collect();

    let example_collections = collections
        .iter()
        .take(EXAMPLE_LIMIT)
        .filter_map(Item::collection_title)
        .map(str::to_string)
        .collect();

    let example_variables = variables
        .iter()
        .take(EXAMPLE_LIMIT)
        .filter_map(Item::variable_name)
        .map(str::to_string)
        .collect();

    let intervals: Vec<TemporalRange> =
        granules.iter().filter_map(temporal::granule_interval).collect();
    let covered = temporal::coverage(&intervals);

    let boxes: Vec<BoundingBox> = granules.iter().flat_map(spatial::granule_boxes).collect();
    let spatial_extent = spatial::union_all(&boxes);

    let related_collections: BTreeSet<String> = variables
        .iter()
        .flat_map(Item::associated_collections)
        .map(str::to_string)
        .collect();

    let resolutions = resolutions(collections);

    let latency_days = covered
        .as_ref()
        .map(|c| (now - c.end).num_seconds().div_euclid(86_400));

    let score = relevance_score(
        covered.as_ref(),
        temporal,
        spatial_extent.as_ref(),
        bbox,
        !resolutions.is_empty(),
    );

    QueryAnalysis {
        query: search.query.clone(),
        collections_found: collections.len(),
        granules_found: granules.len(),
        variables_found: variables.len(),
        providers,
        example_collections,
        example_variables,
        temporal_coverage: covered.as_ref().map(temporal::as_dates),
        spatial_extent,
        related_collections,
        resolutions,
        latency_days,
        temporal_gaps: temporal::detect_gaps(&intervals),
        score,
    }
}

/// Spatial resolution values declared in `AdditionalAttributes` of the first collections
fn resolutions(collections: &[Item]) -> Vec<String> {
    collections
        .iter()
        .take(EXAMPLE_LIMIT)
        .flat_map(|c| c.array_at(&["umm", "AdditionalAttributes"]))
        .filter(|attr| {
            attr.get("Name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.trim().to_lowercase().starts_with(RESOLUTION_PREFIX))
        })
        .flat_map(attribute_values)
        .collect()
}

/// `Values` list or single `Value` of an additional attribute
fn attribute_values(attr: &Value) -> Vec<String> {
    let scalar = |v: &Value| match v {
        Value::Number(_) => as_f64(v).map(|n| n.to_string()),
        _ => non_empty_str(v).map(str::to_string),
    };
    if let Some(values) = attr.get("Values").and_then(Value::as_array) {
        return values.iter().filter_map(scalar).collect();
    }
    attr.get("Value").and_then(scalar).into_iter().collect()
}

/// Weighted relevance, rounded to three decimals
///
/// The weights are heuristics kept for behavioural compatibility.
#[must_use]
pub fn relevance_score(
    coverage: Option<&TemporalRange>,
    temporal: Option<&TemporalRange>,
    extent: Option<&BoundingBox>,
    bbox: Option<&BoundingBox>,
    has_resolution: bool,
) -> f64 {
    let overlap_days = match (coverage, temporal) {
        (Some(c), Some(t)) => c.overlap_days(t),
        _ => 0,
    };
    let iou = match (extent, bbox) {
        (Some(e), Some(b)) => e.iou(b),
        _ => 0.0,
    };
    let resolution = if has_resolution { 1.0 } else { 0.0 };

    let raw = TEMPORAL_WEIGHT * (overlap_days as f64 / 365.0)
        + SPATIAL_WEIGHT * iou
        + RESOLUTION_WEIGHT * resolution;
    (raw * 1000.0).round() / 1000.0
}

/// Analyze on the wall clock
#[must_use]
pub fn analyze(
    retrieval: &RetrievalOutput,
    temporal: Option<&TemporalRange>,
    bbox: Option<&BoundingBox>,
) -> AnalysisSummary {
    AnalysisEngine::new().analyze(retrieval, temporal, bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResultSet;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn search(collections: Vec<Value>, granules: Vec<Value>, variables: Vec<Value>) -> SearchResult {
        let wrap = |v: Vec<Value>| ResultSet::Items(v.into_iter().map(Item::new).collect());
        SearchResult {
            query: "q".to_string(),
            collections: wrap(collections),
            granules: wrap(granules),
            variables: wrap(variables),
        }
    }

    #[test]
    fn providers_default_and_dedupe() {
        let result = search(
            vec![
                json!({"meta": {"provider-id": "B"}}),
                json!({"meta": {"provider-id": "A"}}),
                json!({"meta": {"provider-id": "B"}}),
                json!({"umm": {}}),
            ],
            vec![],
            vec![],
        );
        let analysis = analyze_search(&result, None, None, utc(2024, 1, 1));
        let providers: Vec<_> = analysis.providers.into_iter().collect();
        assert_eq!(providers, vec!["A", "B", "unknown"]);
    }

    #[test]
    fn examples_limited_and_filtered() {
        let collections = (0..7)
            .map(|i| {
                if i == 1 {
                    json!({"umm": {}})
                } else {
                    json!({"umm": {"ShortName": format!("C{i}")}})
                }
            })
            .collect();
        let analysis = analyze_search(&search(collections, vec![], vec![]), None, None, utc(2024, 1, 1));
        assert_eq!(analysis.example_collections, vec!["C0", "C2", "C3", "C4"]);
        assert_eq!(analysis.collections_found, 7);
    }

    #[test]
    fn resolution_attribute_detection() {
        let collections = vec![json!({"umm": {"AdditionalAttributes": [
            {"Name": "Processing Level", "Value": "L3"},
            {"Name": "Spatial Resolution (km)", "Values": ["0.1", "0.25"]},
            {"Name": "spatial resolution", "Values": []}
        ]}})];
        let found = resolutions(&collections.into_iter().map(Item::new).collect::<Vec<_>>());
        assert_eq!(found, vec!["0.1", "0.25"]);
    }

    #[test]
    fn score_components() {
        let coverage = TemporalRange::new(utc(2020, 1, 1), utc(2021, 1, 1));
        let constraint = TemporalRange::new(utc(2020, 1, 1), utc(2020, 12, 31));
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        assert_eq!(relevance_score(None, None, None, None, false), 0.0);
        assert_eq!(relevance_score(None, None, None, None, true), 0.2);
        assert_eq!(relevance_score(None, None, Some(&bbox), Some(&bbox), false), 0.3);
        // 365 days of overlap
        assert_eq!(
            relevance_score(Some(&coverage), Some(&constraint), None, None, false),
            0.5
        );
        assert_eq!(
            relevance_score(Some(&coverage), Some(&constraint), Some(&bbox), Some(&bbox), true),
            1.0
        );
    }

    #[test]
    fn score_rounds_to_three_places() {
        let coverage = TemporalRange::new(utc(2020, 1, 1), utc(2020, 1, 11));
        let score = relevance_score(Some(&coverage), Some(&coverage), None, None, false);
        // 0.5 * 10 / 365 = 0.013698...
        assert_eq!(score, 0.014);
    }

    #[test]
    fn latency_floors_days() {
        let granules = vec![json!({"umm": {"TemporalExtent": {"RangeDateTime": {
            "BeginningDateTime": "2020-01-01T00:00:00Z",
            "EndingDateTime": "2020-01-10T12:00:00Z"
        }}}})];
        let now = Utc.with_ymd_and_hms(2020, 1, 12, 0, 0, 0).unwrap();
        let analysis = analyze_search(&search(vec![], granules, vec![]), None, None, now);
        assert_eq!(analysis.latency_days, Some(1));
    }

    #[test]
    fn failed_sets_count_as_empty() {
        let retrieval = RetrievalOutput {
            searches: vec![SearchResult::all_failed("q", "boom")],
        };
        let summary = analyze(&retrieval, None, None);
        assert_eq!(summary.total_collections, 0);
        assert_eq!(summary.queries.len(), 1);
        assert_eq!(summary.queries[0].latency_days, None);
        assert_eq!(summary.queries[0].temporal_coverage, None);
    }
}
