//! Core types for the CMR agent
//!
//! Defines the data threaded through the pipeline:
//! - `QueryState`, the single record owned by one pipeline run
//! - Retrieval output (`RetrievalOutput`, `SearchResult`, `ResultSet`)
//! - Analysis output (`AnalysisSummary`, `QueryAnalysis`, `KnowledgeGraph`)
//! - Constraint values (`TemporalRange`, `BoundingBox`)

use crate::analysis::temporal::parse_timestamp;
use crate::error::CoreError;
use crate::item::Item;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ulid::Ulid;

/// Schema version of `QueryState`
pub const STATE_VERSION: u32 = 1;

/// Unique pipeline run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive temporal range in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalRange {
    /// Range start
    pub start: DateTime<Utc>,
    /// Range end
    pub end: DateTime<Utc>,
}

impl TemporalRange {
    /// Create new range
    #[inline]
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Catalog parameter form: `start,end` in ISO-8601 with a `Z` suffix
    #[must_use]
    pub fn to_param(&self) -> String {
        format!(
            "{},{}",
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }

    /// Whole days of overlap with another range (0 when disjoint)
    #[must_use]
    pub fn overlap_days(&self, other: &TemporalRange) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end <= start {
            return 0;
        }
        (end - start).num_days()
    }
}

/// Rectangular extent in geographic degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude
    pub west: f64,
    /// Southern latitude
    pub south: f64,
    /// Eastern longitude
    pub east: f64,
    /// Northern latitude
    pub north: f64,
}

impl BoundingBox {
    /// Create new bounding box
    #[inline]
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Catalog parameter form: `west,south,east,north`
    #[must_use]
    pub fn to_param(&self) -> String {
        format!(
            "{:?},{:?},{:?},{:?}",
            self.west, self.south, self.east, self.north
        )
    }

    /// Planar area; inverted boxes have zero area
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        (self.east - self.west).max(0.0) * (self.north - self.south).max(0.0)
    }

    /// Smallest box covering both
    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    /// Area shared with another box
    #[must_use]
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        BoundingBox {
            west: self.west.max(other.west),
            south: self.south.max(other.south),
            east: self.east.min(other.east),
            north: self.north.min(other.north),
        }
        .area()
    }

    /// Intersection over union; a non-positive union counts as 1.0
    #[must_use]
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let intersection = self.intersection_area(other);
        let mut union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            union = 1.0;
        }
        intersection / union
    }
}

impl std::str::FromStr for TemporalRange {
    type Err = CoreError;

    /// Parse the catalog parameter form `start,end`
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (start, end) = text
            .split_once(',')
            .ok_or_else(|| CoreError::InvalidTimestamp(text.to_string()))?;
        let parse = |part: &str| {
            parse_timestamp(part).ok_or_else(|| CoreError::InvalidTimestamp(part.trim().to_string()))
        };
        let range = TemporalRange::new(parse(start)?, parse(end)?);
        if range.end < range.start {
            return Err(CoreError::InvalidTimestamp(format!("{text}: end precedes start")));
        }
        Ok(range)
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = CoreError;

    /// Parse the catalog parameter form `west,south,east,north`
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let values = text
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::InvalidBoundingBox(format!("{text}: {e}")))?;
        match values.as_slice() {
            [west, south, east, north] if values.iter().all(|v| v.is_finite()) => {
                Ok(BoundingBox::new(*west, *south, *east, *north))
            }
            _ => Err(CoreError::InvalidBoundingBox(format!(
                "{text}: expected four finite numbers"
            ))),
        }
    }
}

/// Query intent classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Open-ended browsing
    Exploratory,
    /// Looking for specific datasets
    Specific,
    /// Comparing or relating datasets
    Analytical,
}

impl Default for Intent {
    fn default() -> Self {
        Intent::Exploratory
    }
}

/// One stage of a search plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStage {
    /// Keyword issued to the catalog
    pub query: String,
    /// Expanded terms relevant to variable lookups
    pub variable_terms: Vec<String>,
}

impl PlanStage {
    /// Stage for a bare query with no expansion
    #[inline]
    #[must_use]
    pub fn bare(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variable_terms: Vec::new(),
        }
    }
}

/// Search plan produced by term expansion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    /// Deduplicated expanded terms, in discovery order
    pub expanded_terms: Vec<String>,
    /// One stage per sub-query
    pub stages: Vec<PlanStage>,
}

/// Outcome of one catalog search: items or a captured failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSet {
    /// Successful search
    Items(Vec<Item>),
    /// Failed search with a description
    #[serde(rename = "error")]
    Failed(String),
}

impl ResultSet {
    /// Empty successful result
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::Items(Vec::new())
    }

    /// Captured failure
    #[inline]
    pub fn failed(description: impl Into<String>) -> Self {
        Self::Failed(description.into())
    }

    /// Items; a failure reads as no items
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Item] {
        match self {
            Self::Items(items) => items,
            Self::Failed(_) => &[],
        }
    }

    /// Check if this is a captured failure
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Failure description, if any
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            Self::Items(_) => None,
        }
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Retrieval outcome for one sub-query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Sub-query text
    pub query: String,
    /// Collection search outcome
    pub collections: ResultSet,
    /// Granule search outcome
    pub granules: ResultSet,
    /// Variable search outcome
    pub variables: ResultSet,
}

impl SearchResult {
    /// Result with all three searches failed for the same reason
    #[must_use]
    pub fn all_failed(query: impl Into<String>, reason: &str) -> Self {
        Self {
            query: query.into(),
            collections: ResultSet::failed(reason),
            granules: ResultSet::failed(reason),
            variables: ResultSet::failed(reason),
        }
    }
}

/// Retrieval output: one `SearchResult` per sub-query, in sub-query order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutput {
    /// Per sub-query results
    pub searches: Vec<SearchResult>,
}

/// Temporal coverage as calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalCoverage {
    /// Earliest granule begin
    pub start: NaiveDate,
    /// Latest granule end
    pub end: NaiveDate,
}

/// Gap between two disjoint granule intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalGap {
    /// End of the earlier interval
    pub gap_start: NaiveDate,
    /// Begin of the later interval
    pub gap_end: NaiveDate,
    /// Whole days between them
    pub gap_days: i64,
}

/// Knowledge graph edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Collection observed by instrument
    #[serde(rename = "collection-instrument")]
    CollectionInstrument,
    /// Variable measured in collection
    #[serde(rename = "variable-collection")]
    VariableCollection,
}

/// Directed knowledge graph edge
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node
    pub source: String,
    /// Target node
    pub target: String,
    /// Edge kind
    pub kind: EdgeKind,
}

/// Knowledge graph node sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNodes {
    /// Collection concept ids
    pub collections: BTreeSet<String>,
    /// Variable names
    pub variables: BTreeSet<String>,
    /// Instrument names
    pub instruments: BTreeSet<String>,
}

/// Knowledge graph accumulated across all sub-queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    /// Node sets
    pub nodes: GraphNodes,
    /// Deduplicated edges in sorted order
    pub edges: BTreeSet<GraphEdge>,
}

/// Analysis of one sub-query's results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Sub-query text
    pub query: String,
    /// Collection count
    pub collections_found: usize,
    /// Granule count
    pub granules_found: usize,
    /// Variable count
    pub variables_found: usize,
    /// Provider ids of the collections
    pub providers: BTreeSet<String>,
    /// Up to five collection titles
    pub example_collections: Vec<String>,
    /// Up to five variable names
    pub example_variables: Vec<String>,
    /// Granule temporal coverage
    pub temporal_coverage: Option<TemporalCoverage>,
    /// Union of granule bounding boxes
    pub spatial_extent: Option<BoundingBox>,
    /// Collections associated with the variables
    pub related_collections: BTreeSet<String>,
    /// Spatial resolution values declared by collections
    pub resolutions: Vec<String>,
    /// Days since the coverage end
    pub latency_days: Option<i64>,
    /// Gaps between disjoint granule intervals
    pub temporal_gaps: Vec<TemporalGap>,
    /// Relevance score against the caller's constraints
    pub score: f64,
}

/// Aggregated analysis of a retrieval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Collections across all sub-queries
    pub total_collections: usize,
    /// Granules across all sub-queries
    pub total_granules: usize,
    /// Variables across all sub-queries
    pub total_variables: usize,
    /// Per sub-query analysis, in retrieval order
    pub queries: Vec<QueryAnalysis>,
    /// Global knowledge graph
    pub knowledge_graph: KnowledgeGraph,
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// History bookkeeping
    Start,
    /// Temporal/spatial inference and decomposition
    InferConstraints,
    /// Admissibility rules
    Validate,
    /// Term expansion
    Plan,
    /// Catalog retrieval
    Retrieve,
    /// Aggregation and scoring
    Analyze,
    /// Synthesis and hand-back
    Finalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::InferConstraints => "infer-constraints",
            Stage::Validate => "validate",
            Stage::Plan => "plan",
            Stage::Retrieve => "retrieve",
            Stage::Analyze => "analyze",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// The record threaded through one pipeline run
///
/// Each stage writes only its own fields; nothing is rolled back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    /// Schema version
    pub version: u32,
    /// Run identifier
    pub run_id: RunId,
    /// Incoming query
    pub user_query: String,
    /// Queries of this session, one entry per run
    pub history: Vec<String>,
    /// Classified intent
    pub intent: Option<Intent>,
    /// Decomposed sub-queries
    pub subqueries: Vec<String>,
    /// Inferred temporal constraint
    pub temporal: Option<TemporalRange>,
    /// Inferred spatial constraint
    pub bbox: Option<BoundingBox>,
    /// Validation verdict
    pub validated: bool,
    /// Validation notes joined with "; "
    pub validation_notes: String,
    /// Search plan
    pub plan: Option<SearchPlan>,
    /// Retrieval output
    pub retrieval_results: Option<RetrievalOutput>,
    /// Analysis output
    pub analysis: Option<AnalysisSummary>,
    /// Human-readable synthesis
    pub synthesis: Option<String>,
    /// Completed stages, in order
    pub stages: Vec<Stage>,
}

impl QueryState {
    /// Fresh state for a query
    #[must_use]
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            run_id: RunId::new(),
            user_query: user_query.into(),
            history: Vec::new(),
            intent: None,
            subqueries: Vec::new(),
            temporal: None,
            bbox: None,
            validated: false,
            validation_notes: String::new(),
            plan: None,
            retrieval_results: None,
            analysis: None,
            synthesis: None,
            stages: Vec::new(),
        }
    }

    /// Seed with prior session history
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }

    /// Seed with caller-supplied sub-queries
    #[inline]
    #[must_use]
    pub fn with_subqueries(mut self, subqueries: Vec<String>) -> Self {
        self.subqueries = subqueries;
        self
    }

    /// Seed constraints; text inference still takes precedence
    #[inline]
    #[must_use]
    pub fn with_constraints(
        mut self,
        temporal: Option<TemporalRange>,
        bbox: Option<BoundingBox>,
    ) -> Self {
        self.temporal = temporal;
        self.bbox = bbox;
        self
    }

    /// Record a completed stage
    #[inline]
    pub fn complete(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    /// Check whether a stage has completed
    #[inline]
    #[must_use]
    pub fn has_completed(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Search stages: the plan's, else the sub-queries, else the query itself
    #[must_use]
    pub fn search_stages(&self) -> Vec<PlanStage> {
        if let Some(plan) = self.plan.as_ref().filter(|p| !p.stages.is_empty()) {
            return plan.stages.clone();
        }
        if self.subqueries.is_empty() {
            vec![PlanStage::bare(self.user_query.clone())]
        } else {
            self.subqueries.iter().cloned().map(PlanStage::bare).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn run_id_generation() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn temporal_param_format() {
        let range = TemporalRange::new(
            utc(2010, 1, 1),
            Utc.with_ymd_and_hms(2012, 12, 31, 23, 59, 59).unwrap(),
        );
        assert_eq!(range.to_param(), "2010-01-01T00:00:00Z,2012-12-31T23:59:59Z");
    }

    #[test]
    fn temporal_overlap() {
        let a = TemporalRange::new(utc(2020, 1, 1), utc(2020, 1, 20));
        let b = TemporalRange::new(utc(2020, 1, 10), utc(2020, 3, 1));
        let c = TemporalRange::new(utc(2021, 1, 1), utc(2021, 2, 1));
        assert_eq!(a.overlap_days(&b), 10);
        assert_eq!(a.overlap_days(&c), 0);
    }

    #[test]
    fn bbox_param_keeps_decimal_point() {
        let bbox = BoundingBox::new(-20.0, -35.0, 52.0, 20.0);
        assert_eq!(bbox.to_param(), "-20.0,-35.0,52.0,20.0");
    }

    #[test]
    fn constraint_params_parse_back() {
        let range: TemporalRange = "2010-01-01T00:00:00Z,2012-12-31".parse().unwrap();
        assert_eq!(range.start, utc(2010, 1, 1));
        assert_eq!(range.end, utc(2012, 12, 31));
        assert!("2012-01-01,2010-01-01".parse::<TemporalRange>().is_err());
        assert!("2010".parse::<TemporalRange>().is_err());

        let bbox: BoundingBox = "-20, -35, 52, 20".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(-20.0, -35.0, 52.0, 20.0));
        assert!(matches!(
            "1,2,3".parse::<BoundingBox>(),
            Err(CoreError::InvalidBoundingBox(_))
        ));
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn bbox_union_and_iou() {
        let a = BoundingBox::new(-10.0, -5.0, 5.0, 10.0);
        let b = BoundingBox::new(-15.0, 0.0, 10.0, 12.0);
        assert_eq!(a.union(&b), BoundingBox::new(-15.0, -5.0, 10.0, 12.0));

        assert_eq!(a.iou(&a), 1.0);
        let far = BoundingBox::new(100.0, 50.0, 110.0, 60.0);
        assert_eq!(a.iou(&far), 0.0);
    }

    #[test]
    fn degenerate_boxes_do_not_divide_by_zero() {
        let point = BoundingBox::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(point.iou(&point), 0.0);
    }

    #[test]
    fn result_set_wire_shape() {
        let ok = ResultSet::Items(vec![Item::new(json!({"a": 1}))]);
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"items": [{"a": 1}]}));

        let failed = ResultSet::failed("timeout");
        assert_eq!(serde_json::to_value(&failed).unwrap(), json!({"error": "timeout"}));
        assert!(failed.items().is_empty());
    }

    #[test]
    fn search_stages_fallback() {
        let state = QueryState::new("rain");
        assert_eq!(state.search_stages(), vec![PlanStage::bare("rain")]);

        let state = QueryState::new("rain and snow")
            .with_subqueries(vec!["rain".into(), "snow".into()]);
        assert_eq!(state.search_stages().len(), 2);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::InferConstraints.to_string(), "infer-constraints");
        assert_eq!(
            serde_json::to_value(Stage::InferConstraints).unwrap(),
            json!("infer-constraints")
        );
    }
}
