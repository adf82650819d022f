//! CMR Agent Core
//!
//! The deterministic half of the data-discovery agent:
//! - The `QueryState` record threaded through one pipeline run
//! - Temporal and spatial constraint inference from free text
//! - The validation gate deciding whether a query reaches the catalog
//! - The analysis engine reconciling catalog results into a summary
//!
//! # Example
//!
//! ```rust
//! use cmr_core::{infer_bbox, infer_temporal};
//!
//! let query = "rainfall 2010-2012 over sub-saharan africa";
//! let temporal = infer_temporal(query).unwrap();
//! assert_eq!(temporal.to_param(), "2010-01-01T00:00:00Z,2012-12-31T23:59:59Z");
//! assert_eq!(infer_bbox(query).unwrap().to_param(), "-20.0,-35.0,52.0,20.0");
//! ```

#![warn(unreachable_pub)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod inference;
pub mod item;
pub mod types;
pub mod validation;

pub use analysis::{AnalysisEngine, Clock};
pub use config::{AgentConfig, CacheConfig, CatalogConfig, SearchConfig, ValidationConfig};
pub use error::{CoreError, CoreResult};
pub use inference::{infer_bbox, infer_temporal};
pub use item::Item;
pub use types::{
    AnalysisSummary, BoundingBox, EdgeKind, GraphEdge, GraphNodes, Intent, KnowledgeGraph,
    PlanStage, QueryAnalysis, QueryState, ResultSet, RetrievalOutput, RunId, SearchPlan,
    SearchResult, Stage, TemporalCoverage, TemporalGap, TemporalRange, STATE_VERSION,
};
pub use validation::{ValidationGate, ValidationOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
