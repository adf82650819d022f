//! Retrieval coordinator
//!
//! Fans out one task per search stage and joins them all. Within a stage:
//! - collections and variables are searched concurrently
//! - granules wait on the collection outcome, then narrow to the first
//!   collection's concept id when there is one
//!
//! Collection and variable failures are captured as `ResultSet::Failed`;
//! any granule failure collapses to an empty set. A panicking stage task
//! marks that stage failed and leaves the others untouched.

use crate::client::{CatalogClient, SearchParams};
use cmr_core::{
    infer_bbox, infer_temporal, AgentConfig, BoundingBox, Item, PlanStage, ResultSet,
    RetrievalOutput, SearchConfig, SearchResult, TemporalRange,
};
use futures::future::{join_all, FutureExt};
use std::sync::Arc;

/// Pipeline-level constraints used when a stage's text yields none of its own
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchConstraints {
    /// Temporal range
    pub temporal: Option<TemporalRange>,
    /// Bounding box
    pub bbox: Option<BoundingBox>,
}

impl SearchConstraints {
    /// Create constraints
    #[inline]
    #[must_use]
    pub fn new(temporal: Option<TemporalRange>, bbox: Option<BoundingBox>) -> Self {
        Self { temporal, bbox }
    }
}

/// Requests issued for one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageRequests {
    /// Stage keyword
    pub query: String,
    /// Collection search
    pub collections: SearchParams,
    /// Granule search, before the collection id is known
    pub granules: SearchParams,
    /// Variable search
    pub variables: SearchParams,
}

/// Concurrent retrieval across search stages
#[derive(Clone)]
pub struct RetrievalCoordinator {
    client: Arc<dyn CatalogClient>,
    search: SearchConfig,
    provider: Option<String>,
}

impl RetrievalCoordinator {
    /// Create coordinator with default page sizes and no provider filter
    #[must_use]
    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        Self {
            client,
            search: SearchConfig::default(),
            provider: None,
        }
    }

    /// Create coordinator from configuration
    #[must_use]
    pub fn from_config(client: Arc<dyn CatalogClient>, config: &AgentConfig) -> Self {
        Self {
            client,
            search: config.search,
            provider: config.catalog.provider_filter().map(str::to_string),
        }
    }

    /// With page sizes
    #[inline]
    #[must_use]
    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// With provider filter
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Retrieve for a query and its sub-queries
    ///
    /// Falls back to the query itself when there are no sub-queries.
    pub async fn retrieve(&self, query: &str, subqueries: &[String]) -> RetrievalOutput {
        let stages: Vec<PlanStage> = if subqueries.is_empty() {
            vec![PlanStage::bare(query)]
        } else {
            subqueries.iter().map(PlanStage::bare).collect()
        };
        self.retrieve_stages(&stages, SearchConstraints::default()).await
    }

    /// Retrieve for planned stages, in stage order
    pub async fn retrieve_stages(
        &self,
        stages: &[PlanStage],
        fallback: SearchConstraints,
    ) -> RetrievalOutput {
        tracing::info!("Retrieving {} search stages", stages.len());

        let handles: Vec<_> = stages
            .iter()
            .map(|stage| {
                let requests = self.requests_for(stage, &fallback);
                tokio::spawn(search_stage(Arc::clone(&self.client), requests))
            })
            .collect();

        let joined = join_all(handles).await;
        let searches = joined
            .into_iter()
            .zip(stages)
            .map(|(outcome, stage)| {
                outcome.unwrap_or_else(|e| {
                    tracing::error!(query = %stage.query, "search task failed: {}", e);
                    SearchResult::all_failed(stage.query.clone(), &format!("search task failed: {e}"))
                })
            })
            .collect();

        RetrievalOutput { searches }
    }

    /// Build the requests for one stage
    #[must_use]
    pub fn requests_for(&self, stage: &PlanStage, fallback: &SearchConstraints) -> StageRequests {
        let temporal = infer_temporal(&stage.query).or(fallback.temporal);
        let bbox = infer_bbox(&stage.query).or(fallback.bbox);

        let mut collections = SearchParams::new(&stage.query, self.search.collection_page_size);
        if let Some(provider) = &self.provider {
            collections = collections.with_provider(provider);
        }
        if let Some(range) = &temporal {
            collections = collections.with_temporal(range);
        }
        if let Some(bbox) = &bbox {
            collections = collections.with_bounding_box(bbox);
        }

        let granules = collections
            .clone()
            .with_page_size(self.search.granule_page_size);
        let variables = SearchParams::new(&stage.query, self.search.variable_page_size);

        StageRequests {
            query: stage.query.clone(),
            collections,
            granules,
            variables,
        }
    }
}

impl std::fmt::Debug for RetrievalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalCoordinator")
            .field("search", &self.search)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Run the three searches of one stage
async fn search_stage(client: Arc<dyn CatalogClient>, requests: StageRequests) -> SearchResult {
    let StageRequests {
        query,
        collections: collection_params,
        granules: granule_params,
        variables: variable_params,
    } = requests;

    tracing::debug!(%query, params = ?collection_params, "searching stage");

    // Resolved once, awaited by both the granule continuation and the join below
    let collections = {
        let client = Arc::clone(&client);
        async move {
            client
                .search_collections(&collection_params)
                .await
                .map_err(|e| e.to_string())
        }
    }
    .shared();

    let granules = {
        let client = Arc::clone(&client);
        let collections = collections.clone();
        async move {
            let mut params = granule_params;
            if let Ok(items) = collections.await {
                if let Some(concept_id) = items.first().and_then(Item::concept_id) {
                    params = params.with_collection_concept_id(concept_id);
                }
            }
            match client.search_granules(&params).await {
                Ok(items) => ResultSet::Items(items),
                Err(e) => {
                    tracing::warn!(keyword = %params.keyword, "granule search failed, using empty set: {}", e);
                    ResultSet::empty()
                }
            }
        }
    };

    let variables = async {
        client
            .search_variables(&variable_params)
            .await
            .map_err(|e| e.to_string())
    };

    let (collections, granules, variables) = tokio::join!(collections, granules, variables);

    SearchResult {
        query,
        collections: capture(collections),
        granules,
        variables: capture(variables),
    }
}

fn capture(outcome: Result<Vec<Item>, String>) -> ResultSet {
    match outcome {
        Ok(items) => ResultSet::Items(items),
        Err(reason) => {
            tracing::warn!("catalog search captured as failure: {}", reason);
            ResultSet::Failed(reason)
        }
    }
}
