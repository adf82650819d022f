//! Pipeline controller
//!
//! Sequences one run over an owned `QueryState`:
//!
//! ```text
//! start -> infer-constraints -> validate -+-> plan -> retrieve -> analyze -+-> finalize
//!                                         |                                |
//!                                         +---------- not validated -------+
//! ```
//!
//! Each stage takes the state by value and hands it to the next, so only
//! one stage can write it at a time. A built pipeline never fails a run:
//! catalog and oracle failures are absorbed below this layer.

use crate::error::AgentResult;
use crate::intent::{self, IntentClassifier};
use crate::oracle::LanguageOracle;
use crate::planning::{Planner, TermExpander};
use crate::session::{InMemorySessionStore, SessionStore};
use crate::synthesis::Synthesizer;
use cmr_core::{
    infer_bbox, infer_temporal, AgentConfig, AnalysisEngine, Clock, QueryState, Stage,
    ValidationGate,
};
use cmr_retrieval::{
    CachedCatalogClient, CatalogClient, HttpCatalogClient, RetrievalCoordinator,
    SearchConstraints,
};
use std::sync::Arc;
use tracing::Instrument;

/// Data-discovery pipeline
pub struct Pipeline {
    classifier: IntentClassifier,
    gate: ValidationGate,
    planner: Planner,
    coordinator: RetrievalCoordinator,
    engine: AnalysisEngine,
    synthesizer: Synthesizer,
    sessions: Arc<dyn SessionStore>,
}

impl Pipeline {
    /// Start building a pipeline
    #[inline]
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Run a fresh query
    pub async fn run(&self, query: impl Into<String>) -> QueryState {
        self.run_with(QueryState::new(query)).await
    }

    /// Run a query within a session, seeding and persisting its history
    pub async fn run_in_session(&self, session_id: &str, query: impl Into<String>) -> QueryState {
        let query = query.into();
        let history = self.sessions.load(session_id).await;
        let state = self
            .run_with(QueryState::new(query.clone()).with_history(history))
            .await;
        self.sessions.append(session_id, query).await;
        state
    }

    /// Run a caller-prepared state (history or sub-queries pre-seeded)
    pub async fn run_with(&self, state: QueryState) -> QueryState {
        let span = tracing::info_span!("pipeline", run_id = %state.run_id);
        async move {
            tracing::info!("Running query: {}", state.user_query);

            let state = self.start(state);
            let state = self.infer_constraints(state).await;
            let state = self.validate(state);

            let state = if state.validated {
                let state = self.plan(state).await;
                let state = self.retrieve(state).await;
                self.analyze(state)
            } else {
                tracing::info!(notes = %state.validation_notes, "query not admitted, skipping retrieval");
                state
            };

            let state = self.finalize(state).await;
            tracing::info!(stages = state.stages.len(), "Run completed");
            state
        }
        .instrument(span)
        .await
    }

    /// Session store in use
    #[inline]
    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    fn start(&self, mut state: QueryState) -> QueryState {
        state.history.push(state.user_query.clone());
        finish(state, Stage::Start)
    }

    async fn infer_constraints(&self, mut state: QueryState) -> QueryState {
        if let Some(temporal) = infer_temporal(&state.user_query) {
            state.temporal = Some(temporal);
        }
        if let Some(bbox) = infer_bbox(&state.user_query) {
            state.bbox = Some(bbox);
        }

        if state.subqueries.is_empty() {
            let (intent, subqueries) = self.classifier.classify(&state.user_query).await;
            state.intent = Some(intent);
            state.subqueries = subqueries;
        } else {
            state.intent = Some(intent::heuristic(&state.user_query).0);
        }

        tracing::debug!(
            temporal = ?state.temporal,
            bbox = ?state.bbox,
            intent = ?state.intent,
            subqueries = ?state.subqueries,
            "inferred constraints"
        );
        finish(state, Stage::InferConstraints)
    }

    fn validate(&self, mut state: QueryState) -> QueryState {
        let outcome = self.gate.validate(&state.user_query, &state.subqueries);
        state.validated = outcome.feasible;
        state.validation_notes = outcome.notes();
        finish(state, Stage::Validate)
    }

    async fn plan(&self, mut state: QueryState) -> QueryState {
        let plan = self.planner.plan(&state.user_query, &state.subqueries).await;
        tracing::debug!(
            stages = plan.stages.len(),
            terms = plan.expanded_terms.len(),
            "planned search"
        );
        state.plan = Some(plan);
        finish(state, Stage::Plan)
    }

    async fn retrieve(&self, mut state: QueryState) -> QueryState {
        let stages = state.search_stages();
        let constraints = SearchConstraints::new(state.temporal, state.bbox);
        let output = self.coordinator.retrieve_stages(&stages, constraints).await;

        let failed = output
            .searches
            .iter()
            .flat_map(|s| [&s.collections, &s.granules, &s.variables])
            .filter(|set| set.is_failed())
            .count();
        if failed > 0 {
            tracing::warn!(failed, "some catalog searches failed");
        }

        state.retrieval_results = Some(output);
        finish(state, Stage::Retrieve)
    }

    fn analyze(&self, mut state: QueryState) -> QueryState {
        if let Some(retrieval) = &state.retrieval_results {
            let summary =
                self.engine
                    .analyze(retrieval, state.temporal.as_ref(), state.bbox.as_ref());
            tracing::info!(
                collections = summary.total_collections,
                granules = summary.total_granules,
                variables = summary.total_variables,
                "Analysis complete"
            );
            state.analysis = Some(summary);
        }
        finish(state, Stage::Analyze)
    }

    async fn finalize(&self, mut state: QueryState) -> QueryState {
        state.synthesis = Some(self.synthesizer.synthesize(&state).await);
        finish(state, Stage::Finalize)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("classifier", &self.classifier)
            .field("planner", &self.planner)
            .field("coordinator", &self.coordinator)
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}

fn finish(mut state: QueryState, stage: Stage) -> QueryState {
    tracing::info!(%stage, "stage complete");
    state.complete(stage);
    state
}

/// Builder for `Pipeline`
///
/// Without an injected catalog client, `build` creates an HTTP client from
/// the catalog configuration. Without an oracle, every language-dependent
/// step uses its deterministic variant.
#[derive(Default)]
pub struct PipelineBuilder {
    config: AgentConfig,
    catalog: Option<Arc<dyn CatalogClient>>,
    oracle: Option<Arc<dyn LanguageOracle>>,
    sessions: Option<Arc<dyn SessionStore>>,
    clock: Clock,
}

impl PipelineBuilder {
    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// With catalog client
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogClient>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// With language oracle
    #[inline]
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn LanguageOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// With session store
    #[inline]
    #[must_use]
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// With analysis clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Assemble the pipeline
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Config` for invalid configuration and
    /// `AgentError::Catalog` if the HTTP client cannot be created.
    pub fn build(self) -> AgentResult<Pipeline> {
        let Self {
            config,
            catalog,
            oracle,
            sessions,
            clock,
        } = self;
        config.validate()?;

        let catalog = match catalog {
            Some(catalog) => catalog,
            None => Arc::new(HttpCatalogClient::new(&config.catalog)?) as Arc<dyn CatalogClient>,
        };
        let catalog = if config.cache.enabled {
            Arc::new(CachedCatalogClient::from_config(catalog, &config.cache)) as Arc<dyn CatalogClient>
        } else {
            catalog
        };

        tracing::debug!(
            oracle = ?oracle.as_ref().map(|o| o.name()),
            cache = config.cache.enabled,
            provider = ?config.catalog.provider_filter(),
            "building pipeline"
        );

        Ok(Pipeline {
            classifier: IntentClassifier::from_oracle(oracle.clone()),
            gate: ValidationGate::new(config.validation.clone()),
            planner: Planner::new(TermExpander::from_oracle(oracle.clone())),
            coordinator: RetrievalCoordinator::from_config(catalog, &config),
            engine: AnalysisEngine::new().with_clock(clock),
            synthesizer: Synthesizer::from_oracle(oracle),
            sessions: sessions.unwrap_or_else(|| Arc::new(InMemorySessionStore::new())),
        })
    }
}
