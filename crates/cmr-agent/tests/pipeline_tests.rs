//! Functional tests for the pipeline controller.
//!
//! These tests run whole pipelines over scripted catalogs and oracles:
//! - The end-to-end path from free text to analysis and synthesis
//! - The validation fork skipping retrieval and analysis
//! - Oracle-backed decomposition, expansion and synthesis with fallbacks
//! - Session history across runs

use chrono::{TimeZone, Utc};
use cmr_agent::{InMemorySessionStore, Pipeline, SessionStore};
use cmr_core::{AgentConfig, BoundingBox, Clock, Intent, QueryState, Stage};
use cmr_retrieval::SearchKind;
use cmr_test_utils::fixtures::{
    collection, collection_with_instruments, collection_with_resolution, granule_with_box,
    variable,
};
use cmr_test_utils::{RecordingCatalogClient, ScriptedOracle};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const RAINFALL: &str = "rainfall 2010-2012 over sub-saharan africa";

fn pipeline_over(client: Arc<RecordingCatalogClient>) -> Pipeline {
    Pipeline::builder()
        .with_config(AgentConfig::default().without_cache())
        .with_catalog(client)
        .with_clock(Clock::Fixed(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()))
        .build()
        .unwrap()
}

/// Tenet: free text becomes one constrained search, analyzed and summarized.
#[tokio::test]
async fn end_to_end_rainfall_query() {
    let client = Arc::new(
        RecordingCatalogClient::new()
            .with_items(
                SearchKind::Collections,
                vec![
                    collection_with_resolution("C1-GES_DISC", "0.1 degree"),
                    collection("C2-GES_DISC", "GES_DISC", "TRMM_3B43"),
                ],
            )
            .with_items(
                SearchKind::Granules,
                vec![
                    granule_with_box("2010-01-01T00:00:00Z", "2010-12-31T23:59:59Z", [-20.0, -35.0, 52.0, 20.0]),
                    granule_with_box("2012-01-01T00:00:00Z", "2012-12-31T23:59:59Z", [-20.0, -35.0, 52.0, 20.0]),
                ],
            )
            .with_items(SearchKind::Variables, vec![variable("precipitation", &["C1-GES_DISC"])]),
    );
    let state = pipeline_over(client.clone()).run(RAINFALL).await;

    assert!(state.validated);
    assert_eq!(state.subqueries, vec![RAINFALL]);
    assert_eq!(state.temporal.unwrap().to_param(), "2010-01-01T00:00:00Z,2012-12-31T23:59:59Z");

    let collection_calls = client.calls_of(SearchKind::Collections);
    assert_eq!(collection_calls.len(), 1);
    assert_eq!(
        collection_calls[0].temporal.as_deref(),
        Some("2010-01-01T00:00:00Z,2012-12-31T23:59:59Z")
    );
    assert_eq!(collection_calls[0].bounding_box.as_deref(), Some("-20.0,-35.0,52.0,20.0"));

    let analysis = state.analysis.as_ref().unwrap();
    assert_eq!(analysis.total_collections, 2);
    assert_eq!(analysis.total_granules, 2);
    let query = &analysis.queries[0];
    assert_eq!(query.temporal_gaps.len(), 1);
    assert_eq!(query.temporal_gaps[0].gap_days, 365);
    assert!(query.related_collections.contains("C1-GES_DISC"));
    // Three years of overlap, identical boxes, declared resolution
    assert_eq!(query.score, 2.0);

    let synthesis = state.synthesis.as_ref().unwrap();
    assert!(synthesis.contains("Total collections: 2"));
    assert!(synthesis.contains("providers=GES_DISC,PODAAC"));
}

/// Tenet: an inadmissible query never reaches the catalog.
#[tokio::test]
async fn rejected_query_skips_retrieval() {
    let client = Arc::new(RecordingCatalogClient::new());
    let state = pipeline_over(client.clone())
        .run("download my bank account statements")
        .await;

    assert!(!state.validated);
    assert!(state.validation_notes.contains("Out-of-scope"));
    assert_eq!(
        state.stages,
        vec![Stage::Start, Stage::InferConstraints, Stage::Validate, Stage::Finalize]
    );
    assert!(state.plan.is_none());
    assert!(state.retrieval_results.is_none());
    assert!(state.analysis.is_none());
    assert!(client.calls().is_empty());
    assert!(state.synthesis.unwrap().contains("Validation: Out-of-scope"));
}

/// Tenet: an empty query still yields a complete state.
#[tokio::test]
async fn empty_query_completes() {
    let state = pipeline_over(Arc::new(RecordingCatalogClient::new())).run("   ").await;
    assert!(!state.validated);
    assert_eq!(state.validation_notes, "Empty query");
    assert!(state.has_completed(Stage::Finalize));
}

/// Tenet: heuristic decomposition fans out one search per part.
#[tokio::test]
async fn decomposed_query_searches_each_part() {
    let client = Arc::new(
        RecordingCatalogClient::new()
            .with_items_for(
                SearchKind::Collections,
                "find soil moisture",
                vec![collection_with_instruments("C9-NSIDC", "NSIDC_ECS", &["SMAP L-Band Radiometer"])],
            )
            .failing_keyword("snow cover"),
    );
    let state = pipeline_over(client.clone())
        .run("find soil moisture and snow cover")
        .await;

    assert_eq!(state.intent, Some(Intent::Specific));
    assert_eq!(state.subqueries, vec!["find soil moisture", "snow cover"]);

    let retrieval = state.retrieval_results.as_ref().unwrap();
    assert_eq!(retrieval.searches.len(), 2);
    assert!(retrieval.searches[1].collections.is_failed());

    let graph = &state.analysis.as_ref().unwrap().knowledge_graph;
    assert!(graph.nodes.instruments.contains("SMAP L-Band Radiometer"));
}

/// Tenet: oracle answers drive decomposition, expansion and synthesis.
#[tokio::test]
async fn oracle_backed_run() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .answer_when("classify", r#"{"intent": "analytical", "subqueries": ["sea surface temperature", "chlorophyll"]}"#)
            .answer_when("expand", r#"["sst", "ocean color"]"#)
            .fail_when("Earth science data expert"),
    );
    let client = Arc::new(RecordingCatalogClient::new());
    let pipeline = Pipeline::builder()
        .with_config(AgentConfig::default().without_cache())
        .with_catalog(client.clone())
        .with_oracle(oracle.clone())
        .build()
        .unwrap();

    let state = pipeline.run("how does ocean warming relate to blooms").await;

    assert_eq!(state.intent, Some(Intent::Analytical));
    assert_eq!(state.subqueries, vec!["sea surface temperature", "chlorophyll"]);
    let plan = state.plan.as_ref().unwrap();
    assert!(plan.expanded_terms.contains(&"sst".to_string()));
    assert!(plan.expanded_terms.contains(&"ocean color".to_string()));
    assert_eq!(client.calls_of(SearchKind::Collections).len(), 2);

    // Synthesis oracle failed, so the template stands in
    assert!(state.synthesis.unwrap().starts_with("Query: how does ocean warming relate to blooms"));
    assert_eq!(oracle.prompts().len(), 3);
}

/// Tenet: session history accumulates across runs and stays per session.
#[tokio::test]
async fn session_history_accumulates() {
    let sessions = Arc::new(InMemorySessionStore::new());
    let pipeline = Pipeline::builder()
        .with_config(AgentConfig::default().without_cache())
        .with_catalog(Arc::new(RecordingCatalogClient::new()))
        .with_session_store(sessions.clone())
        .build()
        .unwrap();

    pipeline.run_in_session("s1", "global sea level 1993 2020").await;
    let second = pipeline.run_in_session("s1", "arctic sea ice extent").await;
    let other = pipeline.run_in_session("s2", "aerosol optical depth").await;

    assert_eq!(second.history, vec!["global sea level 1993 2020", "arctic sea ice extent"]);
    assert_eq!(other.history, vec!["aerosol optical depth"]);
    assert_eq!(sessions.load("s1").await.len(), 2);
}

/// Tenet: a caller-seeded state keeps its sub-queries and history.
#[tokio::test]
async fn seeded_state_is_respected() {
    let client = Arc::new(RecordingCatalogClient::new());
    let seeded = QueryState::new("land surface temperature trends")
        .with_history(vec!["earlier question".to_string()])
        .with_subqueries(vec!["MODIS LST".to_string()])
        .with_constraints(None, Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));

    let state = pipeline_over(client.clone()).run_with(seeded).await;

    assert_eq!(state.history, vec!["earlier question", "land surface temperature trends"]);
    assert_eq!(state.subqueries, vec!["MODIS LST"]);
    let call = client.call_for(SearchKind::Collections, "MODIS LST").unwrap();
    assert_eq!(call.bounding_box.as_deref(), Some("0.0,0.0,10.0,10.0"));
    assert_eq!(call.temporal, None);
}
