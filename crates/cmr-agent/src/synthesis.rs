//! Synthesis of the final answer text
//!
//! `Templated` renders a fixed summary from the analysis fields alone.
//! `Oracle` asks the language oracle for a structured recommendation and
//! uses the templated text whenever the oracle cannot answer.

use crate::oracle::LanguageOracle;
use cmr_core::{AnalysisSummary, QueryState};
use std::fmt::Write as _;
use std::sync::Arc;

/// Per-query lines included in the templated summary
const SUMMARY_QUERY_LINES: usize = 3;

const RECOMMENDATION: &str =
    "Recommendations: refine temporal/spatial filters and select collections with consistent coverage.";

const SYNTHESIS_PROMPT: &str = "You are an Earth science data expert. Given a user's query and \
    analysis metadata (counts, examples), write a concise, structured recommendation: \
    1) Summary 2) Datasets to consider 3) Gaps & trade-offs 4) Next steps.";

/// Answer synthesizer
#[derive(Clone, Default)]
pub enum Synthesizer {
    /// Deterministic template
    #[default]
    Templated,
    /// Oracle-written recommendation
    Oracle(Arc<dyn LanguageOracle>),
}

impl Synthesizer {
    /// Pick the variant for an optional oracle
    #[inline]
    #[must_use]
    pub fn from_oracle(oracle: Option<Arc<dyn LanguageOracle>>) -> Self {
        oracle.map_or(Self::Templated, Self::Oracle)
    }

    /// Produce the answer text for a finished state
    pub async fn synthesize(&self, state: &QueryState) -> String {
        let Self::Oracle(oracle) = self else {
            return templated(state);
        };

        let analysis = match &state.analysis {
            Some(analysis) => serde_json::to_string(analysis).unwrap_or_else(|_| "{}".to_string()),
            None => "{}".to_string(),
        };
        let prompt = format!(
            "{SYNTHESIS_PROMPT}\nUser query: {}\nConversation history: {}\nAnalysis JSON: {analysis}",
            state.user_query,
            state.history.join(" | "),
        );

        match oracle.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(oracle = oracle.name(), "empty synthesis, using template");
                templated(state)
            }
            Err(e) => {
                tracing::warn!(oracle = oracle.name(), "synthesis failed, using template: {}", e);
                templated(state)
            }
        }
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Templated => f.write_str("Templated"),
            Self::Oracle(oracle) => f.debug_tuple("Oracle").field(&oracle.name()).finish(),
        }
    }
}

/// Deterministic summary text
///
/// A state that failed validation reports its notes instead of totals.
#[must_use]
pub fn templated(state: &QueryState) -> String {
    let mut text = format!("Query: {}", state.user_query);

    if !state.validated {
        let notes = if state.validation_notes.is_empty() {
            "query was not admitted for retrieval"
        } else {
            state.validation_notes.as_str()
        };
        let _ = write!(text, "\nValidation: {notes}");
        return text;
    }

    let empty = AnalysisSummary::default();
    let analysis = state.analysis.as_ref().unwrap_or(&empty);
    let _ = write!(
        text,
        "\nTotal collections: {}\nTotal granules: {}",
        analysis.total_collections, analysis.total_granules
    );
    for query in analysis.queries.iter().take(SUMMARY_QUERY_LINES) {
        let providers: Vec<&str> = query.providers.iter().map(String::as_str).collect();
        let _ = write!(
            text,
            "\n- '{}' -> collections={}, granules={}, providers={}",
            query.query,
            query.collections_found,
            query.granules_found,
            providers.join(",")
        );
    }
    text.push('\n');
    text.push_str(RECOMMENDATION);
    text
}
