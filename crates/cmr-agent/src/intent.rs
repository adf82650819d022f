//! Intent classification and query decomposition
//!
//! Two variants, picked once at construction:
//! - `Heuristic`: keyword rules and a split on `,` `;` and the word "and"
//! - `Oracle`: asks the language oracle for `{intent, subqueries}` JSON and
//!   falls back to `(exploratory, [query])` on any failure

use crate::oracle::{parse_json_answer, LanguageOracle};
use cmr_core::Intent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

const ANALYTICAL_KEYWORDS: &[&str] = &["compare", "relationship", "impact", "effect"];
const SPECIFIC_KEYWORDS: &[&str] = &["find", "search", "datasets", "granules", "variables"];

const INTENT_PROMPT: &str = "You classify NASA CMR user queries into intents: exploratory, \
    specific, or analytical. Return a JSON object with intent and decomposed subqueries.";

static SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;]|\band\b").expect("split pattern compiles"));

#[derive(Debug, Deserialize)]
struct OracleIntent {
    #[serde(default)]
    intent: Option<Intent>,
    #[serde(default)]
    subqueries: Option<Vec<String>>,
}

/// Query intent classifier
#[derive(Clone, Default)]
pub enum IntentClassifier {
    /// Deterministic keyword rules
    #[default]
    Heuristic,
    /// Oracle-backed classification
    Oracle(Arc<dyn LanguageOracle>),
}

impl IntentClassifier {
    /// Pick the variant for an optional oracle
    #[inline]
    #[must_use]
    pub fn from_oracle(oracle: Option<Arc<dyn LanguageOracle>>) -> Self {
        oracle.map_or(Self::Heuristic, Self::Oracle)
    }

    /// Classify a query and decompose it into sub-queries
    pub async fn classify(&self, query: &str) -> (Intent, Vec<String>) {
        match self {
            Self::Heuristic => heuristic(query),
            Self::Oracle(oracle) => {
                let prompt = format!(
                    "{INTENT_PROMPT}\nQuery: {query}\nRespond as JSON with keys: intent, subqueries."
                );
                let answer = match oracle.complete(&prompt).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        tracing::warn!(oracle = oracle.name(), "intent oracle failed: {}", e);
                        return (Intent::Exploratory, vec![query.to_string()]);
                    }
                };
                match parse_json_answer::<OracleIntent>(&answer) {
                    Ok(parsed) => {
                        let subqueries = parsed
                            .subqueries
                            .map(clean)
                            .filter(|parts| !parts.is_empty())
                            .unwrap_or_else(|| vec![query.to_string()]);
                        (parsed.intent.unwrap_or_default(), subqueries)
                    }
                    Err(e) => {
                        tracing::warn!(oracle = oracle.name(), "intent answer ignored: {}", e);
                        (Intent::Exploratory, vec![query.to_string()])
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for IntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Heuristic => f.write_str("Heuristic"),
            Self::Oracle(oracle) => f.debug_tuple("Oracle").field(&oracle.name()).finish(),
        }
    }
}

/// Keyword classification plus conjunction split
#[must_use]
pub fn heuristic(query: &str) -> (Intent, Vec<String>) {
    let lowered = query.to_lowercase();
    let intent = if ANALYTICAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Intent::Analytical
    } else if SPECIFIC_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Intent::Specific
    } else {
        Intent::Exploratory
    };

    let parts = clean(SPLIT.split(query).map(str::to_string).collect());
    let subqueries = if parts.is_empty() {
        vec![query.to_string()]
    } else {
        parts
    };
    (intent, subqueries)
}

fn clean(parts: Vec<String>) -> Vec<String> {
    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use async_trait::async_trait;

    struct Answer(Result<&'static str, ()>);

    #[async_trait]
    impl LanguageOracle for Answer {
        async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
            assert!(prompt.contains("Query: "));
            self.0
                .map(str::to_string)
                .map_err(|()| OracleError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn heuristic_intents() {
        assert_eq!(heuristic("compare rainfall and drought").0, Intent::Analytical);
        assert_eq!(heuristic("Find MODIS datasets").0, Intent::Specific);
        assert_eq!(heuristic("ocean color").0, Intent::Exploratory);
    }

    #[test]
    fn heuristic_split() {
        let (_, parts) = heuristic("rainfall over Kenya and soil moisture; NDVI, land cover");
        assert_eq!(parts, vec!["rainfall over Kenya", "soil moisture", "NDVI", "land cover"]);

        // "and" inside a word is not a separator
        let (_, parts) = heuristic("sandy coastlines");
        assert_eq!(parts, vec!["sandy coastlines"]);
    }

    #[test]
    fn heuristic_keeps_query_when_nothing_remains() {
        let (_, parts) = heuristic(" , ; and ");
        assert_eq!(parts, vec![" , ; and "]);
    }

    #[tokio::test]
    async fn oracle_answer_used() {
        let classifier = IntentClassifier::from_oracle(Some(Arc::new(Answer(Ok(
            r#"{"intent": "analytical", "subqueries": ["rainfall", " drought "]}"#,
        )))));
        let (intent, parts) = classifier.classify("rainfall vs drought").await;
        assert_eq!(intent, Intent::Analytical);
        assert_eq!(parts, vec!["rainfall", "drought"]);
    }

    #[tokio::test]
    async fn oracle_failures_degrade() {
        let offline = IntentClassifier::Oracle(Arc::new(Answer(Err(()))));
        assert_eq!(
            offline.classify("ocean heat").await,
            (Intent::Exploratory, vec!["ocean heat".to_string()])
        );

        let garbled = IntentClassifier::Oracle(Arc::new(Answer(Ok("analytical, probably"))));
        assert_eq!(
            garbled.classify("ocean heat").await,
            (Intent::Exploratory, vec!["ocean heat".to_string()])
        );

        let partial = IntentClassifier::Oracle(Arc::new(Answer(Ok(r#"{"intent": "specific"}"#))));
        assert_eq!(
            partial.classify("ocean heat").await,
            (Intent::Specific, vec!["ocean heat".to_string()])
        );
    }
}
