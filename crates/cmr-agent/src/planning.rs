//! Term expansion and search planning
//!
//! The planner turns a validated query into a `SearchPlan`: one stage per
//! sub-query, each carrying the shared expanded term list for variable
//! lookups. Expansion starts from seed terms (the sub-queries and the
//! query's own tokens) and optionally asks the oracle for related terms.

use crate::oracle::{parse_json_answer, LanguageOracle};
use cmr_core::{PlanStage, SearchPlan};
use indexmap::IndexSet;
use std::sync::Arc;

const EXPANSION_PROMPT: &str = "You expand scientific terms with related synonyms or \
    abbreviations. Respond as a JSON list of lowercase strings.";

/// Term expansion strategy
#[derive(Clone, Default)]
pub enum TermExpander {
    /// Seeds only, lowercased and deduplicated
    #[default]
    Seeds,
    /// Seeds followed by oracle-suggested terms
    Oracle(Arc<dyn LanguageOracle>),
}

impl TermExpander {
    /// Pick the variant for an optional oracle
    #[inline]
    #[must_use]
    pub fn from_oracle(oracle: Option<Arc<dyn LanguageOracle>>) -> Self {
        oracle.map_or(Self::Seeds, Self::Oracle)
    }

    /// Expand seed terms, preserving first-seen order
    pub async fn expand(&self, seeds: &[String]) -> Vec<String> {
        let mut terms: IndexSet<String> = seeds
            .iter()
            .filter(|seed| !seed.is_empty())
            .map(|seed| seed.to_lowercase())
            .collect();

        let Self::Oracle(oracle) = self else {
            return terms.into_iter().collect();
        };
        if seeds.is_empty() {
            return Vec::new();
        }

        let prompt = format!("{EXPANSION_PROMPT}\nTerms: {}", seeds.join(", "));
        let suggested = match oracle.complete(&prompt).await {
            Ok(answer) => parse_json_answer::<Vec<serde_json::Value>>(&answer),
            Err(e) => Err(e),
        };
        match suggested {
            Ok(values) => {
                let before = terms.len();
                terms.extend(
                    values
                        .iter()
                        .filter_map(serde_json::Value::as_str)
                        .map(|term| term.trim().to_lowercase())
                        .filter(|term| !term.is_empty()),
                );
                tracing::debug!(added = terms.len() - before, "expanded terms");
            }
            Err(e) => tracing::warn!(oracle = oracle.name(), "term expansion skipped: {}", e),
        }
        terms.into_iter().collect()
    }
}

impl std::fmt::Debug for TermExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seeds => f.write_str("Seeds"),
            Self::Oracle(oracle) => f.debug_tuple("Oracle").field(&oracle.name()).finish(),
        }
    }
}

/// Search planner
#[derive(Debug, Clone, Default)]
pub struct Planner {
    expander: TermExpander,
}

impl Planner {
    /// Create planner with an expansion strategy
    #[inline]
    #[must_use]
    pub fn new(expander: TermExpander) -> Self {
        Self { expander }
    }

    /// Build a plan for a query and its sub-queries
    pub async fn plan(&self, query: &str, subqueries: &[String]) -> SearchPlan {
        let expanded_terms = self.expander.expand(&seeds(query, subqueries)).await;

        let stage = |text: &str| PlanStage {
            query: text.to_string(),
            variable_terms: expanded_terms.clone(),
        };
        let stages = if subqueries.is_empty() {
            vec![stage(query)]
        } else {
            subqueries.iter().map(|sq| stage(sq)).collect()
        };

        SearchPlan {
            expanded_terms,
            stages,
        }
    }
}

/// Sub-queries followed by the lowercased query's tokens
#[must_use]
pub fn seeds(query: &str, subqueries: &[String]) -> Vec<String> {
    let lowered = query.to_lowercase();
    subqueries
        .iter()
        .map(|sq| sq.trim())
        .filter(|sq| !sq.is_empty())
        .map(str::to_string)
        .chain(
            lowered
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        )
        .collect()
}
