//! Validation gate
//!
//! A fixed rule table deciding whether a query may proceed to retrieval.
//! Rules run in order; a hard rule that fires stops evaluation:
//! 1. Blank query (hard)
//! 2. Shorter than the minimum length (soft)
//! 3. Contains a denylisted phrase (hard)
//! 4. More sub-queries than the complexity limit (soft)

use crate::config::ValidationConfig;
use serde::{Deserialize, Serialize};

/// Note for a blank query
pub const NOTE_EMPTY: &str = "Empty query";
/// Note for a short query
pub const NOTE_AMBIGUOUS: &str = "Very short query, may be ambiguous";
/// Note for a denylisted topic
pub const NOTE_OUT_OF_SCOPE: &str = "Out-of-scope content detected";
/// Note for too many sub-queries
pub const NOTE_COMPLEX: &str = "High complexity, will decompose into steps";

/// Validation verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether retrieval may proceed
    pub feasible: bool,
    /// Individual notes, in rule order
    pub reasons: Vec<String>,
}

impl ValidationOutcome {
    /// Notes joined with "; "
    #[must_use]
    pub fn notes(&self) -> String {
        self.reasons.join("; ")
    }
}

/// Rule-table validator
#[derive(Debug, Clone, Default)]
pub struct ValidationGate {
    config: ValidationConfig,
    denylist: Vec<String>,
}

impl ValidationGate {
    /// Create gate from config
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        let denylist = config
            .denylist
            .iter()
            .map(|phrase| phrase.to_lowercase())
            .filter(|phrase| !phrase.trim().is_empty())
            .collect();
        Self { config, denylist }
    }

    /// Evaluate the rule table
    #[must_use]
    pub fn validate(&self, query: &str, subqueries: &[String]) -> ValidationOutcome {
        let mut reasons = Vec::new();

        if query.trim().is_empty() {
            reasons.push(NOTE_EMPTY.to_string());
            return ValidationOutcome {
                feasible: false,
                reasons,
            };
        }

        if query.chars().count() < self.config.min_query_len {
            reasons.push(NOTE_AMBIGUOUS.to_string());
        }

        let lowered = query.to_lowercase();
        if self.denylist.iter().any(|phrase| lowered.contains(phrase.as_str())) {
            reasons.push(NOTE_OUT_OF_SCOPE.to_string());
            return ValidationOutcome {
                feasible: false,
                reasons,
            };
        }

        if subqueries.len() > self.config.max_subqueries {
            reasons.push(NOTE_COMPLEX.to_string());
        }

        ValidationOutcome {
            feasible: true,
            reasons,
        }
    }
}

/// Validate with default rules
#[must_use]
pub fn validate(query: &str, subqueries: &[String]) -> ValidationOutcome {
    ValidationGate::new(ValidationConfig::default()).validate(query, subqueries)
}
