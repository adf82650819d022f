//! Language oracle capability
//!
//! The agent never talks to a model provider directly. Intent decomposition,
//! term expansion and synthesis each hold an optional `LanguageOracle`
//! chosen at construction time; without one they use deterministic rules.

use crate::error::OracleError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Text-completion capability
#[async_trait]
pub trait LanguageOracle: Send + Sync {
    /// Complete a prompt
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;

    /// Provider name for logs
    fn name(&self) -> &str {
        "oracle"
    }
}

/// Primary provider with a secondary tried on provider failure
///
/// A malformed answer from the primary is returned as-is; only
/// unavailability or invocation failures move on to the secondary.
pub struct FallbackOracle {
    primary: Arc<dyn LanguageOracle>,
    secondary: Arc<dyn LanguageOracle>,
}

impl FallbackOracle {
    /// Create from two providers
    #[inline]
    #[must_use]
    pub fn new(primary: Arc<dyn LanguageOracle>, secondary: Arc<dyn LanguageOracle>) -> Self {
        Self { primary, secondary }
    }

    /// Compose whatever providers are configured
    ///
    /// Returns `None` when neither is present.
    #[must_use]
    pub fn compose(
        primary: Option<Arc<dyn LanguageOracle>>,
        secondary: Option<Arc<dyn LanguageOracle>>,
    ) -> Option<Arc<dyn LanguageOracle>> {
        match (primary, secondary) {
            (Some(primary), Some(secondary)) => Some(Arc::new(Self::new(primary, secondary))),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }
}

impl std::fmt::Debug for FallbackOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOracle")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .finish()
    }
}

#[async_trait]
impl LanguageOracle for FallbackOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        match self.primary.complete(prompt).await {
            Err(err) if err.is_provider_failure() => {
                tracing::warn!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    "primary oracle failed, falling back: {}",
                    err
                );
                self.secondary.complete(prompt).await
            }
            other => other,
        }
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

/// Decode a JSON answer, tolerating a surrounding Markdown code fence
///
/// # Errors
///
/// Returns `OracleError::Malformed` if the answer is not the expected JSON.
pub fn parse_json_answer<T: DeserializeOwned>(answer: &str) -> Result<T, OracleError> {
    serde_json::from_str(strip_code_fence(answer))
        .map_err(|e| OracleError::Malformed(e.to_string()))
}

fn strip_code_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = body.split_once('\n').map_or("", |(_, rest)| rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
