//! Error types for the agent layer
//!
//! Two families:
//! - `OracleError`: a language-oracle call failed or answered nonsense.
//!   Always absorbed by the caller into a deterministic fallback.
//! - `AgentError`: the pipeline could not be assembled. Once built, a
//!   pipeline never fails a run.

use cmr_core::CoreError;
use cmr_retrieval::CatalogError;

/// Language oracle error
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// No provider could answer
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// Provider call failed
    #[error("oracle invocation failed: {0}")]
    Invocation(String),

    /// Answer did not have the expected shape
    #[error("malformed oracle answer: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Check if a secondary provider is worth trying
    #[inline]
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Invocation(_))
    }
}

/// Pipeline construction error
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Configuration invalid
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// Catalog client could not be constructed
    #[error("catalog client error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result type for pipeline construction
pub type AgentResult<T> = Result<T, AgentError>;
