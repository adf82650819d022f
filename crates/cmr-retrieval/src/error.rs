//! Error types for catalog access
//!
//! Catalog errors never cross the retrieval coordinator: it captures them as
//! `ResultSet::Failed` descriptions. They matter to clients and decorators,
//! which decide whether a failure is worth retrying or caching.

use std::time::Duration;

/// Catalog access error
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// Transport-level failure (connect, reset, TLS)
    #[error("request failed: {0}")]
    Transport(String),

    /// Request exceeded its deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status
    #[error("catalog returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Response body was not a search document
    #[error("invalid response: {0}")]
    Decode(String),

    /// Client could not be constructed
    #[error("client configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Check if error is worth retrying
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_display() {
        let err = CatalogError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn catalog_error_is_retryable() {
        assert!(CatalogError::Transport("reset".to_string()).is_retryable());
        assert!(CatalogError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(CatalogError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(CatalogError::Status { status: 502, body: String::new() }.is_retryable());
        assert!(!CatalogError::Status { status: 400, body: String::new() }.is_retryable());
        assert!(!CatalogError::Decode("eof".to_string()).is_retryable());
    }
}
