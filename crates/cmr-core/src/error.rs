//! Error types for CMR Agent Core
//!
//! The core surfaces few errors; stages degrade instead of failing:
//! - Configuration loading/parsing failures
//! - Unparsable temporal or spatial values handed in by callers
//!
//! Malformed catalog payloads never produce errors; the analysis engine skips
//! them item by item.

use std::path::PathBuf;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Configuration could not be read from disk
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for `AgentConfig`
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value rejected after parsing
    #[error("invalid config value for {key}: {reason}")]
    ConfigValue {
        /// Offending key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Timestamp could not be parsed
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Bounding box could not be parsed
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

impl CoreError {
    /// Create a config value error
    #[inline]
    pub fn config_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if error originates from configuration
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigRead { .. } | Self::ConfigParse(_) | Self::ConfigValue { .. }
        )
    }
}

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
