//! Agent configuration
//!
//! Loaded from TOML, then overridden from the environment:
//! - `CMR_BASE_URL` replaces `catalog.base_url`
//! - `CMR_PROVIDER` replaces `catalog.provider`
//!
//! Every section has defaults, so an empty document is a valid config.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Provider values that mean "search every provider"
pub const PROVIDER_WILDCARDS: &[&str] = &["", "ALL", "CMR_ALL"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Catalog connection
    pub catalog: CatalogConfig,
    /// Search request shaping
    pub search: SearchConfig,
    /// Response cache
    pub cache: CacheConfig,
    /// Validation rules
    pub validation: ValidationConfig,
}

impl AgentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `CMR_BASE_URL` / `CMR_PROVIDER` overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("CMR_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.catalog.base_url = url;
        }
        if let Some(provider) = lookup("CMR_PROVIDER") {
            self.catalog.provider = Some(provider);
        }
        self
    }

    /// With catalog base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.catalog.base_url = url.into();
        self
    }

    /// With provider filter
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.catalog.provider = Some(provider.into());
        self
    }

    /// Without the response cache
    #[inline]
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> CoreResult<()> {
        if self.catalog.base_url.trim().is_empty() {
            return Err(CoreError::config_value("catalog.base_url", "must not be empty"));
        }
        for (key, size) in [
            ("search.collection_page_size", self.search.collection_page_size),
            ("search.granule_page_size", self.search.granule_page_size),
            ("search.variable_page_size", self.search.variable_page_size),
        ] {
            if size == 0 {
                return Err(CoreError::config_value(key, "must be positive"));
            }
        }
        if self.catalog.max_backoff_ms < self.catalog.initial_backoff_ms {
            return Err(CoreError::config_value(
                "catalog.max_backoff_ms",
                "must not be below catalog.initial_backoff_ms",
            ));
        }
        Ok(())
    }
}

/// Catalog connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog root URL
    pub base_url: String,
    /// Provider filter; wildcard values disable it
    pub provider: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First retry delay in milliseconds (doubles per retry)
    pub initial_backoff_ms: u64,
    /// Retry delay ceiling in milliseconds
    pub max_backoff_ms: u64,
}

impl CatalogConfig {
    /// Provider filter to send, if any
    #[must_use]
    pub fn provider_filter(&self) -> Option<&str> {
        self.provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !PROVIDER_WILDCARDS.contains(p))
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// First retry delay
    #[inline]
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Retry delay ceiling
    #[inline]
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cmr.earthdata.nasa.gov".to_string(),
            provider: None,
            timeout_secs: 30,
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 4000,
        }
    }
}

/// Page sizes per search kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Collection page size
    pub collection_page_size: u32,
    /// Granule page size
    pub granule_page_size: u32,
    /// Variable page size
    pub variable_page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            collection_page_size: 25,
            granule_page_size: 50,
            variable_page_size: 25,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether catalog responses are cached
    pub enabled: bool,
    /// Maximum cached responses
    pub max_entries: u64,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Entry lifetime
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1024,
            ttl_secs: 300,
        }
    }
}

/// Validation gate settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Queries shorter than this are flagged ambiguous
    pub min_query_len: usize,
    /// More sub-queries than this are flagged complex
    pub max_subqueries: usize,
    /// Out-of-scope phrases (case-insensitive)
    pub denylist: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_query_len: 8,
            max_subqueries: 5,
            denylist: vec![
                "medical records".to_string(),
                "social security".to_string(),
                "bank account".to_string(),
            ],
        }
    }
}
