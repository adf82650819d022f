//! HTTP catalog client with retry and exponential backoff.
//!
//! Targets the CMR search API:
//! `GET {base_url}/search/{collections|granules|variables}.umm_json?...`
//! and reads the `items` array of the response document.

use crate::client::{CatalogClient, SearchKind, SearchParams};
use crate::error::CatalogError;
use async_trait::async_trait;
use cmr_core::{CatalogConfig, Item};
use serde::Deserialize;
use std::time::Duration;

/// Longest response body kept in a status error
const MAX_ERROR_BODY: usize = 512;

/// Identifies this agent to the catalog
const CLIENT_ID: &str = "cmr-agent";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

/// Async HTTP client for the catalog search API
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl HttpCatalogClient {
    /// Create client from catalog configuration
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Config` if the base URL is empty or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CatalogError::Config("base URL is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        })
    }

    /// Search endpoint URL for a kind
    #[must_use]
    pub fn endpoint(&self, kind: SearchKind) -> String {
        format!("{}/search/{}.umm_json", self.base_url, kind.path())
    }

    async fn fetch_once(
        &self,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Result<Vec<Item>, CatalogError> {
        let response = self
            .client
            .get(self.endpoint(kind))
            .header("Client-Id", CLIENT_ID)
            .query(&params.to_query_pairs())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(document.items)
    }

    fn classify(&self, error: reqwest::Error) -> CatalogError {
        if error.is_timeout() {
            CatalogError::Timeout(self.timeout)
        } else {
            CatalogError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search(
        &self,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Result<Vec<Item>, CatalogError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            match self.fetch_once(kind, params).await {
                Ok(items) => {
                    tracing::debug!(%kind, keyword = %params.keyword, hits = items.len(), "catalog search");
                    return Ok(items);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "catalog: retry attempt {}/{} for {} after {:?}: {}",
                        attempt,
                        self.max_retries,
                        kind,
                        backoff,
                        err
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.max_backoff);
                }
                Err(err) => {
                    tracing::warn!(%kind, keyword = %params.keyword, error = %err, "catalog search failed");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let config = CatalogConfig {
            base_url: "https://cmr.example.org/".to_string(),
            ..CatalogConfig::default()
        };
        let client = HttpCatalogClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(SearchKind::Granules),
            "https://cmr.example.org/search/granules.umm_json"
        );
    }

    #[test]
    fn empty_base_url_rejected() {
        let config = CatalogConfig {
            base_url: "  ".to_string(),
            ..CatalogConfig::default()
        };
        assert!(matches!(
            HttpCatalogClient::new(&config),
            Err(CatalogError::Config(_))
        ));
    }

    #[test]
    fn response_without_items_is_empty() {
        let doc: SearchResponse = serde_json::from_str(r#"{"hits": 0, "took": 5}"#).unwrap();
        assert!(doc.items.is_empty());
    }

    #[tokio::test]
    async fn unreachable_catalog_is_transport_error() {
        let config = CatalogConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            max_retries: 0,
            ..CatalogConfig::default()
        };
        let client = HttpCatalogClient::new(&config).unwrap();
        let err = client
            .search_collections(&SearchParams::new("rain", 1))
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "{err}");
    }
}
