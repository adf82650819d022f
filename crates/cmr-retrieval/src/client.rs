//! Catalog client capability
//!
//! The coordinator talks to the catalog only through `CatalogClient`. The
//! trait is object safe and `Send + Sync` so one client can serve every
//! in-flight search of a retrieval.

use crate::error::CatalogError;
use async_trait::async_trait;
use cmr_core::{BoundingBox, Item, TemporalRange};
use serde::{Deserialize, Serialize};

/// Kind of catalog search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// Dataset series
    Collections,
    /// Observation files
    Granules,
    /// Physical quantities
    Variables,
}

impl SearchKind {
    /// Path segment of the search endpoint
    #[inline]
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            SearchKind::Collections => "collections",
            SearchKind::Granules => "granules",
            SearchKind::Variables => "variables",
        }
    }
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Search request parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text keyword
    pub keyword: String,
    /// Maximum records returned
    pub page_size: u32,
    /// Provider filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// `start,end` ISO-8601 range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<String>,
    /// `west,south,east,north`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<String>,
    /// Parent collection filter (granules only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_concept_id: Option<String>,
}

impl SearchParams {
    /// Create params with keyword and page size
    #[inline]
    #[must_use]
    pub fn new(keyword: impl Into<String>, page_size: u32) -> Self {
        Self {
            keyword: keyword.into(),
            page_size,
            ..Self::default()
        }
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// With provider filter
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// With temporal range
    #[inline]
    #[must_use]
    pub fn with_temporal(mut self, range: &TemporalRange) -> Self {
        self.temporal = Some(range.to_param());
        self
    }

    /// With bounding box
    #[inline]
    #[must_use]
    pub fn with_bounding_box(mut self, bbox: &BoundingBox) -> Self {
        self.bounding_box = Some(bbox.to_param());
        self
    }

    /// With parent collection filter
    #[inline]
    #[must_use]
    pub fn with_collection_concept_id(mut self, concept_id: impl Into<String>) -> Self {
        self.collection_concept_id = Some(concept_id.into());
        self
    }

    /// Look up a parameter by its wire key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.to_query_pairs()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Query-string pairs in a stable order
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("keyword", self.keyword.clone()),
            ("page_size", self.page_size.to_string()),
        ];
        let optional = [
            ("provider", &self.provider),
            ("temporal", &self.temporal),
            ("bounding_box", &self.bounding_box),
            ("collection_concept_id", &self.collection_concept_id),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        pairs
    }
}

/// Catalog search capability
///
/// Implementors provide `search`; the per-kind methods delegate to it.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Run one search
    async fn search(&self, kind: SearchKind, params: &SearchParams)
        -> Result<Vec<Item>, CatalogError>;

    /// Search collections
    async fn search_collections(&self, params: &SearchParams) -> Result<Vec<Item>, CatalogError> {
        self.search(SearchKind::Collections, params).await
    }

    /// Search granules
    async fn search_granules(&self, params: &SearchParams) -> Result<Vec<Item>, CatalogError> {
        self.search(SearchKind::Granules, params).await
    }

    /// Search variables
    async fn search_variables(&self, params: &SearchParams) -> Result<Vec<Item>, CatalogError> {
        self.search(SearchKind::Variables, params).await
    }
}
