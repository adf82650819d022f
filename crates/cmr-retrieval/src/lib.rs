//! CMR Agent Retrieval
//!
//! Everything that touches the catalog:
//! - `CatalogClient`, the search capability the rest of the agent depends on
//! - `HttpCatalogClient` for the live search API, with retry and backoff
//! - `CachedCatalogClient`, a moka-backed decorator for repeated searches
//! - `RetrievalCoordinator`, which fans sub-queries out concurrently and
//!   isolates their failures
//!
//! # Example
//!
//! ```rust,no_run
//! use cmr_core::AgentConfig;
//! use cmr_retrieval::{HttpCatalogClient, RetrievalCoordinator};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), cmr_retrieval::CatalogError> {
//! let config = AgentConfig::default();
//! let client = Arc::new(HttpCatalogClient::new(&config.catalog)?);
//! let coordinator = RetrievalCoordinator::from_config(client, &config);
//! let output = coordinator.retrieve("sea surface temperature", &[]).await;
//! println!("{} searches", output.searches.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod cache;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod http;

pub use cache::{CacheStats, CachedCatalogClient};
pub use client::{CatalogClient, SearchKind, SearchParams};
pub use coordinator::{RetrievalCoordinator, SearchConstraints, StageRequests};
pub use error::CatalogError;
pub use http::HttpCatalogClient;
