//! Session history storage
//!
//! A session is an opaque id mapped to the ordered list of queries asked in
//! it. The pipeline loads the list before a run and appends the new query
//! after `finalize`.

use async_trait::async_trait;
use dashmap::DashMap;

/// Conversation history store
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// History of a session (empty when unknown)
    async fn load(&self, session_id: &str) -> Vec<String>;

    /// Append one query to a session
    async fn append(&self, session_id: &str, query: String);
}

/// In-process store backed by a concurrent map
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Vec<String>>,
}

impl InMemorySessionStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known sessions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if no session is stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Forget a session
    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id)
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    async fn append(&self, session_id: &str, query: String) {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .push(query);
    }
}
