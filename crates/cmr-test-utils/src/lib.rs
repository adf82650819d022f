//! Testing utilities for the CMR Agent workspace
//!
//! Shared fakes and fixtures:
//! - `RecordingCatalogClient`: scripted catalog that records every search
//! - `ScriptedOracle`: language oracle answering by prompt substring
//! - `fixtures`: catalog-shaped collection, granule and variable records

#![allow(missing_docs)]

use async_trait::async_trait;
use cmr_agent::{LanguageOracle, OracleError};
use cmr_core::Item;
use cmr_retrieval::{CatalogClient, CatalogError, SearchKind, SearchParams};
use std::collections::HashMap;
use std::sync::Mutex;

pub mod fixtures;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: SearchKind,
    pub params: SearchParams,
}

/// Catalog fake with per-kind and per-keyword scripting
#[derive(Debug, Default)]
pub struct RecordingCatalogClient {
    items: HashMap<SearchKind, Vec<Item>>,
    keyword_items: HashMap<(SearchKind, String), Vec<Item>>,
    failing_kinds: Vec<SearchKind>,
    failing_keywords: Vec<(Option<SearchKind>, String)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items returned for every search of a kind
    pub fn with_items(mut self, kind: SearchKind, items: Vec<Item>) -> Self {
        self.items.insert(kind, items);
        self
    }

    /// Items returned for a kind when the keyword matches exactly
    pub fn with_items_for(mut self, kind: SearchKind, keyword: &str, items: Vec<Item>) -> Self {
        self.keyword_items.insert((kind, keyword.to_string()), items);
        self
    }

    /// Fail every search of a kind
    pub fn failing(mut self, kind: SearchKind) -> Self {
        self.failing_kinds.push(kind);
        self
    }

    /// Fail searches of a kind for one keyword
    pub fn failing_for(mut self, kind: SearchKind, keyword: &str) -> Self {
        self.failing_keywords.push((Some(kind), keyword.to_string()));
        self
    }

    /// Fail every search for one keyword
    pub fn failing_keyword(mut self, keyword: &str) -> Self {
        self.failing_keywords.push((None, keyword.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: SearchKind) -> Vec<SearchParams> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind == kind)
            .map(|call| call.params)
            .collect()
    }

    pub fn call_for(&self, kind: SearchKind, keyword: &str) -> Option<SearchParams> {
        self.calls_of(kind)
            .into_iter()
            .find(|params| params.keyword == keyword)
    }

    fn fails(&self, kind: SearchKind, keyword: &str) -> bool {
        self.failing_kinds.contains(&kind)
            || self
                .failing_keywords
                .iter()
                .any(|(k, word)| word == keyword && k.map_or(true, |k| k == kind))
    }
}

#[async_trait]
impl CatalogClient for RecordingCatalogClient {
    async fn search(
        &self,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Result<Vec<Item>, CatalogError> {
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            params: params.clone(),
        });

        if self.fails(kind, &params.keyword) {
            return Err(CatalogError::Status {
                status: 503,
                body: format!("{kind} search unavailable"),
            });
        }
        Ok(self
            .keyword_items
            .get(&(kind, params.keyword.clone()))
            .or_else(|| self.items.get(&kind))
            .cloned()
            .unwrap_or_default())
    }
}

/// Oracle fake answering the first rule whose needle the prompt contains
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    rules: Vec<(String, Result<String, OracleError>)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer_when(mut self, needle: &str, answer: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(answer.to_string())));
        self
    }

    pub fn fail_when(mut self, needle: &str) -> Self {
        self.rules.push((
            needle.to_string(),
            Err(OracleError::Invocation(format!("scripted failure for {needle:?}"))),
        ));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageOracle for ScriptedOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, answer)| answer.clone())
            .unwrap_or_else(|| Err(OracleError::Unavailable("no scripted answer".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
