//! Knowledge graph accumulation
//!
//! Collections link to the instruments on their platforms; variables link to
//! the collections they are associated with. One builder spans all
//! sub-queries of a retrieval.

use crate::item::{non_empty_str, Item};
use crate::types::{EdgeKind, GraphEdge, KnowledgeGraph};
use serde_json::Value;

/// Incremental knowledge graph builder
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: KnowledgeGraph,
}

impl GraphBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection and its instruments
    pub fn add_collection(&mut self, item: &Item) {
        let Some(collection_id) = item.concept_id() else {
            return;
        };
        for instrument in instrument_names(item) {
            self.graph.nodes.collections.insert(collection_id.to_string());
            self.graph.nodes.instruments.insert(instrument.to_string());
            self.graph.edges.insert(GraphEdge {
                source: collection_id.to_string(),
                target: instrument.to_string(),
                kind: EdgeKind::CollectionInstrument,
            });
        }
    }

    /// Register a variable and its collection associations
    pub fn add_variable(&mut self, item: &Item) {
        let Some(name) = item.variable_name() else {
            return;
        };
        self.graph.nodes.variables.insert(name.to_string());
        for collection_id in item.associated_collections() {
            self.graph.edges.insert(GraphEdge {
                source: name.to_string(),
                target: collection_id.to_string(),
                kind: EdgeKind::VariableCollection,
            });
        }
    }

    /// Finish building
    #[inline]
    #[must_use]
    pub fn build(self) -> KnowledgeGraph {
        self.graph
    }
}

/// Instrument names across `umm.Platforms[].Instruments[]`
fn instrument_names(item: &Item) -> Vec<&str> {
    item.array_at(&["umm", "Platforms"])
        .iter()
        .filter_map(|platform| platform.get("Instruments").and_then(Value::as_array))
        .flatten()
        .filter_map(|instrument| {
            instrument
                .get("ShortName")
                .and_then(non_empty_str)
                .or_else(|| instrument.get("LongName").and_then(non_empty_str))
        })
        .collect()
}
