//! Catalog item accessors
//!
//! Catalog payloads are loosely structured UMM documents. `Item` wraps the raw
//! JSON value and exposes optional-path accessors; an absent field and a field
//! of the wrong shape both read as `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One catalog record (collection, granule or variable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Value);

impl Item {
    /// Wrap a raw JSON value
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Raw JSON value
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume into the raw JSON value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Get value at a key path
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        value_at(&self.0, path)
    }

    /// Non-empty string at a key path
    #[must_use]
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.get_path(path).and_then(non_empty_str)
    }

    /// `meta.concept-id`
    #[inline]
    #[must_use]
    pub fn concept_id(&self) -> Option<&str> {
        self.str_at(&["meta", "concept-id"])
    }

    /// `meta.provider-id`
    #[inline]
    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.str_at(&["meta", "provider-id"])
    }

    /// Collection title: `umm.ShortName`, falling back to `umm.LongName`
    #[must_use]
    pub fn collection_title(&self) -> Option<&str> {
        self.str_at(&["umm", "ShortName"])
            .or_else(|| self.str_at(&["umm", "LongName"]))
    }

    /// Variable name: `umm.Name`, falling back to `umm.LongName`
    #[must_use]
    pub fn variable_name(&self) -> Option<&str> {
        self.str_at(&["umm", "Name"])
            .or_else(|| self.str_at(&["umm", "LongName"]))
    }

    /// Collection ids declared under `associations.collections`
    ///
    /// Entries may be bare id strings or mappings carrying `concept_id`
    /// (or `concept-id`).
    #[must_use]
    pub fn associated_collections(&self) -> Vec<&str> {
        self.array_at(&["associations", "collections"])
            .iter()
            .filter_map(|entry| match entry {
                Value::String(_) => non_empty_str(entry),
                Value::Object(map) => map
                    .get("concept_id")
                    .or_else(|| map.get("concept-id"))
                    .and_then(non_empty_str),
                _ => None,
            })
            .collect()
    }

    /// Elements of the array at a key path (empty when absent or not an array)
    #[must_use]
    pub fn array_at(&self, path: &[&str]) -> &[Value] {
        self.get_path(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Walk a key path through nested objects
#[must_use]
pub fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        match current {
            Value::Object(map) => current = map.get(*segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// String value that is not blank
#[inline]
#[must_use]
pub fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Numeric value; numeric strings are accepted, non-finite values are not
#[must_use]
pub fn as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A field that may hold either one mapping or a list of them
#[must_use]
pub fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}
