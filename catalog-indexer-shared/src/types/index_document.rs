//! Index document types.
//!
//! This module defines the document structure that is submitted to an index
//! destination.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::catalog_entity::EntityKind;

/// Document representation for the search index.
///
/// One document per catalog entity. Locale and price list variants are
/// flattened into suffixed field keys rather than separate documents.
///
/// # Fields
///
/// - `entity_id`: Identifier of the source entity
/// - `kind`: Whether the source is a product or a SKU
/// - `parent_id`: For SKUs, the owning product
/// - `fields`: Field key to value; multi-valued fields hold a JSON array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexDocument {
    pub entity_id: String,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl IndexDocument {
    /// Keys used by the document itself, unavailable to field definitions.
    pub const RESERVED_KEYS: [&'static str; 4] = ["id", "entity_id", "kind", "parent_id"];

    /// Create an empty document for an entity.
    pub fn new(entity_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind,
            parent_id: None,
            fields: BTreeMap::new(),
        }
    }

    /// Generate the document ID used in the search index.
    ///
    /// Products and SKUs share an index, so the kind is part of the id.
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.kind, self.entity_id)
    }

    /// Whether `key` can be used for a field.
    pub fn is_reserved_key(key: &str) -> bool {
        Self::RESERVED_KEYS.contains(&key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Insert a field value, returning the previous value under that key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Number of field keys, excluding the identifying keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the document as the JSON source stored by the search engine.
    pub fn to_source(&self) -> Value {
        let mut source = Map::new();
        source.insert("id".to_string(), Value::String(self.document_id()));
        source.insert("entity_id".to_string(), Value::String(self.entity_id.clone()));
        source.insert("kind".to_string(), Value::String(self.kind.to_string()));
        if let Some(ref parent_id) = self.parent_id {
            source.insert("parent_id".to_string(), Value::String(parent_id.clone()));
        }
        for (key, value) in &self.fields {
            source.insert(key.clone(), value.clone());
        }
        Value::Object(source)
    }
}
