//! # Catalog Indexer Shared
//!
//! This crate defines shared data structures and types used across the catalog
//! indexer ecosystem: the catalog entities that get indexed, the field and
//! locale definitions that shape documents, the documents themselves and the
//! ambient operation context that indexing temporarily overrides.

pub mod types;

pub use types::catalog_entity::{CatalogEntity, EntityKind};
pub use types::field_definition::{FieldDefinition, FieldType};
pub use types::index_document::IndexDocument;
pub use types::locale::Locale;
pub use types::operation_context::{EntityFilter, OperationContext};
