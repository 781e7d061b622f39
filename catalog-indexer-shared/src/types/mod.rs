//! This module defines the core data structures and types used across the catalog indexer.
//! It re-exports the entity, field, locale, document and context types.

pub mod catalog_entity;
pub mod field_definition;
pub mod index_document;
pub mod locale;
pub mod operation_context;

pub use catalog_entity::{CatalogEntity, EntityKind};
pub use field_definition::{FieldDefinition, FieldType};
pub use index_document::IndexDocument;
pub use locale::Locale;
pub use operation_context::{EntityFilter, OperationContext};
