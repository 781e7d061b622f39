//! # Catalog Indexer Repository
//!
//! This crate provides the traits the reindexing engine talks to and their
//! concrete implementations. It includes definitions for errors, the index
//! destination and catalog interfaces, the swappable primary/shadow
//! destination pair, an OpenSearch-backed destination and a JSON catalog
//! snapshot.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod roles;
pub mod snapshot;
pub mod types;

pub use config::DestinationConfig;
pub use errors::{CatalogError, DestinationError};
pub use interfaces::{CatalogProvider, FieldDefinitionSource, IndexDestination, LocaleProvider};
pub use opensearch::OpenSearchDestination;
pub use roles::DestinationRoles;
pub use snapshot::JsonCatalogSnapshot;
pub use types::{CommitOptions, DestinationRole};
