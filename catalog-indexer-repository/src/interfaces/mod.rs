//! Interface definitions for the engine's collaborators.
//!
//! This module defines the abstract traits that allow for dependency
//! injection and swappable backends: where documents go, and where entities,
//! locales and field definitions come from.

mod catalog_provider;
mod index_destination;

pub use catalog_provider::{CatalogProvider, FieldDefinitionSource, LocaleProvider};
pub use index_destination::IndexDestination;
