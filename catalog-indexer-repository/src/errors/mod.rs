//! Error types for the catalog indexer repository.
//!
//! One error type per collaborator family: index destinations and the
//! catalog-side providers.

mod catalog_error;
mod destination_error;

pub use catalog_error::CatalogError;
pub use destination_error::DestinationError;
