//! OpenSearch implementation of the index destination.
//!
//! This module provides a concrete implementation of `IndexDestination`
//! using OpenSearch as the backend. Each destination owns one physical index;
//! a shared read alias points at whichever one is primary.

mod destination;
mod index_config;

pub use ::opensearch::OpenSearch;
pub use destination::{connect, OpenSearchDestination};
pub use index_config::{get_index_settings, physical_index_names, IndexConfig};
