//! # Catalog Indexer
//!
//! Catalog reindexing engine - rebuilds the product search index into a
//! shadow index and swaps it live, and keeps it current with incremental
//! updates in between.
//!
//! ## Architecture
//!
//! 1. **Builder**: Turns a catalog entity into one flattened index document
//! 2. **Indexer**: Pages through the catalog and submits documents
//! 3. **Commit**: Controls when submitted documents become visible
//! 4. **Orchestrator**: Runs the full shadow rebuild and the role swap
//!
//! The context manager and cache scope bracket every operation: the ambient
//! context is snapshotted and restored around a rebuild, and shared lookups
//! are memoised for exactly one operation.
//!
//! ## Modules
//!
//! - [`builder`]: Document building and value coercion
//! - [`cache`]: Operation-scoped cache
//! - [`commit`]: Commit and optimize policy
//! - [`config`]: Configuration and dependency initialization
//! - [`context`]: Ambient context snapshot and restore
//! - [`indexer`]: Incremental indexing
//! - [`orchestrator`]: Full rebuild
//! - [`errors`]: Error types for the engine

pub mod builder;
pub mod cache;
pub mod commit;
pub mod config;
pub mod context;
pub mod errors;
pub mod indexer;
pub mod orchestrator;

#[cfg(test)]
mod test_support;

pub use builder::DocumentBuilder;
pub use cache::{with_cache_scope, CacheScope};
pub use commit::CommitController;
pub use config::{Dependencies, IndexerConfig};
pub use context::{ContextManager, ContextToken};
pub use errors::{DocumentBuildError, IndexerError};
pub use indexer::{IncrementalIndexer, IncrementalSummary};
pub use orchestrator::{RebuildOrchestrator, RebuildPhase, RebuildSummary};
