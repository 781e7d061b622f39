//! Index destination trait definition.
//!
//! This module defines the abstract interface for a document store the engine
//! writes to, allowing for different backend implementations.

use async_trait::async_trait;
use catalog_indexer_shared::IndexDocument;

use crate::errors::DestinationError;
use crate::types::CommitOptions;

/// Abstracts one physical search index (OpenSearch, Solr, an in-memory store, etc.).
///
/// The engine holds destinations only through this trait and never assumes
/// which physical index a handle refers to: the same destination is the
/// shadow during one rebuild and the primary after it.
///
/// # Visibility
///
/// `submit_documents` only adds documents. Nothing submitted is guaranteed to
/// be visible to queries until `commit` has run.
#[async_trait]
pub trait IndexDestination: Send + Sync {
    /// Name of the physical index, used in logs and errors.
    fn name(&self) -> &str;

    /// Ensure the physical index exists, creating it if necessary.
    ///
    /// The default implementation assumes the index is always present.
    async fn ensure_exists(&self) -> Result<(), DestinationError> {
        Ok(())
    }

    /// Add or replace documents, keyed by `IndexDocument::document_id`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If every document was accepted
    /// * `Err(DestinationError)` - If the request failed or any document was rejected
    async fn submit_documents(&self, documents: &[IndexDocument]) -> Result<(), DestinationError>;

    /// Make submitted documents visible (and, for hard commits, durable).
    async fn commit(&self, options: CommitOptions) -> Result<(), DestinationError>;

    /// Compact the index. Expensive; meant for the end of a full rebuild.
    async fn optimize(&self) -> Result<(), DestinationError>;

    /// Remove every document from the index.
    async fn clear(&self) -> Result<(), DestinationError>;

    /// Make this index the one serving live queries.
    ///
    /// Called when the destination is swapped into the primary role. The
    /// default implementation does nothing, for backends where role is purely
    /// a matter of which handle callers hold.
    async fn promote(&self) -> Result<(), DestinationError> {
        Ok(())
    }
}
