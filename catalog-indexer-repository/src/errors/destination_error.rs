//! Index destination error types.

use thiserror::Error;

/// Errors from index destination operations.
///
/// Used by the `IndexDestination` trait for every backend. All of these are
/// I/O-level failures from the engine's point of view.
#[derive(Debug, Clone, Error)]
pub enum DestinationError {
    /// Failed to establish connection to the search backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create or inspect the physical index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Submitting documents failed, entirely or for some items.
    #[error("Submit error: {0}")]
    SubmitError(String),

    /// Commit (refresh or flush) failed.
    #[error("Commit error: {0}")]
    CommitError(String),

    /// Optimize (force merge) failed.
    #[error("Optimize error: {0}")]
    OptimizeError(String),

    /// Clearing the index failed.
    #[error("Clear error: {0}")]
    ClearError(String),

    /// Moving the read alias failed.
    #[error("Alias error: {0}")]
    AliasError(String),

    /// Failed to parse a response from the backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl DestinationError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a submit error.
    pub fn submit(msg: impl Into<String>) -> Self {
        Self::SubmitError(msg.into())
    }

    /// Create a commit error.
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::CommitError(msg.into())
    }

    /// Create an optimize error.
    pub fn optimize(msg: impl Into<String>) -> Self {
        Self::OptimizeError(msg.into())
    }

    /// Create a clear error.
    pub fn clear(msg: impl Into<String>) -> Self {
        Self::ClearError(msg.into())
    }

    /// Create an alias error.
    pub fn alias(msg: impl Into<String>) -> Self {
        Self::AliasError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }
}
