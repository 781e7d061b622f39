//! Error types for the catalog reindexing engine.

use catalog_indexer_repository::{CatalogError, DestinationError};
use catalog_indexer_shared::EntityKind;
use thiserror::Error;

/// Errors building a single entity's document.
///
/// Recoverable: the incremental indexer skips the entity or aborts the batch
/// depending on configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentBuildError {
    /// A required field resolved to no value.
    #[error("{kind} {entity_id}: required field '{field}' has no value")]
    MissingRequiredField {
        kind: EntityKind,
        entity_id: String,
        field: String,
    },

    /// A value does not fit the field's declared type.
    #[error("{kind} {entity_id}: field '{field}' expects {expected}, got {found}")]
    InvalidValue {
        kind: EntityKind,
        entity_id: String,
        field: String,
        expected: &'static str,
        found: String,
    },

    /// Two field definitions produced the same document key.
    #[error("{kind} {entity_id}: document key '{key}' produced more than once")]
    DuplicateKey {
        kind: EntityKind,
        entity_id: String,
        key: String,
    },

    /// The entity was handed to the builder for the other kind.
    #[error("entity {entity_id} is a {found}, expected a {expected}")]
    WrongEntityKind {
        entity_id: String,
        expected: EntityKind,
        found: EntityKind,
    },
}

/// Errors that can occur in the reindexing engine.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Building a document failed and the batch was configured to abort.
    #[error("Document build error: {0}")]
    DocumentBuild(#[from] DocumentBuildError),

    /// Submitting to, committing or optimizing a destination failed.
    #[error("Index build error on '{destination}': {source}")]
    IndexBuild {
        destination: String,
        #[source]
        source: DestinationError,
    },

    /// A full rebuild was requested while one is running in this process.
    #[error("A full rebuild is already in process")]
    ConcurrentRebuild,

    /// Orchestration-level failure wrapping the underlying cause.
    #[error("Service error: {message}")]
    Service {
        message: String,
        #[source]
        source: Option<Box<IndexerError>>,
    },

    /// Restoring the ambient context failed; global state may be corrupt.
    #[error("Context restore error: {0}")]
    ContextRestore(String),

    /// Reading from the catalog, locale or field collaborators failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IndexerError {
    /// Create an index build error for a destination.
    pub fn index_build(destination: impl Into<String>, source: DestinationError) -> Self {
        Self::IndexBuild {
            destination: destination.into(),
            source,
        }
    }

    /// Create a service error wrapping an underlying cause.
    pub fn service(msg: impl Into<String>, source: IndexerError) -> Self {
        Self::Service {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a service error without an underlying cause.
    pub fn service_msg(msg: impl Into<String>) -> Self {
        Self::Service {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a context restore error.
    pub fn context_restore(msg: impl Into<String>) -> Self {
        Self::ContextRestore(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// The innermost error, looking through `Service` wrappers.
    pub fn root_cause(&self) -> &IndexerError {
        match self {
            Self::Service {
                source: Some(source),
                ..
            } => source.root_cause(),
            other => other,
        }
    }
}
