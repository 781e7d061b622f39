//! Catalog-side error types.

use thiserror::Error;

/// Errors from the catalog, locale and field definition providers.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Reading entities from the catalog store failed.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Catalog data could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The backing source does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl CatalogError {
    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::FetchError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
