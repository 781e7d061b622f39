//! Engine configuration.

use std::env;
use std::str::FromStr;

use catalog_indexer_repository::CommitOptions;
use catalog_indexer_shared::EntityKind;
use tracing::warn;

use crate::errors::IndexerError;

/// Default number of entities fetched per rebuild page.
const DEFAULT_PAGE_SIZE: usize = 100;

/// Configuration for the reindexing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// When false, `commit(destination)` is a no-op. Forced commits still run.
    pub commit_enabled: bool,
    /// Default commit is a soft commit.
    pub soft_commit: bool,
    /// Default commit waits for a new searcher.
    pub wait_searcher: bool,
    /// Default commit waits for the flush to storage.
    pub wait_flush: bool,
    /// Entities per page during a full rebuild.
    pub page_size: usize,
    /// Which entity kind page-based indexing sweeps.
    pub entity_kind: EntityKind,
    /// Log and skip entities whose document fails to build, instead of
    /// failing the batch.
    pub skip_failed_documents: bool,
    /// Force merge the shadow at the end of a full rebuild.
    pub optimize_after_rebuild: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            commit_enabled: true,
            soft_commit: false,
            wait_searcher: true,
            wait_flush: true,
            page_size: DEFAULT_PAGE_SIZE,
            entity_kind: EntityKind::Product,
            skip_failed_documents: true,
            optimize_after_rebuild: true,
        }
    }
}

impl IndexerConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `INDEX_COMMIT`: Whether default commits run (default: true)
    /// - `INDEX_SOFT_COMMIT`: Default commit is soft (default: false)
    /// - `INDEX_WAIT_SEARCHER`: Default commit waits for a searcher (default: true)
    /// - `INDEX_WAIT_FLUSH`: Default commit waits for the flush (default: true)
    /// - `INDEX_PAGE_SIZE`: Rebuild page size (default: 100)
    /// - `INDEX_ENTITY_KIND`: "product" or "sku" (default: product)
    /// - `INDEX_SKIP_FAILED_DOCUMENTS`: Skip unbuildable entities (default: true)
    /// - `INDEX_OPTIMIZE_AFTER_REBUILD`: Force merge after rebuild (default: true)
    ///
    /// Unparsable values fall back to the default with a warning.
    ///
    /// # Returns
    ///
    /// * `Ok(IndexerConfig)` - The loaded configuration
    /// * `Err(IndexerError)` - If the page size is zero
    pub fn from_env() -> Result<Self, IndexerError> {
        let defaults = Self::default();
        let config = Self {
            commit_enabled: env_or("INDEX_COMMIT", defaults.commit_enabled),
            soft_commit: env_or("INDEX_SOFT_COMMIT", defaults.soft_commit),
            wait_searcher: env_or("INDEX_WAIT_SEARCHER", defaults.wait_searcher),
            wait_flush: env_or("INDEX_WAIT_FLUSH", defaults.wait_flush),
            page_size: env_or("INDEX_PAGE_SIZE", defaults.page_size),
            entity_kind: env_or("INDEX_ENTITY_KIND", defaults.entity_kind),
            skip_failed_documents: env_or(
                "INDEX_SKIP_FAILED_DOCUMENTS",
                defaults.skip_failed_documents,
            ),
            optimize_after_rebuild: env_or(
                "INDEX_OPTIMIZE_AFTER_REBUILD",
                defaults.optimize_after_rebuild,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.page_size == 0 {
            return Err(IndexerError::config("page size must be greater than zero"));
        }
        Ok(())
    }

    /// The commit options used by `commit(destination)`.
    pub fn commit_options(&self) -> CommitOptions {
        CommitOptions {
            soft: self.soft_commit,
            wait_searcher: self.wait_searcher,
            wait_flush: self.wait_flush,
        }
    }
}

/// Read and parse an environment variable, falling back to `default`.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match raw.trim().to_lowercase().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(variable = name, value = raw, default = ?default, "Invalid value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::default();
        assert!(config.commit_enabled);
        assert!(!config.soft_commit);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.entity_kind, EntityKind::Product);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_commit_options_follow_config() {
        let config = IndexerConfig {
            soft_commit: true,
            wait_searcher: false,
            wait_flush: false,
            ..Default::default()
        };
        assert_eq!(
            config.commit_options(),
            CommitOptions {
                soft: true,
                wait_searcher: false,
                wait_flush: false,
            }
        );
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = IndexerConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(IndexerError::ConfigError(_))));
    }

    #[test]
    fn test_parse_or() {
        assert!(!parse_or("X", "FALSE", true));
        assert_eq!(parse_or("X", " 250 ", 100usize), 250);
        assert_eq!(parse_or("X", "lots", 100usize), 100);
        assert_eq!(parse_or("X", "SKU", EntityKind::Product), EntityKind::Sku);
        assert_eq!(parse_or("X", "category", EntityKind::Product), EntityKind::Product);
    }
}
