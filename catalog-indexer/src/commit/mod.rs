//! Commit controller.
//!
//! Decides when submitted documents become visible (and durable) in a
//! destination, and runs the occasional full compaction.

use catalog_indexer_repository::{CommitOptions, IndexDestination};
use tracing::{debug, info, instrument};

use crate::config::IndexerConfig;
use crate::errors::IndexerError;

/// Applies commit policy to destinations.
#[derive(Debug, Clone)]
pub struct CommitController {
    enabled: bool,
    defaults: CommitOptions,
}

impl CommitController {
    /// Create a controller from the engine configuration.
    pub fn new(config: &IndexerConfig) -> Self {
        Self {
            enabled: config.commit_enabled,
            defaults: config.commit_options(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Commit with the configured defaults.
    ///
    /// Does nothing when commits are disabled in configuration.
    pub async fn commit(&self, destination: &dyn IndexDestination) -> Result<(), IndexerError> {
        if !self.enabled {
            debug!(destination = %destination.name(), "Commit disabled, skipping");
            return Ok(());
        }
        self.commit_with(destination, self.defaults).await
    }

    /// Commit with explicit options.
    ///
    /// Always runs, even when commits are disabled in configuration. A soft
    /// commit makes documents visible without making them durable; a later
    /// hard commit is the caller's responsibility.
    #[instrument(skip(self, destination), fields(destination = %destination.name()))]
    pub async fn commit_with(
        &self,
        destination: &dyn IndexDestination,
        options: CommitOptions,
    ) -> Result<(), IndexerError> {
        destination
            .commit(options)
            .await
            .map_err(|e| IndexerError::index_build(destination.name(), e))?;

        info!(
            soft = options.soft,
            wait_searcher = options.wait_searcher,
            wait_flush = options.wait_flush,
            "Committed"
        );
        Ok(())
    }

    /// Force merge the destination.
    ///
    /// Expensive and rarely needed. Runs once at the end of a full rebuild,
    /// never per page.
    #[instrument(skip(self, destination), fields(destination = %destination.name()))]
    pub async fn optimize_index(&self, destination: &dyn IndexDestination) -> Result<(), IndexerError> {
        destination
            .optimize()
            .await
            .map_err(|e| IndexerError::index_build(destination.name(), e))?;

        info!("Optimized index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockDestination;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_commit_uses_defaults() {
        let config = IndexerConfig {
            soft_commit: true,
            ..Default::default()
        };
        let controller = CommitController::new(&config);
        let destination = MockDestination::new("catalog_a");

        controller.commit(destination.as_ref()).await.unwrap();
        assert_eq!(*destination.commits.lock().unwrap(), vec![config.commit_options()]);
    }

    #[tokio::test]
    async fn test_disabled_commit_is_noop_but_forced_commit_runs() {
        let config = IndexerConfig {
            commit_enabled: false,
            ..Default::default()
        };
        let controller = CommitController::new(&config);
        let destination = MockDestination::new("catalog_a");

        controller.commit(destination.as_ref()).await.unwrap();
        assert_eq!(destination.commit_count(), 0);

        controller
            .commit_with(destination.as_ref(), CommitOptions::soft())
            .await
            .unwrap();
        assert_eq!(*destination.commits.lock().unwrap(), vec![CommitOptions::soft()]);
    }

    #[tokio::test]
    async fn test_commit_failure_names_destination() {
        let controller = CommitController::new(&IndexerConfig::default());
        let destination = MockDestination::new("catalog_b");
        destination.fail_commit.store(true, Ordering::SeqCst);

        let err = controller.commit(destination.as_ref()).await.unwrap_err();
        match err {
            IndexerError::IndexBuild { destination, .. } => assert_eq!(destination, "catalog_b"),
            other => panic!("expected an index build error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optimize() {
        let controller = CommitController::new(&IndexerConfig::default());
        let destination = MockDestination::new("catalog_a");

        controller.optimize_index(destination.as_ref()).await.unwrap();
        assert_eq!(destination.optimize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(destination.commit_count(), 0);
    }
}
