//! Dependency initialization and wiring for the catalog indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::commit::CommitController;
use crate::config::IndexerConfig;
use crate::context::ContextManager;
use crate::errors::IndexerError;
use crate::indexer::IncrementalIndexer;
use crate::orchestrator::RebuildOrchestrator;
use catalog_indexer_repository::opensearch::{connect, IndexConfig, OpenSearch};
use catalog_indexer_repository::{
    DestinationConfig, DestinationRoles, IndexDestination, JsonCatalogSnapshot,
    OpenSearchDestination,
};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default read alias.
const DEFAULT_INDEX_ALIAS: &str = "catalog";

/// Default catalog snapshot location.
const DEFAULT_CATALOG_SNAPSHOT_PATH: &str = "catalog.json";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Bulk request size from `OPENSEARCH_BULK_SIZE`.
///
/// `0` sends each submit as a single request; unset or unparsable values keep
/// the default.
fn bulk_config(raw: Option<&str>) -> DestinationConfig {
    match raw.map(|value| (value, value.trim().parse::<usize>())) {
        None => DestinationConfig::default(),
        Some((_, Ok(0))) => DestinationConfig::unlimited(),
        Some((_, Ok(size))) => DestinationConfig::with_max_batch_size(size),
        Some((value, Err(_))) => {
            warn!(value, "Invalid OPENSEARCH_BULK_SIZE, using the default");
            DestinationConfig::default()
        }
    }
}

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection at a fixed interval until it succeeds.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        Self::parse(&env::var("OPENSEARCH_CONNECTION_MODE").unwrap_or_else(|_| "retry".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = raw, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to rebuild.
    pub orchestrator: RebuildOrchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_ALIAS`: Read alias; backed by `{alias}_a` and `{alias}_b` (default: "catalog")
    /// - `CATALOG_SNAPSHOT_PATH`: JSON catalog snapshot (default: catalog.json)
    /// - `OPENSEARCH_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `OPENSEARCH_BULK_SIZE`: Documents per bulk request, 0 for no limit (default: 500)
    ///
    /// Plus the `INDEX_*` engine settings read by [`IndexerConfig::from_env`].
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexerError)` - If initialization fails (connection errors only in fail-fast mode)
    pub async fn new() -> Result<Self, IndexerError> {
        let config = IndexerConfig::from_env()?;

        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let index_alias =
            env::var("INDEX_ALIAS").unwrap_or_else(|_| DEFAULT_INDEX_ALIAS.to_string());
        let snapshot_path = env::var("CATALOG_SNAPSHOT_PATH")
            .unwrap_or_else(|_| DEFAULT_CATALOG_SNAPSHOT_PATH.to_string());
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let bulk = bulk_config(env::var("OPENSEARCH_BULK_SIZE").ok().as_deref());

        info!(
            opensearch_url = %opensearch_url,
            index_alias = %index_alias,
            snapshot_path = %snapshot_path,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            bulk_size = ?bulk.max_batch_size,
            config = ?config,
            "Initializing dependencies"
        );

        let catalog = Arc::new(JsonCatalogSnapshot::from_path(&snapshot_path).await?);

        let client = Self::connect_to_opensearch(
            &opensearch_url,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        let roles = Self::destination_roles(client, IndexConfig::new(index_alias), bulk).await?;

        let commits = CommitController::new(&config);
        let indexer = IncrementalIndexer::new(
            catalog.clone(),
            catalog.clone(),
            catalog,
            Arc::new(roles),
            ContextManager::default(),
            config,
        );
        let orchestrator = RebuildOrchestrator::new(indexer, commits);

        Ok(Self { orchestrator })
    }

    /// Create both physical indexes and assign roles.
    ///
    /// The index the alias points at is primary. With no alias yet, the first
    /// index becomes primary and the alias is pointed at it.
    async fn destination_roles(
        client: OpenSearch,
        index_config: IndexConfig,
        bulk: DestinationConfig,
    ) -> Result<DestinationRoles, IndexerError> {
        let (first, second) = index_config.index_names();
        let targets = OpenSearchDestination::alias_targets(&client, &index_config.alias)
            .await
            .map_err(|e| IndexerError::config(format!("Failed to read alias: {}", e)))?;

        let (primary_name, shadow_name) = if targets.iter().any(|t| *t == second) {
            (second, first)
        } else {
            (first, second)
        };

        let primary = OpenSearchDestination::with_config(
            client.clone(),
            primary_name,
            index_config.clone(),
            bulk.clone(),
        );
        let shadow = OpenSearchDestination::with_config(client, shadow_name, index_config, bulk);

        for destination in [&primary, &shadow] {
            destination.ensure_exists().await.map_err(|e| {
                IndexerError::config(format!(
                    "Failed to ensure index '{}' exists: {}",
                    destination.name(),
                    e
                ))
            })?;
        }

        if targets.is_empty() {
            primary
                .promote()
                .await
                .map_err(|e| IndexerError::config(format!("Failed to create alias: {}", e)))?;
        }

        info!(
            primary = %primary.name(),
            shadow = %shadow.name(),
            "Destination roles assigned"
        );
        Ok(DestinationRoles::new(Arc::new(primary), Arc::new(shadow)))
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearch, IndexerError> {
        loop {
            match connect(url).await {
                Ok(client) => return Ok(client),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexerError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
