//! OpenSearch destination implementation.
//!
//! This module provides the concrete implementation of `IndexDestination`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use catalog_indexer_shared::IndexDocument;
use opensearch::{
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{
        IndicesCreateParts, IndicesExistsParts, IndicesFlushParts, IndicesForcemergeParts,
        IndicesGetAliasParts, IndicesRefreshParts,
    },
    BulkParts, DeleteByQueryParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::config::DestinationConfig;
use crate::errors::DestinationError;
use crate::interfaces::IndexDestination;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::CommitOptions;

/// Create an OpenSearch client connected to the specified URL.
///
/// # Arguments
///
/// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
///
/// # Returns
///
/// * `Ok(OpenSearch)` - A client, shareable between destinations
/// * `Err(DestinationError)` - If connection setup fails
pub async fn connect(url: &str) -> Result<OpenSearch, DestinationError> {
    let parsed_url = Url::parse(url).map_err(|e| DestinationError::connection(e.to_string()))?;

    let conn_pool = SingleNodeConnectionPool::new(parsed_url);
    let transport = TransportBuilder::new(conn_pool)
        .disable_proxy()
        .build()
        .map_err(|e| DestinationError::connection(e.to_string()))?;

    let client = OpenSearch::new(transport);

    // Fail early on an unreachable cluster instead of on the first page.
    let response = client
        .ping()
        .send()
        .await
        .map_err(|e| DestinationError::connection(e.to_string()))?;
    if !response.status_code().is_success() {
        return Err(DestinationError::connection(format!(
            "Ping failed with status {}",
            response.status_code()
        )));
    }

    info!(url = %url, "Connected to OpenSearch");
    Ok(client)
}

/// One physical OpenSearch index used as an index destination.
///
/// # Example
///
/// ```ignore
/// use catalog_indexer_repository::opensearch::{connect, IndexConfig, OpenSearchDestination};
///
/// let client = connect("http://localhost:9200").await?;
/// let config = IndexConfig::new("catalog");
/// let (a, b) = config.index_names();
/// let shadow = OpenSearchDestination::new(client.clone(), b, config.clone());
///
/// shadow.ensure_exists().await?;
/// shadow.submit_documents(&documents).await?;
/// shadow.commit(CommitOptions::hard()).await?;
/// // Point the "catalog" alias at "catalog_b"
/// shadow.promote().await?;
/// ```
pub struct OpenSearchDestination {
    client: OpenSearch,
    index_name: String,
    index_config: IndexConfig,
    config: DestinationConfig,
}

impl OpenSearchDestination {
    /// Create a destination writing to `index_name`.
    pub fn new(client: OpenSearch, index_name: impl Into<String>, index_config: IndexConfig) -> Self {
        Self::with_config(client, index_name, index_config, DestinationConfig::default())
    }

    /// Create a destination with custom configuration.
    pub fn with_config(
        client: OpenSearch,
        index_name: impl Into<String>,
        index_config: IndexConfig,
        config: DestinationConfig,
    ) -> Self {
        Self {
            client,
            index_name: index_name.into(),
            index_config,
            config,
        }
    }

    /// List the indexes the alias currently points at.
    ///
    /// Returns an empty list when the alias does not exist yet.
    pub async fn alias_targets(
        client: &OpenSearch,
        alias: &str,
    ) -> Result<Vec<String>, DestinationError> {
        let response = client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| DestinationError::alias(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }
        let response = check_status(response, "Get alias", DestinationError::AliasError).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| DestinationError::parse(e.to_string()))?;

        Ok(body
            .as_object()
            .map(|indexes| indexes.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Build the newline-delimited bulk body lines for `documents`.
    ///
    /// Each document becomes an `index` action followed by its source, so
    /// resubmitting a document replaces it.
    fn bulk_lines(documents: &[IndexDocument]) -> Vec<Value> {
        let mut lines = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            lines.push(json!({ "index": { "_id": document.document_id() } }));
            lines.push(document.to_source());
        }
        lines
    }

    /// Collect the item-level failures from a bulk response.
    fn bulk_failures(response: &Value) -> Vec<String> {
        if !response["errors"].as_bool().unwrap_or(false) {
            return Vec::new();
        }
        response["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let action = &item["index"];
                        let error = action.get("error")?;
                        Some(format!(
                            "{}: {}",
                            action["_id"].as_str().unwrap_or("?"),
                            error["reason"].as_str().unwrap_or("unknown reason")
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build the alias actions that move `alias` onto `target` in one request.
    fn alias_actions(alias: &str, current: &[String], target: &str) -> Value {
        let mut actions: Vec<Value> = current
            .iter()
            .filter(|index| index.as_str() != target)
            .map(|index| json!({ "remove": { "index": index, "alias": alias } }))
            .collect();
        actions.push(json!({ "add": { "index": target, "alias": alias } }));
        json!({ "actions": actions })
    }

    async fn submit_chunk(&self, documents: &[IndexDocument]) -> Result<(), DestinationError> {
        let body: Vec<JsonBody<Value>> = Self::bulk_lines(documents)
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_name))
            .body(body)
            .send()
            .await
            .map_err(|e| DestinationError::submit(e.to_string()))?;
        let response = check_status(response, "Bulk submit", DestinationError::SubmitError).await?;

        let summary: Value = response
            .json()
            .await
            .map_err(|e| DestinationError::parse(e.to_string()))?;
        let failures = Self::bulk_failures(&summary);
        if !failures.is_empty() {
            error!(
                index = %self.index_name,
                failed = failures.len(),
                total = documents.len(),
                "Bulk submit rejected documents"
            );
            return Err(DestinationError::submit(format!(
                "{} of {} documents rejected: {}",
                failures.len(),
                documents.len(),
                failures.join("; ")
            )));
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<(), DestinationError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[&self.index_name]))
            .send()
            .await
            .map_err(|e| DestinationError::commit(e.to_string()))?;
        check_status(response, "Refresh", DestinationError::CommitError).await?;
        Ok(())
    }
}

/// Turn a non-success response into an error, logging the body.
async fn check_status(
    response: Response,
    operation: &str,
    to_error: fn(String) -> DestinationError,
) -> Result<Response, DestinationError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let error_body = response.text().await.unwrap_or_default();
    error!(status = %status, body = %error_body, "{} request failed", operation);
    Err(to_error(format!(
        "{} failed with status {}: {}",
        operation, status, error_body
    )))
}

#[async_trait]
impl IndexDestination for OpenSearchDestination {
    fn name(&self) -> &str {
        &self.index_name
    }

    async fn ensure_exists(&self) -> Result<(), DestinationError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&self.index_name]))
            .send()
            .await
            .map_err(|e| DestinationError::index_creation(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(index = %self.index_name, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_name))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| DestinationError::index_creation(e.to_string()))?;
        check_status(response, "Create index", DestinationError::IndexCreationError).await?;

        info!(index = %self.index_name, "Created index");
        Ok(())
    }

    /// Submit documents through the bulk API.
    ///
    /// Slices larger than the configured batch size are split into several
    /// requests. A request that fails, or any rejected document, fails the call.
    async fn submit_documents(&self, documents: &[IndexDocument]) -> Result<(), DestinationError> {
        if documents.is_empty() {
            return Ok(());
        }

        for chunk in documents.chunks(self.config.chunk_size(documents.len())) {
            self.submit_chunk(chunk).await?;
        }

        debug!(index = %self.index_name, count = documents.len(), "Documents submitted");
        Ok(())
    }

    /// A soft commit refreshes. A hard commit flushes, then refreshes when
    /// `wait_searcher` asks for the changes to be searchable on return.
    async fn commit(&self, options: CommitOptions) -> Result<(), DestinationError> {
        if !options.soft {
            let response = self
                .client
                .indices()
                .flush(IndicesFlushParts::Index(&[&self.index_name]))
                .wait_if_ongoing(options.wait_flush)
                .send()
                .await
                .map_err(|e| DestinationError::commit(e.to_string()))?;
            check_status(response, "Flush", DestinationError::CommitError).await?;
        }

        if options.soft || options.wait_searcher {
            self.refresh().await?;
        }

        debug!(index = %self.index_name, ?options, "Index committed");
        Ok(())
    }

    async fn optimize(&self) -> Result<(), DestinationError> {
        let response = self
            .client
            .indices()
            .forcemerge(IndicesForcemergeParts::Index(&[&self.index_name]))
            .max_num_segments(1)
            .send()
            .await
            .map_err(|e| DestinationError::optimize(e.to_string()))?;
        check_status(response, "Force merge", DestinationError::OptimizeError).await?;

        info!(index = %self.index_name, "Index optimized");
        Ok(())
    }

    async fn clear(&self) -> Result<(), DestinationError> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[&self.index_name]))
            .refresh(true)
            .body(json!({ "query": { "match_all": {} } }))
            .send()
            .await
            .map_err(|e| DestinationError::clear(e.to_string()))?;
        check_status(response, "Delete by query", DestinationError::ClearError).await?;

        info!(index = %self.index_name, "Index cleared");
        Ok(())
    }

    /// Move the read alias onto this index in a single atomic alias update.
    async fn promote(&self) -> Result<(), DestinationError> {
        let alias = &self.index_config.alias;
        let current = Self::alias_targets(&self.client, alias).await?;

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(Self::alias_actions(alias, &current, &self.index_name))
            .send()
            .await
            .map_err(|e| DestinationError::alias(e.to_string()))?;
        check_status(response, "Update aliases", DestinationError::AliasError).await?;

        info!(alias = %alias, index = %self.index_name, previous = ?current, "Alias moved");
        Ok(())
    }
}
