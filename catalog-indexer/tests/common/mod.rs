//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catalog_indexer::{
    CommitController, ContextManager, IncrementalIndexer, IndexerConfig, RebuildOrchestrator,
};
use catalog_indexer_repository::{
    CatalogError, CatalogProvider, CommitOptions, DestinationError, DestinationRoles,
    FieldDefinitionSource, IndexDestination, JsonCatalogSnapshot, LocaleProvider,
};
use catalog_indexer_shared::{
    CatalogEntity, EntityFilter, EntityKind, FieldDefinition, IndexDocument, Locale,
};
use serde_json::json;
use tokio::sync::{Notify, Semaphore};

/// Destination that keeps submitted documents in memory.
pub struct RecordingDestination {
    name: String,
    pub documents: Mutex<Vec<IndexDocument>>,
    pub batches: Mutex<Vec<usize>>,
    pub commits: Mutex<Vec<CommitOptions>>,
    pub promotions: AtomicUsize,
    /// 1-based submit call that fails; 0 never fails.
    pub fail_on_submit: AtomicUsize,
}

impl RecordingDestination {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            documents: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            promotions: AtomicUsize::new(0),
            fail_on_submit: AtomicUsize::new(0),
        })
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|doc| doc.entity_id.clone())
            .collect()
    }

    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }
}

#[async_trait]
impl IndexDestination for RecordingDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit_documents(&self, documents: &[IndexDocument]) -> Result<(), DestinationError> {
        let call = self.batches.lock().unwrap().len() + 1;
        if call == self.fail_on_submit.load(Ordering::SeqCst) {
            return Err(DestinationError::submit("connection reset"));
        }
        self.batches.lock().unwrap().push(documents.len());
        self.documents.lock().unwrap().extend_from_slice(documents);
        Ok(())
    }

    async fn commit(&self, options: CommitOptions) -> Result<(), DestinationError> {
        self.commits.lock().unwrap().push(options);
        Ok(())
    }

    async fn optimize(&self) -> Result<(), DestinationError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), DestinationError> {
        self.documents.lock().unwrap().clear();
        Ok(())
    }

    async fn promote(&self) -> Result<(), DestinationError> {
        self.promotions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A catalog of `products` products with two locales and three fields.
pub fn snapshot(products: usize) -> JsonCatalogSnapshot {
    let products: Vec<_> = (1..=products)
        .map(|i| {
            json!({
                "id": i.to_string(),
                "attributes": { "name": format!("Product {}", i), "tags": ["new"] },
                "translations": { "fr_FR": { "name": format!("Produit {}", i) } },
                "base_price": i as f64,
                "prices": { "wholesale": i as f64 / 2.0 }
            })
        })
        .collect();

    let document = json!({
        "products": products,
        "locales": [{ "code": "en_US", "default": true }, { "code": "fr_FR" }],
        "fields": {
            "product": [
                { "name": "name", "field_type": "text", "localized": true, "required": true },
                { "name": "price", "field_type": "price" },
                { "name": "tags", "field_type": "string", "multi_valued": true }
            ]
        }
    });
    JsonCatalogSnapshot::from_json_str(&document.to_string()).unwrap()
}

/// Catalog whose fetches block until the test hands out permits.
pub struct GatedCatalog {
    inner: JsonCatalogSnapshot,
    pub entered: Notify,
    pub gate: Semaphore,
}

impl GatedCatalog {
    pub fn new(inner: JsonCatalogSnapshot) -> Arc<Self> {
        Arc::new(Self {
            inner,
            entered: Notify::new(),
            gate: Semaphore::new(0),
        })
    }
}

#[async_trait]
impl CatalogProvider for GatedCatalog {
    async fn fetch_products(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        self.entered.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| CatalogError::fetch(e.to_string()))?;
        permit.forget();
        self.inner.fetch_products(offset, limit, filter).await
    }

    async fn fetch_skus(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        self.inner.fetch_skus(offset, limit, filter).await
    }

    async fn count_all(
        &self,
        kind: EntityKind,
        filter: &EntityFilter,
    ) -> Result<usize, CatalogError> {
        self.inner.count_all(kind, filter).await
    }
}

#[async_trait]
impl LocaleProvider for GatedCatalog {
    async fn all_locales(&self) -> Result<Vec<Locale>, CatalogError> {
        self.inner.all_locales().await
    }
}

#[async_trait]
impl FieldDefinitionSource for GatedCatalog {
    async fn fields_for_entity_type(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<FieldDefinition>, CatalogError> {
        self.inner.fields_for_entity_type(kind).await
    }
}

/// Primary "catalog_a", shadow "catalog_b".
pub fn destinations() -> (
    Arc<RecordingDestination>,
    Arc<RecordingDestination>,
    Arc<DestinationRoles>,
) {
    let primary = RecordingDestination::new("catalog_a");
    let shadow = RecordingDestination::new("catalog_b");
    let roles = Arc::new(DestinationRoles::new(primary.clone(), shadow.clone()));
    (primary, shadow, roles)
}

/// Wire an orchestrator over any catalog implementing all three traits.
pub fn orchestrator<C>(
    catalog: Arc<C>,
    roles: Arc<DestinationRoles>,
    config: IndexerConfig,
) -> RebuildOrchestrator
where
    C: CatalogProvider + LocaleProvider + FieldDefinitionSource + 'static,
{
    let commits = CommitController::new(&config);
    let indexer = IncrementalIndexer::new(
        catalog.clone(),
        catalog.clone(),
        catalog,
        roles,
        ContextManager::default(),
        config,
    );
    RebuildOrchestrator::new(indexer, commits)
}

pub fn page_size(page_size: usize) -> IndexerConfig {
    IndexerConfig {
        page_size,
        ..Default::default()
    }
}
