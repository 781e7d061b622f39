//! Mock collaborators for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catalog_indexer_repository::{
    CatalogError, CatalogProvider, CommitOptions, DestinationError, DestinationRoles,
    FieldDefinitionSource, IndexDestination, LocaleProvider,
};
use catalog_indexer_shared::{
    CatalogEntity, EntityFilter, EntityKind, FieldDefinition, FieldType, IndexDocument, Locale,
};
use serde_json::json;

/// Destination that records every call.
pub(crate) struct MockDestination {
    name: String,
    pub submitted: Mutex<Vec<IndexDocument>>,
    pub commits: Mutex<Vec<CommitOptions>>,
    pub submit_calls: AtomicUsize,
    pub optimize_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
    pub promote_calls: AtomicUsize,
    /// 1-based submit call that fails; 0 never fails.
    pub fail_on_submit: AtomicUsize,
    pub fail_commit: AtomicBool,
}

impl MockDestination {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            submitted: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            optimize_calls: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
            promote_calls: AtomicUsize::new(0),
            fail_on_submit: AtomicUsize::new(0),
            fail_commit: AtomicBool::new(false),
        })
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|doc| doc.entity_id.clone())
            .collect()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }
}

#[async_trait]
impl IndexDestination for MockDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit_documents(&self, documents: &[IndexDocument]) -> Result<(), DestinationError> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_submit.load(Ordering::SeqCst) {
            return Err(DestinationError::submit("Mock failure"));
        }
        self.submitted.lock().unwrap().extend_from_slice(documents);
        Ok(())
    }

    async fn commit(&self, options: CommitOptions) -> Result<(), DestinationError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(DestinationError::commit("Mock failure"));
        }
        self.commits.lock().unwrap().push(options);
        Ok(())
    }

    async fn optimize(&self) -> Result<(), DestinationError> {
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), DestinationError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().clear();
        Ok(())
    }

    async fn promote(&self) -> Result<(), DestinationError> {
        self.promote_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory catalog serving products, locales and field definitions.
pub(crate) struct MockCatalog {
    pub products: Vec<CatalogEntity>,
    pub skus: Vec<CatalogEntity>,
    pub locales: Vec<Locale>,
    pub fetches: Mutex<Vec<(usize, usize)>>,
    pub locale_calls: AtomicUsize,
    pub field_calls: AtomicUsize,
}

impl MockCatalog {
    /// `count` products named "Product {i}", ids "1".."count".
    pub fn with_products(count: usize) -> Arc<Self> {
        Arc::new(Self {
            products: (1..=count).map(product).collect(),
            skus: Vec::new(),
            locales: vec![Locale::default_locale("en_US"), Locale::new("fr_FR")],
            fetches: Mutex::new(Vec::new()),
            locale_calls: AtomicUsize::new(0),
            field_calls: AtomicUsize::new(0),
        })
    }
}

pub(crate) fn product(i: usize) -> CatalogEntity {
    CatalogEntity::product(i.to_string())
        .with_attribute("name", json!(format!("Product {}", i)))
        .with_base_price(i as f64)
}

#[async_trait]
impl CatalogProvider for MockCatalog {
    async fn fetch_products(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        self.fetches.lock().unwrap().push((offset, limit));
        Ok(self
            .products
            .iter()
            .filter(|p| p.matches(filter))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_skus(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        Ok(self
            .skus
            .iter()
            .filter(|s| s.matches(filter))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_all(
        &self,
        kind: EntityKind,
        filter: &EntityFilter,
    ) -> Result<usize, CatalogError> {
        let entities = match kind {
            EntityKind::Product => &self.products,
            EntityKind::Sku => &self.skus,
        };
        Ok(entities.iter().filter(|e| e.matches(filter)).count())
    }
}

#[async_trait]
impl LocaleProvider for MockCatalog {
    async fn all_locales(&self) -> Result<Vec<Locale>, CatalogError> {
        self.locale_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.locales.clone())
    }
}

#[async_trait]
impl FieldDefinitionSource for MockCatalog {
    async fn fields_for_entity_type(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<FieldDefinition>, CatalogError> {
        self.field_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match kind {
            EntityKind::Product => vec![
                FieldDefinition::new("name", FieldType::Text)
                    .localized()
                    .required(),
                FieldDefinition::new("price", FieldType::Price),
            ],
            EntityKind::Sku => vec![FieldDefinition::new("color", FieldType::String)],
        })
    }
}

/// Primary "catalog_a" and shadow "catalog_b".
pub(crate) fn roles() -> (Arc<MockDestination>, Arc<MockDestination>, Arc<DestinationRoles>) {
    let primary = MockDestination::new("catalog_a");
    let shadow = MockDestination::new("catalog_b");
    let roles = Arc::new(DestinationRoles::new(primary.clone(), shadow.clone()));
    (primary, shadow, roles)
}
