//! Incremental indexer.
//!
//! Pages through the catalog (or takes an explicit entity list), builds one
//! document per entity and submits the batch to the primary or shadow
//! destination. Submission never commits; visibility is the commit
//! controller's business.

use std::ops::AddAssign;
use std::sync::Arc;

use catalog_indexer_repository::{
    CatalogProvider, DestinationRole, DestinationRoles, FieldDefinitionSource, LocaleProvider,
};
use catalog_indexer_shared::{
    CatalogEntity, EntityKind, FieldDefinition, IndexDocument, Locale, OperationContext,
};
use tracing::{debug, info, instrument, warn};

use crate::builder::DocumentBuilder;
use crate::cache::{with_cache_scope, CacheKey, CacheScope, CachedValue};
use crate::config::IndexerConfig;
use crate::context::ContextManager;
use crate::errors::IndexerError;

/// Outcome of one incremental call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncrementalSummary {
    /// Documents handed to the destination.
    pub submitted: usize,
    /// Entities whose document could not be built and were skipped.
    pub skipped: usize,
}

impl AddAssign for IncrementalSummary {
    fn add_assign(&mut self, other: Self) {
        self.submitted += other.submitted;
        self.skipped += other.skipped;
    }
}

/// Builds and submits documents for pages or lists of catalog entities.
pub struct IncrementalIndexer {
    catalog: Arc<dyn CatalogProvider>,
    locales: Arc<dyn LocaleProvider>,
    fields: Arc<dyn FieldDefinitionSource>,
    roles: Arc<DestinationRoles>,
    context: ContextManager,
    builder: DocumentBuilder,
    config: IndexerConfig,
}

impl IncrementalIndexer {
    /// Create a new incremental indexer.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Source of paged entities
    /// * `locales` - Source of the locale list
    /// * `fields` - Source of field definitions per entity kind
    /// * `roles` - The primary/shadow destination pair
    /// * `context` - The ambient context incremental calls derive from
    /// * `config` - Engine configuration
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        locales: Arc<dyn LocaleProvider>,
        fields: Arc<dyn FieldDefinitionSource>,
        roles: Arc<DestinationRoles>,
        context: ContextManager,
        config: IndexerConfig,
    ) -> Self {
        Self {
            catalog,
            locales,
            fields,
            roles,
            context,
            builder: DocumentBuilder::new(),
            config,
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn roles(&self) -> &Arc<DestinationRoles> {
        &self.roles
    }

    pub fn context_manager(&self) -> &ContextManager {
        &self.context
    }

    pub fn builder(&self) -> &DocumentBuilder {
        &self.builder
    }

    /// Index one page of the configured entity kind in a short-lived scope.
    ///
    /// Fetches up to `page_size` entities starting at `page * page_size`; a
    /// short final page is not an error.
    ///
    /// # Arguments
    ///
    /// * `page` - Zero-based page number
    /// * `page_size` - Entities per page
    /// * `use_shadow` - Submit to the shadow destination instead of the primary
    pub async fn build_incremental_index(
        &self,
        page: usize,
        page_size: usize,
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        with_cache_scope(|scope| async move {
            self.build_incremental_index_in(&scope, page, page_size, use_shadow)
                .await
        })
        .await
    }

    /// Index one page using a caller-held cache scope.
    pub async fn build_incremental_index_in(
        &self,
        scope: &CacheScope,
        page: usize,
        page_size: usize,
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        let context = self.indexing_context()?;
        self.build_page(scope, &context, page, page_size, use_shadow)
            .await
    }

    /// Index the given products, in order, in a short-lived scope.
    pub async fn build_incremental_product_index(
        &self,
        products: &[CatalogEntity],
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        with_cache_scope(|scope| async move {
            self.build_incremental_product_index_in(&scope, products, use_shadow)
                .await
        })
        .await
    }

    /// Index the given products using a caller-held cache scope.
    pub async fn build_incremental_product_index_in(
        &self,
        scope: &CacheScope,
        products: &[CatalogEntity],
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        let context = self.indexing_context()?;
        self.index_entities(scope, &context, EntityKind::Product, products, use_shadow)
            .await
    }

    /// Index the given SKUs, in order, in a short-lived scope.
    pub async fn build_incremental_sku_index(
        &self,
        skus: &[CatalogEntity],
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        with_cache_scope(|scope| async move {
            self.build_incremental_sku_index_in(&scope, skus, use_shadow)
                .await
        })
        .await
    }

    /// Index the given SKUs using a caller-held cache scope.
    pub async fn build_incremental_sku_index_in(
        &self,
        scope: &CacheScope,
        skus: &[CatalogEntity],
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        let context = self.indexing_context()?;
        self.index_entities(scope, &context, EntityKind::Sku, skus, use_shadow)
            .await
    }

    /// Every locale known to the locale collaborator.
    pub async fn all_locales(&self) -> Result<Vec<Locale>, IndexerError> {
        Ok(self.locales.all_locales().await?)
    }

    /// Every locale, memoised in `scope`.
    pub async fn all_locales_in(&self, scope: &CacheScope) -> Result<Arc<Vec<Locale>>, IndexerError> {
        if let Some(CachedValue::Locales(locales)) = scope.get(&CacheKey::Locales) {
            return Ok(locales);
        }
        let locales = Arc::new(self.locales.all_locales().await?);
        scope.insert(CacheKey::Locales, CachedValue::Locales(Arc::clone(&locales)));
        Ok(locales)
    }

    /// Number of entities of the configured kind visible under `context`.
    pub(crate) async fn count_entities(
        &self,
        context: &OperationContext,
    ) -> Result<usize, IndexerError> {
        Ok(self
            .catalog
            .count_all(self.config.entity_kind, &context.filter)
            .await?)
    }

    /// Fetch and index one page under an explicit context.
    #[instrument(skip(self, scope, context))]
    pub(crate) async fn build_page(
        &self,
        scope: &CacheScope,
        context: &OperationContext,
        page: usize,
        page_size: usize,
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        if page_size == 0 {
            return Err(IndexerError::config("page size must be greater than zero"));
        }
        let offset = page.checked_mul(page_size).ok_or_else(|| {
            IndexerError::config(format!("page {} of size {} overflows the offset", page, page_size))
        })?;

        let kind = self.config.entity_kind;
        let entities = self
            .catalog
            .fetch(kind, offset, page_size, &context.filter)
            .await?;

        debug!(%kind, offset, fetched = entities.len(), "Fetched page");
        self.index_entities(scope, context, kind, &entities, use_shadow)
            .await
    }

    /// Build documents for `entities` and submit them in one batch.
    ///
    /// Build failures are skipped or abort the call according to
    /// `skip_failed_documents`. A submit failure always aborts.
    async fn index_entities(
        &self,
        scope: &CacheScope,
        context: &OperationContext,
        kind: EntityKind,
        entities: &[CatalogEntity],
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        let mut summary = IncrementalSummary::default();
        if entities.is_empty() {
            return Ok(summary);
        }

        let fields = self.fields_in(scope, kind).await?;
        let locales = self.all_locales_in(scope).await?;

        let mut documents: Vec<IndexDocument> = Vec::with_capacity(entities.len());
        for entity in entities {
            let built = match kind {
                EntityKind::Product => {
                    self.builder
                        .build_product_document(entity, &fields, &locales, context, scope)
                }
                EntityKind::Sku => {
                    self.builder
                        .build_sku_document(entity, &fields, &locales, context, scope)
                }
            };

            match built {
                Ok(document) => documents.push(document),
                Err(e) if self.config.skip_failed_documents => {
                    warn!(error = %e, entity_id = %entity.id, "Skipping entity");
                    summary.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if documents.is_empty() {
            return Ok(summary);
        }

        let destination = self.roles.get(DestinationRole::from_shadow_flag(use_shadow));
        destination
            .submit_documents(&documents)
            .await
            .map_err(|e| IndexerError::index_build(destination.name(), e))?;
        self.builder.log_documents(&documents);

        summary.submitted = documents.len();
        info!(
            destination = %destination.name(),
            submitted = summary.submitted,
            skipped = summary.skipped,
            "Submitted documents"
        );
        Ok(summary)
    }

    /// Field definitions for `kind`, memoised in `scope`.
    async fn fields_in(
        &self,
        scope: &CacheScope,
        kind: EntityKind,
    ) -> Result<Arc<Vec<FieldDefinition>>, IndexerError> {
        let key = CacheKey::Fields(kind);
        if let Some(CachedValue::Fields(fields)) = scope.get(&key) {
            return Ok(fields);
        }
        let fields = Arc::new(self.fields.fields_for_entity_type(kind).await?);
        scope.insert(key, CachedValue::Fields(Arc::clone(&fields)));
        Ok(fields)
    }

    /// The context incremental calls resolve values under: the ambient
    /// context with indexing overrides applied. The ambient context itself is
    /// left alone.
    fn indexing_context(&self) -> Result<OperationContext, IndexerError> {
        Ok(self.context.current()?.for_indexing())
    }
}
