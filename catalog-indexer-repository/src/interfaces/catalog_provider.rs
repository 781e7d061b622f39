//! Catalog-side provider traits.
//!
//! The catalog store, the locale configuration and the field definitions are
//! owned by other subsystems. The engine reads them through these traits.

use async_trait::async_trait;
use catalog_indexer_shared::{CatalogEntity, EntityFilter, EntityKind, FieldDefinition, Locale};

use crate::errors::CatalogError;

/// Supplies paged entity data.
///
/// Implementations must return entities in a stable order for a given filter,
/// so that page `n` of one sweep never overlaps page `m`. No guarantee is
/// expected if the catalog changes mid-sweep.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch up to `limit` products starting at `offset`.
    ///
    /// Returns fewer than `limit` entities (possibly none) near the end.
    async fn fetch_products(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError>;

    /// Fetch up to `limit` SKUs starting at `offset`.
    async fn fetch_skus(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError>;

    /// Count the entities of `kind` passing `filter`.
    async fn count_all(&self, kind: EntityKind, filter: &EntityFilter)
        -> Result<usize, CatalogError>;

    /// Fetch a page of whichever kind is requested.
    async fn fetch(
        &self,
        kind: EntityKind,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        match kind {
            EntityKind::Product => self.fetch_products(offset, limit, filter).await,
            EntityKind::Sku => self.fetch_skus(offset, limit, filter).await,
        }
    }
}

/// Supplies the locales documents are localized for.
#[async_trait]
pub trait LocaleProvider: Send + Sync {
    /// Every locale to consider, in order, including a default entry.
    async fn all_locales(&self) -> Result<Vec<Locale>, CatalogError>;
}

/// Supplies the indexable fields of each entity kind.
#[async_trait]
pub trait FieldDefinitionSource: Send + Sync {
    /// The fields indexed for `kind`, in order.
    async fn fields_for_entity_type(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<FieldDefinition>, CatalogError>;
}
