//! JSON catalog snapshot.
//!
//! A file-backed stand-in for the catalog, locale and field definition
//! subsystems. Useful for seeding an index from an export and for running the
//! indexer without the catalog service.
//!
//! ```json
//! {
//!   "products": [{ "id": "1", "attributes": { "name": "Shirt" }, "base_price": 19.0 }],
//!   "skus": [{ "id": "10", "parent_id": "1", "attributes": { "color": "red" } }],
//!   "locales": [{ "code": "en_US", "default": true }, { "code": "fr_FR" }],
//!   "fields": {
//!     "product": [{ "name": "name", "field_type": "text", "localized": true }],
//!     "sku": [{ "name": "color", "field_type": "string" }]
//!   }
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;
use catalog_indexer_shared::{CatalogEntity, EntityFilter, EntityKind, FieldDefinition, Locale};
use serde::Deserialize;
use tracing::info;

use crate::errors::CatalogError;
use crate::interfaces::{CatalogProvider, FieldDefinitionSource, LocaleProvider};

#[derive(Debug, Clone, Default, Deserialize)]
struct SnapshotFields {
    #[serde(default)]
    product: Vec<FieldDefinition>,
    #[serde(default)]
    sku: Vec<FieldDefinition>,
}

/// An in-memory catalog loaded from a JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonCatalogSnapshot {
    #[serde(default)]
    products: Vec<CatalogEntity>,
    #[serde(default)]
    skus: Vec<CatalogEntity>,
    #[serde(default)]
    locales: Vec<Locale>,
    #[serde(default)]
    fields: SnapshotFields,
}

impl JsonCatalogSnapshot {
    /// Parse a snapshot from a JSON string.
    ///
    /// Entity kinds are taken from the list an entity appears in, so the
    /// `kind` attribute may be omitted.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let mut snapshot: Self =
            serde_json::from_str(json).map_err(|e| CatalogError::parse(e.to_string()))?;

        for product in &mut snapshot.products {
            product.kind = EntityKind::Product;
        }
        for sku in &mut snapshot.skus {
            sku.kind = EntityKind::Sku;
        }
        Ok(snapshot)
    }

    /// Load a snapshot from a JSON file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CatalogError::not_found(path.display().to_string())
            } else {
                CatalogError::fetch(format!("{}: {}", path.display(), e))
            }
        })?;

        let snapshot = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            products = snapshot.products.len(),
            skus = snapshot.skus.len(),
            locales = snapshot.locales.len(),
            "Loaded catalog snapshot"
        );
        Ok(snapshot)
    }

    fn entities(&self, kind: EntityKind) -> &[CatalogEntity] {
        match kind {
            EntityKind::Product => &self.products,
            EntityKind::Sku => &self.skus,
        }
    }

    fn page(
        &self,
        kind: EntityKind,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Vec<CatalogEntity> {
        self.entities(kind)
            .iter()
            .filter(|entity| entity.matches(filter))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogProvider for JsonCatalogSnapshot {
    async fn fetch_products(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        Ok(self.page(EntityKind::Product, offset, limit, filter))
    }

    async fn fetch_skus(
        &self,
        offset: usize,
        limit: usize,
        filter: &EntityFilter,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        Ok(self.page(EntityKind::Sku, offset, limit, filter))
    }

    async fn count_all(
        &self,
        kind: EntityKind,
        filter: &EntityFilter,
    ) -> Result<usize, CatalogError> {
        Ok(self
            .entities(kind)
            .iter()
            .filter(|entity| entity.matches(filter))
            .count())
    }
}

#[async_trait]
impl LocaleProvider for JsonCatalogSnapshot {
    /// The snapshot's locales, with the canonical default entry prepended when
    /// none of them is marked default.
    async fn all_locales(&self) -> Result<Vec<Locale>, CatalogError> {
        let mut locales = self.locales.clone();
        if !locales.iter().any(|locale| locale.default) {
            locales.insert(0, Locale::canonical_default());
        }
        Ok(locales)
    }
}

#[async_trait]
impl FieldDefinitionSource for JsonCatalogSnapshot {
    async fn fields_for_entity_type(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<FieldDefinition>, CatalogError> {
        Ok(match kind {
            EntityKind::Product => self.fields.product.clone(),
            EntityKind::Sku => self.fields.sku.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_indexer_shared::FieldType;

    const SNAPSHOT: &str = r#"{
        "products": [
            { "id": "1", "attributes": { "name": "Shirt" } },
            { "id": "2", "attributes": { "name": "Hat" }, "published": false },
            { "id": "3", "attributes": { "name": "Scarf" } },
            { "id": "4", "attributes": { "name": "Coat" }, "archived": true }
        ],
        "skus": [
            { "id": "10", "parent_id": "1", "attributes": { "color": "red" } }
        ],
        "locales": [{ "code": "fr_FR" }],
        "fields": {
            "product": [{ "name": "name", "field_type": "text", "localized": true }]
        }
    }"#;

    #[tokio::test]
    async fn test_paging_respects_filter() {
        let snapshot = JsonCatalogSnapshot::from_json_str(SNAPSHOT).unwrap();
        let strict = EntityFilter::default();

        assert_eq!(snapshot.count_all(EntityKind::Product, &strict).await.unwrap(), 2);
        let page = snapshot.fetch_products(0, 10, &strict).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let all = EntityFilter {
            include_unpublished: true,
            include_archived: true,
        };
        assert_eq!(snapshot.count_all(EntityKind::Product, &all).await.unwrap(), 4);
        let page = snapshot.fetch_products(1, 2, &all).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_short_final_page() {
        let snapshot = JsonCatalogSnapshot::from_json_str(SNAPSHOT).unwrap();
        let page = snapshot
            .fetch(EntityKind::Product, 1, 10, &EntityFilter::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 1);

        let past_end = snapshot
            .fetch(EntityKind::Product, 5, 10, &EntityFilter::default())
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_kinds_assigned_from_lists() {
        let snapshot = JsonCatalogSnapshot::from_json_str(SNAPSHOT).unwrap();
        let skus = snapshot.fetch_skus(0, 10, &EntityFilter::default()).await.unwrap();
        assert_eq!(skus[0].kind, EntityKind::Sku);
        assert_eq!(skus[0].parent_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_default_locale_prepended() {
        let snapshot = JsonCatalogSnapshot::from_json_str(SNAPSHOT).unwrap();
        let locales = snapshot.all_locales().await.unwrap();
        assert_eq!(locales.len(), 2);
        assert_eq!(locales[0], Locale::canonical_default());
        assert_eq!(locales[1].code, "fr_FR");
    }

    #[tokio::test]
    async fn test_existing_default_locale_kept() {
        let snapshot = JsonCatalogSnapshot::from_json_str(
            r#"{ "locales": [{ "code": "en_US", "default": true }] }"#,
        )
        .unwrap();
        let locales = snapshot.all_locales().await.unwrap();
        assert_eq!(locales, vec![Locale::default_locale("en_US")]);
    }

    #[tokio::test]
    async fn test_fields_for_entity_type() {
        let snapshot = JsonCatalogSnapshot::from_json_str(SNAPSHOT).unwrap();
        let fields = snapshot.fields_for_entity_type(EntityKind::Product).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_type, FieldType::Text);
        assert!(snapshot
            .fields_for_entity_type(EntityKind::Sku)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let result = JsonCatalogSnapshot::from_json_str("{ not json");
        assert!(matches!(result, Err(CatalogError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = JsonCatalogSnapshot::from_path("/nonexistent/catalog.json").await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }
}
