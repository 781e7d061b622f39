//! Document builder implementation.
//!
//! Turns one catalog entity and its indexable field definitions into a single
//! flattened [`IndexDocument`]. Locale-sensitive fields fan out into one key
//! per locale; price fields are suffixed with the active price list.

use catalog_indexer_shared::{
    CatalogEntity, EntityKind, FieldDefinition, FieldType, IndexDocument, Locale,
    OperationContext,
};
use serde_json::Value;
use tracing::{enabled, trace, Level};

use crate::builder::value::{self, Mismatch};
use crate::cache::{CacheKey, CacheScope, CachedValue};
use crate::errors::DocumentBuildError;

/// Builds index documents from catalog entities.
///
/// The builder holds no state of its own. Everything that varies between
/// calls arrives as arguments: the operation context decides the locale and
/// price list values are resolved under, and the cache scope is where shared
/// lookups are memoised.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder;

impl DocumentBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the document for one entity.
    ///
    /// # Arguments
    ///
    /// * `entity` - The entity to index; never modified
    /// * `fields` - Field definitions for the entity's kind
    /// * `locales` - Locales that locale-sensitive fields fan out over
    /// * `context` - The indexing context values are resolved under
    /// * `cache` - The active cache scope
    ///
    /// # Returns
    ///
    /// * `Ok(IndexDocument)` - One document holding every resolvable field
    /// * `Err(DocumentBuildError)` - A required field has no value, a value
    ///   does not fit its declared type, or two definitions collide on a key
    pub fn build_document(
        &self,
        entity: &CatalogEntity,
        fields: &[FieldDefinition],
        locales: &[Locale],
        context: &OperationContext,
        cache: &CacheScope,
    ) -> Result<IndexDocument, DocumentBuildError> {
        let mut document = IndexDocument::new(entity.id.clone(), entity.kind);
        document.parent_id = entity.parent_id.clone();

        for field in fields {
            if field.localized {
                for locale in locales {
                    let localized = context.with_locale(locale);
                    let key = field.document_key(Some(locale), context.price_list.as_deref());
                    let value = self.resolve(entity, field, &localized, cache)?;
                    put(&mut document, entity, field, key, value)?;
                }
            } else {
                let key = field.document_key(None, context.price_list.as_deref());
                let value = self.resolve(entity, field, context, cache)?;
                put(&mut document, entity, field, key, value)?;
            }
        }

        Ok(document)
    }

    /// Build the document for a product.
    pub fn build_product_document(
        &self,
        product: &CatalogEntity,
        fields: &[FieldDefinition],
        locales: &[Locale],
        context: &OperationContext,
        cache: &CacheScope,
    ) -> Result<IndexDocument, DocumentBuildError> {
        expect_kind(product, EntityKind::Product)?;
        self.build_document(product, fields, locales, context, cache)
    }

    /// Build the document for a SKU. The parent product id is carried over.
    pub fn build_sku_document(
        &self,
        sku: &CatalogEntity,
        fields: &[FieldDefinition],
        locales: &[Locale],
        context: &OperationContext,
        cache: &CacheScope,
    ) -> Result<IndexDocument, DocumentBuildError> {
        expect_kind(sku, EntityKind::Sku)?;
        self.build_document(sku, fields, locales, context, cache)
    }

    /// Emit every document at trace level.
    pub fn log_documents(&self, documents: &[IndexDocument]) {
        if !enabled!(Level::TRACE) {
            return;
        }
        for document in documents {
            trace!(
                document_id = %document.document_id(),
                document = %document.to_source(),
                "Built document"
            );
        }
    }

    /// Resolve one field's value under `context`.
    fn resolve(
        &self,
        entity: &CatalogEntity,
        field: &FieldDefinition,
        context: &OperationContext,
        cache: &CacheScope,
    ) -> Result<Option<Value>, DocumentBuildError> {
        if field.field_type == FieldType::Price {
            return Ok(resolve_price(entity, context, cache).and_then(value::decimal));
        }

        let raw = match entity.localized_attribute(field.property(), context.locale.as_ref()) {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let invalid = |mismatch: Mismatch| DocumentBuildError::InvalidValue {
            kind: entity.kind,
            entity_id: entity.id.clone(),
            field: field.name.clone(),
            expected: mismatch.expected,
            found: mismatch.found,
        };

        match raw {
            Value::Array(items) if field.multi_valued => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(coerced) = value::coerce(field.field_type, item).map_err(invalid)? {
                        values.push(coerced);
                    }
                }
                Ok((!values.is_empty()).then_some(Value::Array(values)))
            }
            Value::Array(_) => Err(invalid(Mismatch {
                expected: "a single value",
                found: value::describe(raw),
            })),
            scalar => {
                let coerced = value::coerce(field.field_type, scalar).map_err(invalid)?;
                Ok(coerced.map(|v| if field.multi_valued { Value::Array(vec![v]) } else { v }))
            }
        }
    }
}

/// Look up the entity's price under the context's price list, memoised in the
/// cache scope.
fn resolve_price(
    entity: &CatalogEntity,
    context: &OperationContext,
    cache: &CacheScope,
) -> Option<f64> {
    let key = CacheKey::Price {
        kind: entity.kind,
        entity_id: entity.id.clone(),
        price_list: context.price_list.clone(),
    };
    if let Some(CachedValue::Price(price)) = cache.get(&key) {
        return price;
    }
    let price = entity.price(context.price_list.as_deref());
    cache.insert(key, CachedValue::Price(price));
    price
}

/// Store a resolved value, enforcing key uniqueness and required fields.
fn put(
    document: &mut IndexDocument,
    entity: &CatalogEntity,
    field: &FieldDefinition,
    key: String,
    value: Option<Value>,
) -> Result<(), DocumentBuildError> {
    if IndexDocument::is_reserved_key(&key) || document.contains_key(&key) {
        return Err(DocumentBuildError::DuplicateKey {
            kind: entity.kind,
            entity_id: entity.id.clone(),
            key,
        });
    }

    match value {
        Some(value) => {
            document.insert(key, value);
            Ok(())
        }
        None if field.required => Err(DocumentBuildError::MissingRequiredField {
            kind: entity.kind,
            entity_id: entity.id.clone(),
            field: key,
        }),
        None => Ok(()),
    }
}

fn expect_kind(entity: &CatalogEntity, expected: EntityKind) -> Result<(), DocumentBuildError> {
    if entity.kind != expected {
        return Err(DocumentBuildError::WrongEntityKind {
            entity_id: entity.id.clone(),
            expected,
            found: entity.kind,
        });
    }
    Ok(())
}
