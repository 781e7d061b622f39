//! Catalog entity types.
//!
//! This module defines the read-only view of a product or SKU that the
//! indexer turns into a search document.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::locale::Locale;
use crate::types::operation_context::EntityFilter;

/// The kind of catalog entity being indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A product, the unit most catalogs are searched by.
    #[default]
    Product,
    /// A purchasable variant of a product.
    Sku,
}

impl EntityKind {
    /// Lowercase name used in document ids and configuration values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Sku => "sku",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product" | "products" => Ok(Self::Product),
            "sku" | "skus" => Ok(Self::Sku),
            other => Err(format!("unknown entity kind '{}'", other)),
        }
    }
}

fn default_published() -> bool {
    true
}

/// A product or SKU as supplied by the catalog.
///
/// The indexer never mutates an entity. Attribute values are raw JSON values;
/// their interpretation is driven by the [`FieldDefinition`](crate::FieldDefinition)
/// that references them.
///
/// # Fields
///
/// - `id`: Stable identifier, unique within its kind
/// - `kind`: Whether this is a product or a SKU
/// - `parent_id`: For SKUs, the owning product
/// - `attributes`: Default (untranslated) attribute values
/// - `translations`: Attribute values keyed by locale code, then attribute name
/// - `prices`: Prices keyed by price list code
/// - `base_price`: Price used when no price list applies
/// - `published` / `archived`: Visibility flags honoured by [`EntityFilter`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogEntity {
    pub id: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub translations: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<f64>,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub archived: bool,
}

impl CatalogEntity {
    /// Create a published product with no attributes.
    pub fn product(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: EntityKind::Product,
            published: true,
            ..Default::default()
        }
    }

    /// Create a published SKU belonging to `parent_id`.
    pub fn sku(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: EntityKind::Sku,
            parent_id: Some(parent_id.into()),
            published: true,
            ..Default::default()
        }
    }

    /// Set a default attribute value, returning the entity.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Set a translated attribute value, returning the entity.
    pub fn with_translation(
        mut self,
        locale: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.translations
            .entry(locale.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    /// Set the price for a price list, returning the entity.
    pub fn with_price(mut self, price_list: impl Into<String>, price: f64) -> Self {
        self.prices.insert(price_list.into(), price);
        self
    }

    /// Set the base price, returning the entity.
    pub fn with_base_price(mut self, price: f64) -> Self {
        self.base_price = Some(price);
        self
    }

    /// The untranslated value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The value of an attribute as seen from `locale`.
    ///
    /// Falls back to the untranslated value when the locale has no translation.
    pub fn localized_attribute(&self, name: &str, locale: Option<&Locale>) -> Option<&Value> {
        locale
            .and_then(|l| self.translations.get(&l.code))
            .and_then(|values| values.get(name))
            .or_else(|| self.attribute(name))
    }

    /// The price under `price_list`, falling back to the base price.
    pub fn price(&self, price_list: Option<&str>) -> Option<f64> {
        price_list
            .and_then(|list| self.prices.get(list).copied())
            .or(self.base_price)
    }

    /// Whether this entity passes the given visibility filter.
    pub fn matches(&self, filter: &EntityFilter) -> bool {
        (self.published || filter.include_unpublished) && (!self.archived || filter.include_archived)
    }
}
