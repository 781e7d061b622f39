//! Ambient operation context.
//!
//! The settings indexing temporarily overrides: active locale, pricing
//! context and the entity visibility filter. Values are immutable; indexing
//! derives new contexts from old ones instead of mutating them.

use serde::{Deserialize, Serialize};

use crate::types::locale::Locale;

/// Visibility filter applied when fetching entities from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityFilter {
    pub include_unpublished: bool,
    pub include_archived: bool,
}

/// Locale, pricing and filter settings in effect for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationContext {
    /// Locale override; `None` reads untranslated values.
    pub locale: Option<Locale>,
    /// Price list used to resolve prices; `None` uses base prices.
    pub price_list: Option<String>,
    pub filter: EntityFilter,
}

impl OperationContext {
    /// The context documents are built under.
    ///
    /// Clears the locale override and forces the strict visibility filter so
    /// unpublished and archived entities never reach the index. The price list
    /// is kept.
    pub fn for_indexing(&self) -> Self {
        Self {
            locale: None,
            price_list: self.price_list.clone(),
            filter: EntityFilter::default(),
        }
    }

    /// A copy of this context reading values as seen from `locale`.
    pub fn with_locale(&self, locale: &Locale) -> Self {
        Self {
            locale: Some(locale.clone()),
            ..self.clone()
        }
    }

    /// A copy of this context resolving prices under `price_list`.
    pub fn with_price_list(&self, price_list: impl Into<String>) -> Self {
        Self {
            price_list: Some(price_list.into()),
            ..self.clone()
        }
    }
}
