//! Indexable field definitions.

use serde::{Deserialize, Serialize};

use crate::types::locale::Locale;

/// The value type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Analysed full-text.
    Text,
    /// Exact-match string, typically used for facets.
    String,
    Integer,
    Decimal,
    Boolean,
    /// RFC 3339 timestamp.
    Date,
    /// Price resolved through the active price list.
    Price,
}

impl FieldType {
    /// Human readable name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Price => "price",
        }
    }
}

/// Describes one indexable attribute.
///
/// Supplied externally per entity kind and immutable for the duration of an
/// indexing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Name of the field in the index.
    pub name: String,
    pub field_type: FieldType,
    /// One value per locale, stored under locale-suffixed keys.
    #[serde(default)]
    pub localized: bool,
    /// Values collect into an ordered sequence.
    #[serde(default)]
    pub multi_valued: bool,
    /// A missing value fails the document instead of being omitted.
    #[serde(default)]
    pub required: bool,
    /// Entity attribute the value is read from; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl FieldDefinition {
    /// Create a single-valued, locale-insensitive, optional field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            localized: false,
            multi_valued: false,
            required: false,
            property: None,
        }
    }

    /// Mark the field as locale-sensitive.
    pub fn localized(mut self) -> Self {
        self.localized = true;
        self
    }

    /// Mark the field as multi-valued.
    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Read the value from a differently named entity attribute.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// The entity attribute this field reads.
    pub fn property(&self) -> &str {
        self.property.as_deref().unwrap_or(&self.name)
    }

    /// The document key this field is stored under.
    ///
    /// Price fields are suffixed with the price list when one is active, and
    /// localized fields with the locale code: `{name}[_{price_list}][_{locale}]`.
    pub fn document_key(&self, locale: Option<&Locale>, price_list: Option<&str>) -> String {
        let mut key = self.name.clone();
        if self.field_type == FieldType::Price {
            if let Some(list) = price_list {
                key.push('_');
                key.push_str(list);
            }
        }
        if let Some(locale) = locale {
            key.push('_');
            key.push_str(&locale.code);
        }
        key
    }
}
