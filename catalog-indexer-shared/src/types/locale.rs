//! Locale descriptors.

use serde::{Deserialize, Serialize};

/// A language/region variant documents are localized for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    /// Locale code, e.g. `en_US`. Used verbatim as the document key suffix.
    pub code: String,
    /// Whether this is the catalog's default locale.
    #[serde(default)]
    pub default: bool,
}

impl Locale {
    /// Code of the canonical default entry added when a locale list has none.
    pub const DEFAULT_CODE: &'static str = "default";

    /// Create a non-default locale.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            default: false,
        }
    }

    /// Create the default locale.
    pub fn default_locale(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            default: true,
        }
    }

    /// The canonical default entry.
    pub fn canonical_default() -> Self {
        Self::default_locale(Self::DEFAULT_CODE)
    }
}
