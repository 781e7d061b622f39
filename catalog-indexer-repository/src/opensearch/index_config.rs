//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the catalog search
//! indexes.

use serde_json::{json, Value};

/// Configuration for the catalog indexes.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias queries are served from. Always points at the primary index.
    pub alias: String,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `alias` - The read alias name
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }

    /// The two physical index names behind the alias.
    pub fn index_names(&self) -> (String, String) {
        physical_index_names(&self.alias)
    }
}

/// Get the physical index names for an alias.
///
/// # Returns
///
/// The pair of index names (e.g., `("catalog_a", "catalog_b")`)
pub fn physical_index_names(alias: &str) -> (String, String) {
    (format!("{}_a", alias), format!("{}_b", alias))
}

/// Get the index settings and mappings for a catalog index.
///
/// The configuration includes:
/// - **Keyword fields**: For the identifying fields, filtering and exact lookups
/// - **Dynamic templates**: Every string field is analysed text with a `raw`
///   keyword sub-field for faceting; numbers and booleans map natively
///
/// Field keys are only known at runtime (they depend on the field definitions,
/// locales and price lists), so everything apart from the identifying fields is
/// mapped dynamically.
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 1 replica for redundancy
/// - Refresh interval disabled; visibility is driven by explicit commits
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1,
            "refresh_interval": "-1"
        },
        "mappings": {
            "dynamic_templates": [
                {
                    "strings_as_text": {
                        "match_mapping_type": "string",
                        "mapping": {
                            "type": "text",
                            "fields": {
                                "raw": {
                                    "type": "keyword",
                                    "ignore_above": 256
                                }
                            }
                        }
                    }
                }
            ],
            "properties": {
                "id": {
                    "type": "keyword"
                },
                "entity_id": {
                    "type": "keyword"
                },
                "kind": {
                    "type": "keyword"
                },
                "parent_id": {
                    "type": "keyword"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert_eq!(settings["settings"]["refresh_interval"], "-1");

        let properties = &settings["mappings"]["properties"];
        for key in ["id", "entity_id", "kind", "parent_id"] {
            assert_eq!(properties[key]["type"], "keyword", "{} should be a keyword", key);
        }

        let template = &settings["mappings"]["dynamic_templates"][0]["strings_as_text"];
        assert_eq!(template["match_mapping_type"], "string");
        assert_eq!(template["mapping"]["fields"]["raw"]["type"], "keyword");
    }

    #[test]
    fn test_physical_index_names() {
        assert_eq!(
            physical_index_names("catalog"),
            ("catalog_a".to_string(), "catalog_b".to_string())
        );
        assert_eq!(IndexConfig::new("shop").index_names().1, "shop_b");
    }
}
