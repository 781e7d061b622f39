//! Request and option types for index destination operations.

use serde::{Deserialize, Serialize};

/// How a commit makes submitted documents visible.
///
/// A soft commit makes additions searchable without forcing a durable flush;
/// whoever requests one is responsible for a later hard commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOptions {
    /// Visibility without a durable flush.
    pub soft: bool,
    /// Block until a new searcher sees the changes.
    pub wait_searcher: bool,
    /// Block until the flush to storage completes.
    pub wait_flush: bool,
}

impl CommitOptions {
    /// A durable commit that waits for both flush and searcher.
    pub fn hard() -> Self {
        Self {
            soft: false,
            wait_searcher: true,
            wait_flush: true,
        }
    }

    /// A visibility-only commit.
    pub fn soft() -> Self {
        Self {
            soft: true,
            wait_searcher: true,
            wait_flush: false,
        }
    }
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self::hard()
    }
}

/// The role an index destination currently plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationRole {
    /// Serving live queries.
    Primary,
    /// Being rebuilt, not yet serving queries.
    Shadow,
}

impl DestinationRole {
    /// Pick the role from an incremental call's `use_shadow` flag.
    pub fn from_shadow_flag(use_shadow: bool) -> Self {
        if use_shadow {
            Self::Shadow
        } else {
            Self::Primary
        }
    }
}
