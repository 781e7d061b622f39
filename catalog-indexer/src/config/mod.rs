//! Configuration and dependency wiring.

mod dependencies;
mod indexer_config;

pub use dependencies::{ConnectionMode, Dependencies};
pub use indexer_config::IndexerConfig;
