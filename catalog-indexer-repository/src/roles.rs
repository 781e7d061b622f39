//! Primary and shadow destination roles.
//!
//! Two physical destinations alternate between serving queries and being
//! rebuilt. Both roles live behind one lock so that readers always observe a
//! consistent pair and a swap is a single reference exchange, never a copy of
//! index data. Promotions are serialized, so the shadow cannot change between
//! moving the backend alias and swapping the roles.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::info;

use crate::errors::DestinationError;
use crate::interfaces::IndexDestination;
use crate::types::DestinationRole;

struct RolePair {
    primary: Arc<dyn IndexDestination>,
    shadow: Arc<dyn IndexDestination>,
}

/// The swappable primary/shadow destination pair.
pub struct DestinationRoles {
    pair: RwLock<RolePair>,
    promotion: Mutex<()>,
}

impl DestinationRoles {
    /// Create the pair with its initial role assignment.
    pub fn new(primary: Arc<dyn IndexDestination>, shadow: Arc<dyn IndexDestination>) -> Self {
        Self {
            pair: RwLock::new(RolePair { primary, shadow }),
            promotion: Mutex::new(()),
        }
    }

    /// The destination currently serving queries.
    pub fn primary(&self) -> Arc<dyn IndexDestination> {
        self.get(DestinationRole::Primary)
    }

    /// The destination currently available for rebuilding.
    pub fn shadow(&self) -> Arc<dyn IndexDestination> {
        self.get(DestinationRole::Shadow)
    }

    /// The destination currently holding `role`.
    pub fn get(&self, role: DestinationRole) -> Arc<dyn IndexDestination> {
        // The pair is replaced in a single swap, so a poisoned lock still
        // guards a consistent value.
        let pair = self.pair.read().unwrap_or_else(PoisonError::into_inner);
        match role {
            DestinationRole::Primary => Arc::clone(&pair.primary),
            DestinationRole::Shadow => Arc::clone(&pair.shadow),
        }
    }

    /// Promote the shadow to primary; the former primary becomes the shadow.
    ///
    /// The shadow's `promote` runs first. If it fails the roles are left as
    /// they were and the previous primary keeps serving.
    pub async fn promote_shadow(&self) -> Result<(), DestinationError> {
        // Only promotions rewrite the pair; holding this lock pins the shadow.
        let _promotion = self.promotion.lock().await;
        let shadow = self.shadow();
        shadow.promote().await?;

        let mut pair = self.pair.write().unwrap_or_else(PoisonError::into_inner);
        let pair = &mut *pair;
        std::mem::swap(&mut pair.primary, &mut pair.shadow);

        info!(
            primary = %pair.primary.name(),
            shadow = %pair.shadow.name(),
            "Swapped destination roles"
        );
        Ok(())
    }
}
