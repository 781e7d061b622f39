//! Ambient context snapshot and restore.
//!
//! The process holds one ambient [`OperationContext`] that other code reads
//! (active locale, price list, entity visibility filter). Indexing replaces it
//! for the duration of an operation and must put it back afterwards, whether
//! the operation succeeded or not.
//!
//! Snapshots are immutable [`ContextToken`] values. Documents are never built
//! from the ambient context directly: the orchestrator derives the indexing
//! context once and passes it explicitly into every build.

use std::sync::{Arc, RwLock};

use catalog_indexer_shared::OperationContext;
use tracing::{debug, error};

use crate::errors::IndexerError;

/// An opaque saved copy of the ambient context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextToken {
    saved: OperationContext,
}

impl ContextToken {
    /// The context this token restores.
    pub fn context(&self) -> &OperationContext {
        &self.saved
    }
}

/// Owner of the process-wide ambient context.
///
/// Only one indexing operation's overrides are active at a time; nested
/// snapshot/restore pairs are not supported.
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    current: Arc<RwLock<OperationContext>>,
}

impl ContextManager {
    /// Create a manager owning a fresh ambient context.
    pub fn new(initial: OperationContext) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    /// The shared ambient context handle.
    pub fn handle(&self) -> Arc<RwLock<OperationContext>> {
        Arc::clone(&self.current)
    }

    /// A copy of the ambient context as it is now.
    pub fn current(&self) -> Result<OperationContext, IndexerError> {
        self.current
            .read()
            .map(|ctx| ctx.clone())
            .map_err(|_| IndexerError::service_msg("ambient context lock poisoned"))
    }

    /// Capture every field of the ambient context.
    pub fn snapshot(&self) -> Result<ContextToken, IndexerError> {
        let saved = self.current()?;
        debug!(context = ?saved, "Context snapshot taken");
        Ok(ContextToken { saved })
    }

    /// Replace the ambient context.
    pub fn apply(&self, context: OperationContext) -> Result<(), IndexerError> {
        let mut current = self
            .current
            .write()
            .map_err(|_| IndexerError::service_msg("ambient context lock poisoned"))?;
        *current = context;
        Ok(())
    }

    /// Install the indexing overrides and return the resulting context.
    ///
    /// See [`OperationContext::for_indexing`] for what is overridden.
    pub fn apply_indexing_overrides(&self) -> Result<OperationContext, IndexerError> {
        let indexing = self.current()?.for_indexing();
        self.apply(indexing.clone())?;
        Ok(indexing)
    }

    /// Put back every field captured in `token`.
    ///
    /// Idempotent. A failure here means the ambient context may be left with
    /// indexing overrides in place, so it is logged as an error and returned,
    /// never swallowed.
    pub fn restore(&self, token: &ContextToken) -> Result<(), IndexerError> {
        match self.current.write() {
            Ok(mut current) => {
                *current = token.saved.clone();
                debug!("Context restored");
                Ok(())
            }
            Err(_) => {
                error!(
                    expected = ?token.saved,
                    "Failed to restore ambient context: lock poisoned, indexing overrides may still be active"
                );
                Err(IndexerError::context_restore(
                    "ambient context lock poisoned; saved context could not be reapplied",
                ))
            }
        }
    }
}

/// Restores a snapshot when dropped unless restored explicitly first.
///
/// Covers exits that never reach the explicit restore, such as a panic or the
/// operation's future being dropped.
pub(crate) struct RestoreOnDrop<'a> {
    manager: &'a ContextManager,
    token: Option<ContextToken>,
}

impl<'a> RestoreOnDrop<'a> {
    pub(crate) fn new(manager: &'a ContextManager, token: ContextToken) -> Self {
        Self {
            manager,
            token: Some(token),
        }
    }

    /// Restore now, surfacing any failure.
    pub(crate) fn restore(mut self) -> Result<(), IndexerError> {
        match self.token.take() {
            Some(token) => self.manager.restore(&token),
            None => Ok(()),
        }
    }
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            // restore() already logs the failure at error level.
            let _ = self.manager.restore(&token);
        }
    }
}
