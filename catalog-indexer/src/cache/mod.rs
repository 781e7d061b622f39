//! Batch cache scope.
//!
//! A cache that lives exactly as long as one logical indexing operation: a
//! full rebuild, or a caller's sequence of incremental calls wrapped in
//! [`with_cache_scope`]. Document builds route shared lookups (field
//! definitions, locales, resolved prices) through it so a multi-page
//! operation computes each of them once.
//!
//! There is no eviction. Closing the scope discards everything, and a closed
//! scope never returns an entry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use catalog_indexer_shared::{EntityKind, FieldDefinition, Locale};
use tracing::debug;
use uuid::Uuid;

use crate::errors::IndexerError;

/// Key of a cached sub-result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Field definitions of an entity kind.
    Fields(EntityKind),
    /// The full locale list.
    Locales,
    /// An entity's price under a price list.
    Price {
        kind: EntityKind,
        entity_id: String,
        price_list: Option<String>,
    },
}

/// A cached sub-result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Fields(Arc<Vec<FieldDefinition>>),
    Locales(Arc<Vec<Locale>>),
    Price(Option<f64>),
}

struct ScopeInner {
    id: Uuid,
    open: AtomicBool,
    entries: Mutex<HashMap<CacheKey, CachedValue>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Handle to an open cache scope.
///
/// Cheap to clone; every clone refers to the same scope. Once any clone
/// closes the scope, all of them read as empty.
#[derive(Clone)]
pub struct CacheScope {
    inner: Arc<ScopeInner>,
}

impl std::fmt::Debug for CacheScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheScope")
            .field("id", &self.inner.id)
            .field("open", &self.is_open())
            .field("entries", &self.len())
            .finish()
    }
}

impl CacheScope {
    /// Open a new, empty scope.
    pub fn open() -> Self {
        let scope = Self {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                open: AtomicBool::new(true),
                entries: Mutex::new(HashMap::new()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        };
        debug!(scope_id = %scope.inner.id, "Cache scope opened");
        scope
    }

    /// Close the scope and discard every entry. Closing twice is harmless.
    pub fn close(&self) {
        if !self.inner.open.swap(false, Ordering::SeqCst) {
            return;
        }
        let discarded = {
            let mut entries = self.entries();
            let count = entries.len();
            entries.clear();
            count
        };
        debug!(
            scope_id = %self.inner.id,
            discarded,
            hits = self.inner.hits.load(Ordering::Relaxed),
            misses = self.inner.misses.load(Ordering::Relaxed),
            "Cache scope closed"
        );
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Number of live entries; zero once closed.
    pub fn len(&self) -> usize {
        if !self.is_open() {
            return 0;
        }
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.inner.hits.load(Ordering::Relaxed)
    }

    /// Look up an entry. Always `None` once the scope is closed.
    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        if !self.is_open() {
            return None;
        }
        let value = self.entries().get(key).cloned();
        let counter = if value.is_some() {
            &self.inner.hits
        } else {
            &self.inner.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Store an entry. Ignored once the scope is closed.
    pub fn insert(&self, key: CacheKey, value: CachedValue) {
        if !self.is_open() {
            return;
        }
        self.entries().insert(key, value);
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CachedValue>> {
        // Entries are plain values; a panic mid-insert cannot leave one half-written.
        self.inner.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Closes the wrapped scope when dropped.
pub(crate) struct ScopeGuard {
    scope: CacheScope,
}

impl ScopeGuard {
    pub(crate) fn open() -> Self {
        Self {
            scope: CacheScope::open(),
        }
    }

    pub(crate) fn scope(&self) -> &CacheScope {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.scope.close();
    }
}

/// Run `operation` with a fresh cache scope, closing it on every exit path.
///
/// The scope is closed when the operation returns `Ok`, returns `Err`,
/// panics, or its future is dropped before completion.
///
/// # Example
///
/// ```ignore
/// let indexer = orchestrator.indexer();
/// with_cache_scope(|scope| async move {
///     let mut page = 0;
///     while page * page_size < total {
///         indexer.build_incremental_index_in(&scope, page, page_size, false).await?;
///         page += 1;
///     }
///     Ok(())
/// })
/// .await?;
/// ```
pub async fn with_cache_scope<F, Fut, T>(operation: F) -> Result<T, IndexerError>
where
    F: FnOnce(CacheScope) -> Fut,
    Fut: Future<Output = Result<T, IndexerError>>,
{
    let guard = ScopeGuard::open();
    operation(guard.scope().clone()).await
}
