//! Rebuild orchestrator.
//!
//! Runs a full rebuild into the shadow destination and swaps it live:
//!
//! 1. Fail fast if a rebuild is already running in this process
//! 2. Snapshot the ambient context and install the indexing overrides
//! 3. Open one cache scope for the whole rebuild
//! 4. Clear the shadow, then index every page into it in increasing order
//! 5. Commit the shadow, optionally optimize it, and promote it to primary
//!
//! The shadow is always committed before promotion. With commits disabled in
//! configuration the rebuild still forces a hard commit, since the indexes
//! never refresh on their own and a promoted index must serve its documents.
//!
//! Whatever happens, the context is restored, the scope closed and the
//! in-process flag cleared before `rebuild_index` returns. A failed rebuild
//! never promotes the shadow.
//!
//! The in-process flag is local to this process. It is not a cluster lock and
//! must not be used to coordinate rebuilds across instances.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use catalog_indexer_repository::{CommitOptions, DestinationRoles, IndexDestination};
use catalog_indexer_shared::{CatalogEntity, EntityKind, IndexDocument, Locale, OperationContext};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::cache::{with_cache_scope, CacheScope};
use crate::commit::CommitController;
use crate::context::{ContextToken, RestoreOnDrop};
use crate::errors::IndexerError;
use crate::indexer::{IncrementalIndexer, IncrementalSummary};

/// Where the orchestrator is in a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildPhase {
    /// No rebuild running.
    Idle,
    /// Indexing pages into the shadow.
    Running,
    /// All pages indexed; committing, optimizing and promoting the shadow.
    Committing,
    /// The rebuild failed and is cleaning up.
    Failed,
}

/// Outcome of a successful full rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildSummary {
    pub rebuild_id: Uuid,
    pub entity_kind: EntityKind,
    pub total_entities: usize,
    pub pages: usize,
    pub submitted: usize,
    pub skipped: usize,
    /// Name of the destination serving queries after the swap.
    pub primary: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RebuildSummary {
    pub fn duration(&self) -> TimeDelta {
        self.finished_at - self.started_at
    }
}

/// What a completed rebuild did, before it is stamped with timing.
#[derive(Debug)]
struct RebuildOutcome {
    total_entities: usize,
    pages: usize,
    totals: IncrementalSummary,
    primary: String,
}

// Reindex status word. Running and cancel-requested share one atomic so a
// cancel can only be recorded against a rebuild that is still running, and is
// cleared together with it.
const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLING: u8 = 2;

/// Holds the reindex status for the lifetime of one rebuild.
struct ReindexGuard<'a> {
    status: &'a AtomicU8,
}

impl<'a> ReindexGuard<'a> {
    fn acquire(status: &'a AtomicU8) -> Result<Self, IndexerError> {
        status
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| IndexerError::ConcurrentRebuild)?;
        Ok(Self { status })
    }
}

impl Drop for ReindexGuard<'_> {
    fn drop(&mut self) {
        self.status.store(IDLE, Ordering::SeqCst);
    }
}

/// Returns the phase to `Idle` when dropped.
struct PhaseGuard<'a> {
    phase: &'a Mutex<RebuildPhase>,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = RebuildPhase::Idle;
    }
}

/// Entry point of the reindexing engine.
///
/// Owns the incremental indexer and commit controller and exposes the full
/// rebuild plus the building blocks callers compose their own indexing
/// sequences from.
pub struct RebuildOrchestrator {
    indexer: IncrementalIndexer,
    commits: CommitController,
    status: AtomicU8,
    phase: Mutex<RebuildPhase>,
}

impl RebuildOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `indexer` - The incremental indexer pages are delegated to
    /// * `commits` - Commit policy applied to the shadow after indexing
    pub fn new(indexer: IncrementalIndexer, commits: CommitController) -> Self {
        Self {
            indexer,
            commits,
            status: AtomicU8::new(IDLE),
            phase: Mutex::new(RebuildPhase::Idle),
        }
    }

    pub fn indexer(&self) -> &IncrementalIndexer {
        &self.indexer
    }

    pub fn commit_controller(&self) -> &CommitController {
        &self.commits
    }

    pub fn roles(&self) -> &Arc<DestinationRoles> {
        self.indexer.roles()
    }

    /// Rebuild the whole index into the shadow and swap it live.
    ///
    /// # Returns
    ///
    /// * `Ok(RebuildSummary)` - The shadow was fully built, committed and promoted
    /// * `Err(IndexerError::ConcurrentRebuild)` - Another rebuild is running
    ///   in this process; nothing was touched
    /// * `Err(IndexerError::ContextRestore)` - The ambient context could not be
    ///   put back
    /// * `Err(IndexerError::Service)` - The rebuild failed; the primary is
    ///   unchanged and the shadow was not promoted
    pub async fn rebuild_index(&self) -> Result<RebuildSummary, IndexerError> {
        let _status = ReindexGuard::acquire(&self.status)?;
        let _phase = PhaseGuard { phase: &self.phase };
        self.set_phase(RebuildPhase::Running);

        let rebuild_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%rebuild_id, "Starting full rebuild");

        let manager = self.indexer.context_manager();
        let restore = RestoreOnDrop::new(manager, manager.snapshot()?);

        let outcome = match manager.apply_indexing_overrides() {
            Ok(context) => {
                with_cache_scope(|scope| self.run_rebuild(rebuild_id, scope, context)).await
            }
            Err(e) => Err(e),
        }
        .map_err(|e| match e {
            e @ IndexerError::Service { .. } => e,
            other => IndexerError::service("full rebuild failed", other),
        });

        if outcome.is_err() {
            self.set_phase(RebuildPhase::Failed);
        }
        let restored = restore.restore();

        match (outcome, restored) {
            (Ok(outcome), Ok(())) => {
                let summary = RebuildSummary {
                    rebuild_id,
                    entity_kind: self.indexer.config().entity_kind,
                    total_entities: outcome.total_entities,
                    pages: outcome.pages,
                    submitted: outcome.totals.submitted,
                    skipped: outcome.totals.skipped,
                    primary: outcome.primary,
                    started_at,
                    finished_at: Utc::now(),
                };
                info!(
                    %rebuild_id,
                    pages = summary.pages,
                    submitted = summary.submitted,
                    skipped = summary.skipped,
                    primary = %summary.primary,
                    duration_ms = summary.duration().num_milliseconds(),
                    "Full rebuild completed"
                );
                Ok(summary)
            }
            (Ok(_), Err(restore_error)) => Err(restore_error),
            (Err(e), Ok(())) => {
                error!(%rebuild_id, error = %e, cause = %e.root_cause(), "Full rebuild failed");
                Err(e)
            }
            (Err(e), Err(restore_error)) => {
                error!(%rebuild_id, error = %e, cause = %e.root_cause(), "Full rebuild failed");
                Err(restore_error)
            }
        }
    }

    /// Clear, fill, commit and promote the shadow.
    #[instrument(skip(self, scope, context), fields(scope_id = %scope.id()))]
    async fn run_rebuild(
        &self,
        rebuild_id: Uuid,
        scope: CacheScope,
        context: OperationContext,
    ) -> Result<RebuildOutcome, IndexerError> {
        let config = self.indexer.config();
        config.validate()?;
        let page_size = config.page_size;

        let roles = self.indexer.roles();
        let shadow = roles.shadow();
        shadow
            .clear()
            .await
            .map_err(|e| IndexerError::index_build(shadow.name(), e))?;

        let total_entities = self.indexer.count_entities(&context).await?;
        let pages = total_entities.div_ceil(page_size);
        info!(
            shadow = %shadow.name(),
            kind = %config.entity_kind,
            total_entities,
            pages,
            page_size,
            "Indexing into shadow"
        );

        let mut totals = IncrementalSummary::default();
        for page in 0..pages {
            if self.cancel_requested() {
                warn!(page, pages, "Rebuild cancelled");
                return Err(IndexerError::service_msg(format!(
                    "rebuild cancelled before page {} of {}",
                    page + 1,
                    pages
                )));
            }

            let summary = self
                .indexer
                .build_page(&scope, &context, page, page_size, true)
                .await
                .map_err(|e| {
                    IndexerError::service(format!("rebuild failed on page {} of {}", page + 1, pages), e)
                })?;
            totals += summary;
            info!(
                page = page + 1,
                pages,
                submitted = summary.submitted,
                skipped = summary.skipped,
                "Indexed page"
            );
        }

        self.set_phase(RebuildPhase::Committing);
        if self.commits.is_enabled() {
            self.commits.commit(shadow.as_ref()).await?;
        } else {
            warn!(shadow = %shadow.name(), "Commits disabled, forcing a hard commit before promotion");
            self.commits
                .commit_with(shadow.as_ref(), CommitOptions::hard())
                .await?;
        }
        if config.optimize_after_rebuild {
            self.commits.optimize_index(shadow.as_ref()).await?;
        }
        roles
            .promote_shadow()
            .await
            .map_err(|e| IndexerError::index_build(shadow.name(), e))?;

        Ok(RebuildOutcome {
            total_entities,
            pages,
            totals,
            primary: shadow.name().to_string(),
        })
    }

    /// Whether a full rebuild is running in this process.
    ///
    /// Process-local only; says nothing about other instances.
    pub fn is_reindex_in_process(&self) -> bool {
        self.status.load(Ordering::SeqCst) != IDLE
    }

    /// The current rebuild phase.
    pub fn rebuild_phase(&self) -> RebuildPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the running rebuild to stop before its next page.
    ///
    /// A cancelled rebuild fails with a service error and does not promote
    /// the shadow. Returns false when no rebuild is running.
    pub fn request_cancel(&self) -> bool {
        match self
            .status
            .compare_exchange(RUNNING, CANCELLING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                info!("Rebuild cancellation requested");
                true
            }
            Err(current) => current == CANCELLING,
        }
    }

    fn cancel_requested(&self) -> bool {
        self.status.load(Ordering::SeqCst) == CANCELLING
    }

    /// Snapshot the ambient context, for callers bracketing their own
    /// indexing sequences.
    pub fn save_state(&self) -> Result<ContextToken, IndexerError> {
        self.indexer.context_manager().snapshot()
    }

    /// Put back a context saved with [`save_state`](Self::save_state).
    pub fn restore_state(&self, token: &ContextToken) -> Result<(), IndexerError> {
        self.indexer.context_manager().restore(token)
    }

    /// Run `operation` inside one cache scope shared by every indexing call
    /// it makes; the scope is closed on every exit path.
    pub async fn perform_cached_operation<F, Fut, T>(&self, operation: F) -> Result<T, IndexerError>
    where
        F: FnOnce(CacheScope) -> Fut,
        Fut: Future<Output = Result<T, IndexerError>>,
    {
        with_cache_scope(operation).await
    }

    /// See [`IncrementalIndexer::build_incremental_index`].
    pub async fn build_incremental_index(
        &self,
        page: usize,
        page_size: usize,
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        self.indexer
            .build_incremental_index(page, page_size, use_shadow)
            .await
    }

    /// See [`IncrementalIndexer::build_incremental_product_index`].
    pub async fn build_incremental_product_index(
        &self,
        products: &[CatalogEntity],
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        self.indexer
            .build_incremental_product_index(products, use_shadow)
            .await
    }

    /// See [`IncrementalIndexer::build_incremental_sku_index`].
    pub async fn build_incremental_sku_index(
        &self,
        skus: &[CatalogEntity],
        use_shadow: bool,
    ) -> Result<IncrementalSummary, IndexerError> {
        self.indexer
            .build_incremental_sku_index(skus, use_shadow)
            .await
    }

    /// Commit with the configured defaults; a no-op when commits are disabled.
    pub async fn commit(&self, destination: &dyn IndexDestination) -> Result<(), IndexerError> {
        self.commits.commit(destination).await
    }

    /// Commit with explicit options, regardless of configuration.
    pub async fn commit_with(
        &self,
        destination: &dyn IndexDestination,
        soft: bool,
        wait_searcher: bool,
        wait_flush: bool,
    ) -> Result<(), IndexerError> {
        let options = CommitOptions {
            soft,
            wait_searcher,
            wait_flush,
        };
        self.commits.commit_with(destination, options).await
    }

    /// Force merge a destination. Expensive; see
    /// [`CommitController::optimize_index`].
    pub async fn optimize_index(&self, destination: &dyn IndexDestination) -> Result<(), IndexerError> {
        self.commits.optimize_index(destination).await
    }

    /// Every locale known to the locale collaborator.
    pub async fn all_locales(&self) -> Result<Vec<Locale>, IndexerError> {
        self.indexer.all_locales().await
    }

    /// Emit documents at trace level.
    pub fn log_documents(&self, documents: &[IndexDocument]) {
        self.indexer.builder().log_documents(documents);
    }

    fn set_phase(&self, phase: RebuildPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }
}
