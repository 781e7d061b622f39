//! End-to-end tests of the full rebuild against in-memory collaborators.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use catalog_indexer::{IndexerError, RebuildPhase};
use catalog_indexer_shared::{EntityFilter, EntityKind, IndexDocument, Locale, OperationContext};
use serde_json::json;

use common::{destinations, orchestrator, page_size, snapshot, GatedCatalog};

#[tokio::test]
async fn test_rebuild_pages_commits_and_swaps() {
    let (primary, shadow, roles) = destinations();
    let orchestrator = orchestrator(Arc::new(snapshot(25)), roles.clone(), page_size(10));

    let summary = orchestrator.rebuild_index().await.unwrap();

    assert_eq!(summary.entity_kind, EntityKind::Product);
    assert_eq!(summary.total_entities, 25);
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.submitted, 25);
    assert_eq!(summary.skipped, 0);
    assert!(summary.finished_at >= summary.started_at);

    // Pages arrive in order, and every entity exactly once.
    assert_eq!(shadow.batches(), vec![10, 10, 5]);
    let expected: Vec<String> = (1..=25).map(|i| i.to_string()).collect();
    assert_eq!(shadow.ids(), expected);

    assert_eq!(shadow.commit_count(), 1);
    assert_eq!(shadow.promotions.load(Ordering::SeqCst), 1);
    assert!(primary.ids().is_empty());
    assert_eq!(roles.primary().name(), "catalog_b");
    assert_eq!(roles.shadow().name(), "catalog_a");
}

#[tokio::test]
async fn test_rebuilt_documents_have_expected_shape() {
    let (_primary, shadow, roles) = destinations();
    let orchestrator = orchestrator(Arc::new(snapshot(1)), roles, page_size(10));

    orchestrator.rebuild_index().await.unwrap();

    let documents = shadow.documents.lock().unwrap();
    let document: &IndexDocument = &documents[0];
    assert_eq!(document.document_id(), "product_1");
    assert_eq!(document.get("name_en_US"), Some(&json!("Product 1")));
    assert_eq!(document.get("name_fr_FR"), Some(&json!("Produit 1")));
    assert_eq!(document.get("price"), Some(&json!(1.0)));
    assert_eq!(document.get("tags"), Some(&json!(["new"])));
    assert_eq!(document.len(), 4);
}

#[tokio::test]
async fn test_price_list_from_ambient_context() {
    let (_primary, shadow, roles) = destinations();
    let orchestrator = orchestrator(Arc::new(snapshot(2)), roles, page_size(10));
    orchestrator
        .indexer()
        .context_manager()
        .apply(OperationContext::default().with_price_list("wholesale"))
        .unwrap();

    orchestrator.rebuild_index().await.unwrap();

    let documents = shadow.documents.lock().unwrap();
    assert_eq!(documents[1].get("price_wholesale"), Some(&json!(1.0)));
    assert!(documents[1].get("price").is_none());
}

#[tokio::test]
async fn test_failed_page_leaves_primary_untouched() {
    let (primary, shadow, roles) = destinations();

    // The live index already serves a previous build.
    let live = vec![IndexDocument::new("old", EntityKind::Product)];
    primary.documents.lock().unwrap().extend(live.clone());

    shadow.fail_on_submit.store(2, Ordering::SeqCst);
    let orchestrator = orchestrator(Arc::new(snapshot(25)), roles.clone(), page_size(10));

    let err = orchestrator.rebuild_index().await.unwrap_err();
    assert!(matches!(err, IndexerError::Service { .. }));
    assert!(matches!(err.root_cause(), IndexerError::IndexBuild { .. }));

    assert_eq!(*primary.documents.lock().unwrap(), live);
    assert_eq!(shadow.batches(), vec![10]);
    assert_eq!(shadow.commit_count(), 0);
    assert_eq!(shadow.promotions.load(Ordering::SeqCst), 0);
    assert_eq!(roles.primary().name(), "catalog_a");
    assert!(!orchestrator.is_reindex_in_process());
}

#[tokio::test]
async fn test_context_restored_on_every_exit() {
    let (primary, _shadow, roles) = destinations();
    let orchestrator = orchestrator(Arc::new(snapshot(5)), roles, page_size(10));

    let ambient = OperationContext {
        locale: Some(Locale::new("fr_FR")),
        price_list: None,
        filter: EntityFilter {
            include_unpublished: true,
            include_archived: false,
        },
    };
    let manager = orchestrator.indexer().context_manager();
    manager.apply(ambient.clone()).unwrap();

    orchestrator.rebuild_index().await.unwrap();
    assert_eq!(manager.current().unwrap(), ambient);

    // "catalog_a" is the shadow now; make its first submit fail.
    assert_eq!(orchestrator.roles().shadow().name(), "catalog_a");
    primary.fail_on_submit.store(1, Ordering::SeqCst);
    assert!(orchestrator.rebuild_index().await.is_err());
    assert_eq!(manager.current().unwrap(), ambient);
}

#[tokio::test]
async fn test_concurrent_rebuild_fails_fast() {
    let catalog = GatedCatalog::new(snapshot(25));
    let (_primary, shadow, roles) = destinations();
    let orchestrator = Arc::new(orchestrator(catalog.clone(), roles.clone(), page_size(10)));

    let running = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.rebuild_index().await }
    });

    // The first rebuild is parked inside its first page fetch.
    catalog.entered.notified().await;
    assert!(orchestrator.is_reindex_in_process());
    assert_eq!(orchestrator.rebuild_phase(), RebuildPhase::Running);

    let second = orchestrator.rebuild_index().await;
    assert!(matches!(second, Err(IndexerError::ConcurrentRebuild)));
    // The rejected caller did not clear the running rebuild's flag.
    assert!(orchestrator.is_reindex_in_process());

    catalog.gate.add_permits(10);
    let summary = running.await.unwrap().unwrap();
    assert_eq!(summary.submitted, 25);
    assert_eq!(shadow.commit_count(), 1);
    assert!(!orchestrator.is_reindex_in_process());
    assert_eq!(orchestrator.rebuild_phase(), RebuildPhase::Idle);
    assert_eq!(roles.primary().name(), "catalog_b");
}

#[tokio::test]
async fn test_cancel_between_pages() {
    let catalog = GatedCatalog::new(snapshot(25));
    let (_primary, shadow, roles) = destinations();
    let orchestrator = Arc::new(orchestrator(catalog.clone(), roles.clone(), page_size(10)));

    let running = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.rebuild_index().await }
    });

    catalog.entered.notified().await;
    assert!(orchestrator.request_cancel());
    catalog.gate.add_permits(10);

    let err = running.await.unwrap().unwrap_err();
    assert!(err.to_string().contains("cancelled"));
    // The page in flight finished; nothing after it ran.
    assert_eq!(shadow.batches(), vec![10]);
    assert_eq!(shadow.promotions.load(Ordering::SeqCst), 0);
    assert_eq!(roles.primary().name(), "catalog_a");
    assert!(!orchestrator.is_reindex_in_process());

    // The next rebuild starts clean.
    let summary = orchestrator.rebuild_index().await.unwrap();
    assert_eq!(summary.submitted, 25);
}

#[tokio::test]
async fn test_incremental_update_to_primary_after_rebuild() {
    let (_primary, shadow, roles) = destinations();
    let orchestrator = orchestrator(Arc::new(snapshot(3)), roles.clone(), page_size(10));

    orchestrator.rebuild_index().await.unwrap();
    // "catalog_b" serves queries now; a direct update lands there.
    let summary = orchestrator.build_incremental_index(0, 2, false).await.unwrap();
    assert_eq!(summary.submitted, 2);
    assert_eq!(shadow.batches(), vec![3, 2]);
    assert_eq!(shadow.commit_count(), 1);

    orchestrator.commit(roles.primary().as_ref()).await.unwrap();
    assert_eq!(shadow.commit_count(), 2);
}
