//! Integration tests for the sweep controller against an in-memory store

mod common;

use common::{InMemoryDocumentStore, RecordingListener};
use docsweep_core::{
    AllowedTypes, Invocation, PrunePolicy, Rejection, SearchRequest, StoreError, SweepConfig,
    StatusLevel, SweepController, TypeChoice, state::Phase,
};
use std::sync::Arc;
use std::time::Duration;

fn controller(
    store: &InMemoryDocumentStore,
    config: SweepConfig,
) -> (SweepController, Arc<RecordingListener>) {
    let listener = Arc::new(RecordingListener::default());
    let controller =
        SweepController::new(Arc::new(store.clone()), config).with_listener(listener.clone());
    (controller, listener)
}

fn search_all(term: &str) -> SearchRequest {
    SearchRequest::term(TypeChoice::All, term)
}

#[tokio::test]
async fn test_twenty_five_documents_in_batches_of_ten() {
    let store = InMemoryDocumentStore::with_posts(25);
    let (controller, listener) = controller(&store, SweepConfig::default());

    assert_eq!(controller.search(&search_all("post")).await, Invocation::Completed(25));
    assert_eq!(controller.select_all().await, 25);

    let outcome = controller.delete_selected().await.completed().unwrap();
    assert_eq!(outcome.deleted, 25);
    assert!(outcome.errors.is_empty());

    let calls = store.delete_calls();
    assert_eq!(calls.iter().map(Vec::len).collect::<Vec<_>>(), vec![10, 10, 5]);
    assert_eq!(calls[0][0], "post.0");
    assert_eq!(calls[1][0], "post.10");
    assert_eq!(calls[2][4], "post.24");
    assert_eq!(store.remaining(), 0);

    assert_eq!(listener.outcomes(), vec![outcome]);
    let state = controller.snapshot().await;
    assert!(state.results().is_empty());
    assert!(state.selection().is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_middle_batch_failure_continues_run() {
    let store = InMemoryDocumentStore::with_posts(30).fail_batch(2);
    let (controller, listener) = controller(&store, SweepConfig::default());

    controller.search(&search_all("post")).await;
    controller.select_all().await;
    let outcome = controller.delete_selected().await.completed().unwrap();

    assert_eq!(store.delete_calls().len(), 3);
    assert_eq!(outcome.deleted, 20);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Batch 2 failed"));
    assert!(outcome.errors[0].contains("409"));
    assert_eq!(listener.outcomes().len(), 1);
    assert!(listener.errors().is_empty());

    // default policy drops failed rows from the list as well
    assert!(controller.snapshot().await.results().is_empty());
    assert_eq!(store.remaining(), 10);
}

#[tokio::test]
async fn test_succeeded_only_policy_keeps_failed_rows_visible() {
    let store = InMemoryDocumentStore::with_posts(30).fail_batch(2);
    let config = SweepConfig::default().with_prune_policy(PrunePolicy::SucceededOnly);
    let (controller, _) = controller(&store, config);

    controller.search(&search_all("post")).await;
    controller.select_all().await;
    controller.delete_selected().await;

    let state = controller.snapshot().await;
    let ids: Vec<&str> = state.results().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 10);
    assert_eq!(ids[0], "post.10");
    assert_eq!(ids[9], "post.19");
}

#[tokio::test]
async fn test_preview_never_writes() {
    for batch_size in [1, 3, 10, 50] {
        let store = InMemoryDocumentStore::with_posts(17);
        let config = SweepConfig::default()
            .with_preview_only(true)
            .with_batch_size(batch_size)
            .unwrap();
        let (controller, listener) = controller(&store, config);

        controller.search(&search_all("post")).await;
        controller.select_all().await;
        let outcome = controller.delete_selected().await.completed().unwrap();

        assert_eq!(outcome.deleted, 17);
        assert!(outcome.errors.is_empty());
        assert!(store.delete_calls().is_empty());
        assert_eq!(store.remaining(), 17);
        assert_eq!(listener.outcomes().len(), 1);

        let status = controller.snapshot().await.status().cloned().unwrap();
        assert!(status.text.starts_with("Preview complete"));
    }
}

#[tokio::test]
async fn test_blank_search_issues_no_read() {
    let store = InMemoryDocumentStore::with_posts(3);
    let (controller, listener) = controller(&store, SweepConfig::default());

    controller.search(&search_all("post")).await;
    controller.toggle("post.1").await;

    let result = controller.search(&search_all("   ")).await;
    assert_eq!(result, Invocation::Rejected(Rejection::BlankSearch));
    assert_eq!(store.queries().len(), 1);

    let state = controller.snapshot().await;
    assert_eq!(state.results().len(), 3);
    assert!(state.selection().contains("post.1"));
    assert!(listener.errors().is_empty());
}

#[tokio::test]
async fn test_blank_custom_query_issues_no_read() {
    let store = InMemoryDocumentStore::with_posts(3);
    let (controller, _listener) = controller(&store, SweepConfig::default());

    let result = controller.search(&SearchRequest::custom("   ")).await;
    assert_eq!(result, Invocation::Rejected(Rejection::BlankSearch));
    assert!(store.queries().is_empty());
    assert!(controller.snapshot().await.results().is_empty());
}

#[tokio::test]
async fn test_search_failure_reports_and_preserves_results() {
    let store = InMemoryDocumentStore::with_posts(3);
    let (controller, listener) = controller(&store, SweepConfig::default());

    controller.search(&search_all("post")).await;
    controller.toggle("post.0").await;

    store.fail_fetch(StoreError::Rejected {
        status_code: 400,
        message: "expected ']'".to_string(),
    });
    let result = controller.search(&SearchRequest::custom("*[broken")).await;
    assert_eq!(result, Invocation::Failed);

    let errors = listener.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Search failed"));

    let state = controller.snapshot().await;
    assert_eq!(state.results().len(), 3);
    assert!(state.selection().contains("post.0"));
    assert_eq!(state.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_custom_query_is_sent_verbatim() {
    let store = InMemoryDocumentStore::with_posts(1);
    let (controller, _) = controller(&store, SweepConfig::default());

    let custom = "*[_type == \"post\" && !defined(slug)]";
    controller.search(&SearchRequest::custom(custom)).await;
    assert_eq!(store.queries(), vec![custom.to_string()]);
}

#[tokio::test]
async fn test_all_types_without_known_types_sends_text_condition_only() {
    let store = InMemoryDocumentStore::with_posts(1);
    let (controller, _) = controller(&store, SweepConfig::default());

    assert!(controller.load_types().await.is_empty());
    controller.search(&search_all("acme")).await;

    let query = &store.queries()[0];
    assert!(query.starts_with("*[(title match \"*acme*\""));
    assert!(!query.contains("_type in") && !query.contains("_type =="));
    assert!(query.contains("[0...100]"));
}

#[tokio::test]
async fn test_discovered_types_skip_system_types() {
    let store = InMemoryDocumentStore::with_posts(1).with_types(&[
        "post",
        "system.group",
        "author",
        "sanity.imageAsset",
        "post",
    ]);
    let (controller, _) = controller(&store, SweepConfig::default());

    assert_eq!(controller.load_types().await, vec!["author", "post"]);

    controller.search(&search_all("x")).await;
    assert!(store.queries()[0].starts_with("*[_type in [\"author\", \"post\"] && "));
}

#[tokio::test]
async fn test_allow_list_is_used_without_discovery() {
    let store = InMemoryDocumentStore::with_posts(1)
        .fail_types(StoreError::Transport("should not be called".to_string()));
    let config = SweepConfig::default()
        .with_allowed_types(AllowedTypes::only(["post", "page"]).unwrap());
    let (controller, listener) = controller(&store, config);

    assert_eq!(controller.load_types().await, vec!["post", "page"]);
    assert!(listener.errors().is_empty());

    let refused = controller
        .search(&SearchRequest::term(TypeChoice::Specific("user".to_string()), "x"))
        .await;
    assert_eq!(refused, Invocation::Rejected(Rejection::TypeNotAllowed));
    assert!(store.queries().is_empty());
}

#[tokio::test]
async fn test_type_discovery_failure_is_reported() {
    let store = InMemoryDocumentStore::with_posts(1).fail_types(StoreError::Rejected {
        status_code: 401,
        message: "Unauthorized".to_string(),
    });
    let (controller, listener) = controller(&store, SweepConfig::default());

    assert!(controller.load_types().await.is_empty());
    let errors = listener.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Type discovery failed"));

    // still usable afterwards
    assert_eq!(controller.search(&search_all("post")).await, Invocation::Completed(1));
}

#[tokio::test]
async fn test_delete_without_selection_is_rejected() {
    let store = InMemoryDocumentStore::with_posts(2);
    let (controller, listener) = controller(&store, SweepConfig::default());

    controller.search(&search_all("post")).await;
    assert!(controller.pending_delete().await.is_none());
    assert_eq!(
        controller.delete_selected().await,
        Invocation::Rejected(Rejection::NothingSelected)
    );
    assert!(store.delete_calls().is_empty());
    assert!(listener.outcomes().is_empty());
}

#[tokio::test]
async fn test_pending_delete_describes_the_run() {
    let store = InMemoryDocumentStore::with_posts(12);
    let config = SweepConfig::default().with_batch_size(5).unwrap();
    let (controller, _) = controller(&store, config);

    controller.search(&search_all("post")).await;
    controller.select_all().await;

    let plan = controller.pending_delete().await.unwrap();
    assert_eq!(plan.ids.len(), 12);
    assert_eq!(plan.chunk_count(), 3);
    assert!(!plan.preview);
    assert_eq!(controller.snapshot().await.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_invocations_while_deleting_are_ignored() {
    let (store, gate) = InMemoryDocumentStore::with_posts(4).gated();
    let config = SweepConfig::default().with_batch_size(2).unwrap();
    let (controller, listener) = controller(&store, config);
    let controller = Arc::new(controller);

    controller.search(&search_all("post")).await;
    controller.select_all().await;

    let running = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.delete_selected().await })
    };

    while store.delete_calls().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.snapshot().await.phase(), Phase::Deleting);

    assert_eq!(
        controller.search(&search_all("post")).await,
        Invocation::Rejected(Rejection::Busy)
    );
    assert_eq!(
        controller.delete_selected().await,
        Invocation::Rejected(Rejection::Busy)
    );
    assert!(!controller.toggle("post.0").await);
    assert_eq!(store.queries().len(), 1);

    gate.notify_one();
    while store.delete_calls().len() < 2 {
        tokio::task::yield_now().await;
    }
    gate.notify_one();

    let outcome = running.await.unwrap().completed().unwrap();
    assert_eq!(outcome.deleted, 4);
    assert_eq!(store.delete_calls().len(), 2);
    assert_eq!(listener.outcomes().len(), 1);
    assert_eq!(controller.snapshot().await.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_dropped_delete_run_returns_to_idle() {
    let (store, _gate) = InMemoryDocumentStore::with_posts(4).gated();
    let (controller, _listener) = controller(&store, SweepConfig::default());

    controller.search(&search_all("post")).await;
    controller.select_all().await;

    let dropped =
        tokio::time::timeout(Duration::from_millis(50), controller.delete_selected()).await;
    assert!(dropped.is_err());
    assert_eq!(store.delete_calls().len(), 1);

    let state = controller.snapshot().await;
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.progress().is_none());
    let status = state.status().cloned().unwrap();
    assert_eq!(status.level, StatusLevel::Error);
    assert!(status.text.contains("dropped"));

    assert_eq!(
        controller.search(&search_all("post")).await,
        Invocation::Completed(4)
    );
}
