use super::*;
use shared::error::StoreOperation;

use crate::{
    memory_store::MemoryRecordStore,
    test_support::{display_ids, fields, record, ScriptedStore},
};

fn coordinator(store: Arc<ScriptedStore>) -> Arc<RecordsCoordinator> {
    RecordsCoordinator::new(store, RefreshPolicy::default())
}

#[tokio::test]
async fn load_publishes_records_in_display_order() {
    let store = Arc::new(ScriptedStore::with_records(vec![record(1, "Ann"), record(2, "Bo"), record(3, "Cy")]));
    let coordinator = coordinator(store);
    let mut rx = coordinator.subscribe_events();

    assert!(coordinator.load().await.is_applied());

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        if let RecordsEvent::RecordsChanged { records, loading } = event {
            last = Some((display_ids(&records), loading));
        }
    }
    assert_eq!(last, Some((vec![1, 2, 3], false)));
}

#[tokio::test]
async fn create_then_refresh_appends_next_display_id() {
    let store = Arc::new(ScriptedStore::with_records(vec![record(1, "Ann"), record(2, "Bo"), record(3, "Cy")]));
    let coordinator = coordinator(Arc::clone(&store));
    coordinator.load().await;

    coordinator.submit(&fields("A")).await.expect("submit");

    let snapshot = coordinator.snapshot().await;
    assert_eq!(display_ids(&snapshot.records), vec![1, 2, 3, 4]);
    assert_eq!(snapshot.records[3].name, "A");
    assert_eq!(coordinator.edit_state().await, EditState::Create);
}

#[tokio::test]
async fn deleting_the_edit_target_returns_to_create() {
    let store = Arc::new(ScriptedStore::with_records(vec![record(1, "Ann"), record(2, "Bo")]));
    let coordinator = coordinator(Arc::clone(&store));
    coordinator.load().await;
    coordinator.request_edit(record(2, "Bo")).await;
    let mut rx = coordinator.subscribe_events();

    coordinator
        .delete_record(&RecordId::new("rec-2"))
        .await
        .expect("delete");

    assert_eq!(coordinator.edit_state().await, EditState::Create);
    assert_eq!(display_ids(&coordinator.snapshot().await.records), vec![1]);
    assert!(matches!(rx.try_recv(), Ok(RecordsEvent::EditCleared)));
    assert!(matches!(rx.try_recv(), Ok(RecordsEvent::DeleteCompleted(id)) if id.as_str() == "rec-2"));
}

#[tokio::test]
async fn deleting_another_record_keeps_edit_target() {
    let store = Arc::new(ScriptedStore::with_records(vec![record(1, "Ann"), record(2, "Bo")]));
    let coordinator = coordinator(Arc::clone(&store));
    coordinator.load().await;
    coordinator.request_edit(record(2, "Bo")).await;

    coordinator
        .delete_record(&RecordId::new("rec-1"))
        .await
        .expect("delete");

    assert_eq!(coordinator.edit_state().await, EditState::Editing(record(2, "Bo")));
    assert_eq!(display_ids(&coordinator.snapshot().await.records), vec![2]);
}

#[tokio::test]
async fn failed_delete_is_reported_without_refresh() {
    let store = Arc::new(ScriptedStore::with_records(vec![record(1, "Ann")]));
    let coordinator = coordinator(Arc::clone(&store));
    coordinator.load().await;
    coordinator.request_edit(record(1, "Ann")).await;
    let fetches_before = store.fetch_calls();
    store.fail(StoreOperation::Delete);
    let mut rx = coordinator.subscribe_events();

    let failure = coordinator
        .delete_record(&RecordId::new("rec-1"))
        .await
        .expect_err("delete fails");

    assert_eq!(failure.operation, StoreOperation::Delete);
    assert_eq!(store.delete_calls(), 1);
    assert_eq!(store.fetch_calls(), fetches_before);
    assert!(coordinator.edit_state().await.is_editing());
    assert!(matches!(rx.try_recv(), Ok(RecordsEvent::DeleteFailed { id, .. }) if id.as_str() == "rec-1"));
}

#[tokio::test]
async fn switching_targets_mid_edit_is_last_pick_wins() {
    let store = Arc::new(ScriptedStore::with_records(vec![record(1, "Ann"), record(2, "Bo")]));
    let coordinator = coordinator(store);
    coordinator.load().await;

    coordinator.request_edit(record(1, "Ann")).await;
    coordinator.request_edit(record(2, "Bo")).await;

    let state = coordinator.edit_state().await;
    assert_eq!(state.target().map(|r| r.id.as_str()), Some("rec-2"));
    assert_eq!(state.draft().name, "Bo");
}

#[tokio::test]
async fn full_session_against_memory_store() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let coordinator = RecordsCoordinator::new(store, RefreshPolicy::LatestIssuedWins);
    coordinator.load().await;
    assert!(coordinator.snapshot().await.is_empty());

    coordinator.submit(&fields("Ann")).await.expect("create ann");
    coordinator.submit(&fields("Bo")).await.expect("create bo");
    let snapshot = coordinator.snapshot().await;
    assert_eq!(display_ids(&snapshot.records), vec![1, 2]);

    let bo = snapshot.records[1].clone();
    coordinator.request_edit(bo.clone()).await;
    let mut draft = coordinator.edit_state().await.draft();
    draft.phone = "555-0777".to_string();
    coordinator.submit(&draft).await.expect("update bo");

    let snapshot = coordinator.snapshot().await;
    let updated = snapshot.find(&bo.id).expect("bo still present");
    assert_eq!(updated.phone, "555-0777");
    assert_eq!(updated.display_id, bo.display_id);
    assert_eq!(coordinator.edit_state().await, EditState::Create);

    coordinator.delete_record(&bo.id).await.expect("delete bo");
    assert_eq!(display_ids(&coordinator.snapshot().await.records), vec![1]);
}

#[tokio::test]
async fn deleting_an_edit_target_already_removed_elsewhere_returns_to_create() {
    let store = Arc::new(ScriptedStore::with_records(vec![record(1, "Ann"), record(2, "Bo")]));
    let coordinator = coordinator(Arc::clone(&store));
    coordinator.load().await;
    coordinator.request_edit(record(2, "Bo")).await;
    let id = RecordId::new("rec-2");
    store.delete(&id).await.expect("removed by another client");
    let fetches_before = store.fetch_calls();

    coordinator.delete_record(&id).await.expect("delete of absent id");

    assert_eq!(coordinator.edit_state().await, EditState::Create);
    assert_eq!(store.fetch_calls() - fetches_before, 1);
    assert_eq!(display_ids(&coordinator.snapshot().await.records), vec![1]);
}
