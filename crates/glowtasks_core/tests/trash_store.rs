mod support;

use glowtasks_core::{StoreError, TaskId};
use support::FakeBackend;

#[tokio::test]
async fn restore_moves_selected_tasks_back() {
    let backend = FakeBackend::new();
    let (client, _ticks) = support::signed_in(&backend, "ada");
    for title in ["one", "two", "three"] {
        backend.seed_task("ada", title);
    }
    client.tasks.load().await.unwrap();
    for label in ["1", "2"] {
        let id = client.tasks.find_id(label).unwrap();
        client.tasks.delete(&id).await.unwrap();
    }
    client.trash.load().await.unwrap();
    assert_eq!(client.trash.len(), 2);

    let first = client.trash.find_id("1").unwrap();
    assert!(client.trash.select(&first));
    assert!(!client.trash.select(&first));
    assert_eq!(client.trash.restore_selected(&client.tasks).await.unwrap(), 1);

    assert_eq!(client.trash.len(), 1);
    assert!(client.trash.selected().is_empty());
    assert!(client.tasks.get(&first).is_some());
    assert!(client.trash.get(&first).is_none());
    assert_eq!(client.tasks.len(), 2);
    assert_eq!(
        backend.requests().last().unwrap().path,
        "/api/trash",
        "trash reload comes last"
    );
}

#[tokio::test]
async fn restored_task_is_in_exactly_one_collection() {
    let backend = FakeBackend::new();
    let (client, _ticks) = support::signed_in(&backend, "ada");
    backend.seed_task("ada", "only");
    client.tasks.load().await.unwrap();
    let id = TaskId::number(1);
    client.tasks.delete(&id).await.unwrap();
    client.trash.load().await.unwrap();

    client.trash.toggle_selection(&id);
    client.trash.restore_selected(&client.tasks).await.unwrap();

    let in_tasks = client.tasks.get(&id).is_some();
    let in_trash = client.trash.get(&id).is_some();
    assert!(in_tasks ^ in_trash);
}

#[tokio::test]
async fn empty_selection_sends_nothing() {
    let backend = FakeBackend::new();
    let (client, _ticks) = support::signed_in(&backend, "ada");

    assert_eq!(client.trash.restore_selected(&client.tasks).await.unwrap(), 0);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn selection_only_accepts_cached_ids_and_resets_on_load() {
    let backend = FakeBackend::new();
    let (client, _ticks) = support::signed_in(&backend, "ada");
    backend.seed_task("ada", "gone");
    client.tasks.load().await.unwrap();
    let id = TaskId::number(1);

    assert!(!client.trash.select(&id));

    client.tasks.delete(&id).await.unwrap();
    client.trash.load().await.unwrap();
    assert!(client.trash.toggle_selection(&id));
    assert!(client.trash.is_selected(&id));
    assert!(!client.trash.toggle_selection(&id));
    assert!(client.trash.select(&id));

    client.trash.load().await.unwrap();
    assert!(client.trash.selected().is_empty());
}

#[tokio::test]
async fn failed_restore_keeps_selection_and_reports() {
    let backend = FakeBackend::new();
    let (client, _ticks) = support::signed_in(&backend, "ada");
    backend.seed_task("ada", "stuck");
    client.tasks.load().await.unwrap();
    let id = TaskId::number(1);
    client.tasks.delete(&id).await.unwrap();
    client.trash.load().await.unwrap();
    client.trash.select(&id);

    backend.fail_next(500, "");
    let err = client
        .trash
        .restore_selected(&client.tasks)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Api(_)));
    assert_eq!(client.trash.selected(), vec![id]);
    assert_eq!(client.trash.last_error().as_deref(), Some("Could not restore"));
}

#[tokio::test]
async fn completed_task_keeps_its_state_through_trash() {
    let backend = FakeBackend::new();
    let (client, _ticks) = support::signed_in(&backend, "ada");

    let task = client.tasks.add("Buy milk", "").await.unwrap().unwrap();
    client.tasks.toggle(&task.id).await.unwrap();
    client.tasks.delete(&task.id).await.unwrap();
    client.trash.load().await.unwrap();
    assert!(client.trash.get(&task.id).unwrap().task.completed);

    client.trash.select(&task.id);
    client.trash.restore_selected(&client.tasks).await.unwrap();

    let restored = client.tasks.get(&task.id).unwrap();
    assert_eq!(restored.title, "Buy milk");
    assert!(restored.completed);
    assert!(client.trash.is_empty());
}

#[tokio::test]
async fn task_reload_failure_after_restore_still_reports_success() {
    let backend = FakeBackend::new();
    let (client, _ticks) = support::signed_in(&backend, "ada");
    backend.seed_task("ada", "back again");
    backend.seed_task("ada", "still binned");
    client.tasks.load().await.unwrap();
    for id in [TaskId::number(1), TaskId::number(2)] {
        client.tasks.delete(&id).await.unwrap();
    }
    client.trash.load().await.unwrap();
    let restored = TaskId::number(1);
    client.trash.select(&restored);

    backend.fail_call("GET /api/tasks", 500, "");
    let count = client.trash.restore_selected(&client.tasks).await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(client.trash.last_error(), None);
    assert!(client.trash.selected().is_empty());
    assert!(client.trash.get(&restored).is_none());
    assert!(client.trash.get(&TaskId::number(2)).is_some());
    assert_eq!(
        client.tasks.last_error().as_deref(),
        Some("Could not load tasks")
    );
    let calls = backend.calls();
    assert!(calls.contains(&"POST /api/trash/restore".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("GET /api/trash"));

    client.tasks.load().await.unwrap();
    assert!(client.tasks.get(&restored).is_some());
}
