//! Integration tests for the todo store: staged async commands, persistence
//! across instances, change notifications, and the cross-instance file
//! watcher.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use taskdeck::{
    Action, Snapshot, Storage, Todo, TodoDraft, TodoPatch, TodoStore, WatcherState,
    DEFAULT_FOLDER_ID,
};

/// Helper to create a draft with just a title.
fn draft(title: &str) -> TodoDraft {
    TodoDraft {
        title: title.to_string(),
        ..TodoDraft::default()
    }
}

/// Helper to build a todo the way another running instance would.
fn external_todo(title: &str) -> Todo {
    let now = Utc::now();
    Todo {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: String::new(),
        folder_id: DEFAULT_FOLDER_ID.to_string(),
        tags: Vec::new(),
        completed: false,
        created_at: now,
        updated_at: now,
    }
}

fn temp_store() -> (tempfile::TempDir, Arc<TodoStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = TodoStore::init(Storage::new(dir.path()));
    (dir, store)
}

// =============================================================================
// Staged async commands
// =============================================================================

#[tokio::test(start_paused = true)]
async fn add_todo_sets_and_clears_creating_flag() {
    let (_dir, store) = temp_store();

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.add_todo(draft("Test")).await }
    });

    // Partway through the staging delay the flag is up and nothing landed yet
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.loading().creating);
    assert!(store.todos().is_empty());

    task.await.unwrap();

    assert!(!store.loading().creating);
    let todos = store.todos();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Test");
}

#[tokio::test(start_paused = true)]
async fn delete_todo_carries_the_id_while_staged() {
    let (_dir, store) = temp_store();
    store.dispatch(Action::AddTodo(draft("Doomed")));
    let id = store.todos()[0].id.clone();

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        let id = id.clone();
        async move { store.delete_todo(id).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.loading().deleting.as_deref(), Some(id.as_str()));

    task.await.unwrap();

    assert!(store.loading().deleting.is_none());
    assert!(store.todos().is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_deletes_both_remove_their_todos() {
    let (_dir, store) = temp_store();
    store.dispatch(Action::AddTodo(draft("First")));
    store.dispatch(Action::AddTodo(draft("Second")));
    let ids: Vec<String> = store.todos().iter().map(|t| t.id.clone()).collect();

    tokio::join!(store.delete_todo(ids[0].clone()), store.delete_todo(ids[1].clone()));

    assert!(store.todos().is_empty());
    assert!(store.loading().deleting.is_none());
}

#[tokio::test(start_paused = true)]
async fn concurrent_adds_share_the_flag_but_both_land() {
    let (_dir, store) = temp_store();

    tokio::join!(store.add_todo(draft("One")), store.add_todo(draft("Two")));

    assert!(!store.loading().creating);
    assert_eq!(store.todos().len(), 2);
}

// =============================================================================
// Persistence and notifications
// =============================================================================

#[tokio::test(start_paused = true)]
async fn staged_creation_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = TodoStore::init(Storage::new(dir.path()));
        store.add_todo(draft("Durable")).await;
    }

    let reopened = TodoStore::init(Storage::new(dir.path()));
    let todos = reopened.todos();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Durable");
}

#[tokio::test]
async fn update_refreshes_timestamp_and_persists() {
    let (dir, store) = temp_store();
    store.dispatch(Action::AddTodo(draft("Track me")));
    let id = store.todos()[0].id.clone();

    store.update_todo(
        id,
        TodoPatch {
            completed: Some(true),
            ..TodoPatch::default()
        },
    );

    let reopened = TodoStore::init(Storage::new(dir.path()));
    let todo = &reopened.todos()[0];
    assert!(todo.completed);
    assert!(todo.updated_at >= todo.created_at);
}

#[tokio::test]
async fn subscribers_see_each_written_snapshot() {
    let (_dir, store) = temp_store();
    let mut events = store.subscribe();

    store.dispatch(Action::AddTodo(draft("Announced")));

    let snapshot = events.recv().await.unwrap();
    let todos = snapshot.todos.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Announced");
}

#[tokio::test]
async fn external_folds_are_rebroadcast_locally() {
    let (_dir, store) = temp_store();
    let mut events = store.subscribe();

    store.apply_external_snapshot(Snapshot {
        todos: Some(vec![external_todo("From elsewhere")]),
        folders: None,
    });

    let snapshot = events.recv().await.unwrap();
    assert_eq!(snapshot.todos.unwrap()[0].title, "From elsewhere");
    assert_eq!(store.todos()[0].title, "From elsewhere");
}

#[test]
fn snapshot_round_trip_reproduces_the_pair() {
    let (_dir, store) = temp_store();
    store.dispatch(Action::AddTodo(draft("Round trip")));
    let snapshot = store.snapshot();

    let encoded = serde_json::to_string(&snapshot).unwrap();
    let decoded: Snapshot = serde_json::from_str(&encoded).unwrap();

    let (other_dir, other) = temp_store();
    let _ = other_dir;
    other.dispatch(Action::LoadSnapshot(decoded));

    assert_eq!(other.todos(), store.todos());
    assert_eq!(other.folders(), store.folders());
}

// =============================================================================
// Cross-instance watcher
// =============================================================================

fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let end = std::time::Instant::now() + deadline;
    while std::time::Instant::now() < end {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}

#[test]
fn watcher_folds_in_external_writes() {
    let (dir, store) = temp_store();
    let watcher = WatcherState::new();
    watcher.start(Arc::clone(&store)).unwrap();

    // Simulate another instance writing the snapshot file directly, which
    // bypasses this instance's self-write suppression registry.
    let snapshot = Snapshot {
        todos: Some(vec![external_todo("From another tab")]),
        folders: None,
    };
    std::fs::write(
        dir.path().join("todos.json"),
        serde_json::to_string_pretty(&snapshot).unwrap(),
    )
    .unwrap();

    let converged = wait_until(Duration::from_secs(5), || {
        store.todos().iter().any(|t| t.title == "From another tab")
    });
    assert!(converged, "watcher never folded in the external write");

    watcher.stop().unwrap();
    assert!(!watcher.is_running());
}

#[test]
fn malformed_external_payload_is_dropped() {
    let (dir, store) = temp_store();
    store.dispatch(Action::AddTodo(draft("Keep me")));

    let watcher = WatcherState::new();
    watcher.start(Arc::clone(&store)).unwrap();

    std::thread::sleep(Duration::from_millis(400));
    std::fs::write(dir.path().join("todos.json"), "{ not json at all").unwrap();

    // Give the watcher time to debounce, retry and give up
    std::thread::sleep(Duration::from_millis(1500));

    let todos = store.todos();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Keep me");

    watcher.stop().unwrap();
}
