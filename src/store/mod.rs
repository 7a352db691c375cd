pub mod commands;
pub mod reducer;
pub mod types;
pub mod view;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use crate::storage::Storage;
use reducer::{reduce, Action};
use types::{AppState, Filter, Folder, LoadingState, Snapshot, Todo};

/// Capacity of the local change-notification channel. Lagging subscribers
/// skip to the newest snapshot, which is always a full replacement.
const BROADCAST_CAPACITY: usize = 16;

/// Thread-safe in-memory store with file persistence and change
/// notifications. One instance per running process; other processes sharing
/// the same data directory converge through the file watcher.
pub struct TodoStore {
    state: RwLock<AppState>,
    storage: Storage,
    events: broadcast::Sender<Snapshot>,
}

impl TodoStore {
    /// Builds the store from the persisted snapshot, falling back to the
    /// default state when nothing (readable) is on disk.
    pub fn init(storage: Storage) -> Arc<Self> {
        let mut state = AppState::default();
        if let Some(snapshot) = storage.load() {
            reduce(&mut state, Action::LoadSnapshot(snapshot));
        }

        tracing::info!(
            target: "store",
            "Store initialized: {} todos, {} folders",
            state.todos.len(),
            state.folders.len()
        );

        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        Arc::new(Self {
            state: RwLock::new(state),
            storage,
            events,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap()
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Applies an action, persisting and notifying when it touched the
    /// `{todos, folders}` pair. Persistence failures are logged and the
    /// store continues in memory only.
    pub fn dispatch(&self, action: Action) {
        let persist = action.touches_snapshot();
        let snapshot = {
            let mut state = self.write();
            reduce(&mut state, action);
            persist.then(|| Snapshot::capture(&state))
        };

        if let Some(snapshot) = snapshot {
            match self.storage.save(&snapshot) {
                Ok(()) => {
                    let _ = self.events.send(snapshot);
                }
                Err(e) => {
                    tracing::error!(
                        target: "store",
                        error = %e,
                        "Failed to persist snapshot, continuing in memory"
                    );
                }
            }
        }
    }

    /// Folds a snapshot produced outside this process into the store: a full
    /// replacement, last writer wins. Subscribers are notified so sibling
    /// views converge, but nothing is written back to disk (the snapshot
    /// came from there).
    pub fn apply_external_snapshot(&self, snapshot: Snapshot) {
        {
            let mut state = self.write();
            reduce(&mut state, Action::LoadSnapshot(snapshot.clone()));
        }
        let _ = self.events.send(snapshot);
    }

    /// Receiver for local change notifications, one `Snapshot` per change to
    /// the persisted pair.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.events.subscribe()
    }

    // Read surface

    pub fn todos(&self) -> Vec<Todo> {
        self.read().todos.clone()
    }

    pub fn folders(&self) -> Vec<Folder> {
        self.read().folders.clone()
    }

    pub fn filter(&self) -> Filter {
        self.read().filter.clone()
    }

    pub fn search_query(&self) -> String {
        self.read().search_query.clone()
    }

    pub fn loading(&self) -> LoadingState {
        self.read().loading.clone()
    }

    pub fn filtered_todos(&self) -> Vec<Todo> {
        view::filtered_todos(&self.read())
    }

    pub fn folder_todo_count(&self, folder_id: &str) -> usize {
        view::folder_todo_count(&self.read(), folder_id)
    }

    pub fn all_tags(&self) -> Vec<(String, usize)> {
        view::all_tags(&self.read())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.read())
    }
}
