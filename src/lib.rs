//! Task-list state core: a reducer-driven store with local JSON persistence
//! and cross-instance synchronization over the shared snapshot file.
//!
//! UI layers drive the store through its command API ([`TodoStore`]) and
//! render from the read surface; other running instances sharing the same
//! data directory converge through the file watcher ([`WatcherState`]).

pub mod logging;
pub mod shared;
pub mod storage;
pub mod store;
pub mod watcher;

use std::sync::Arc;

pub use shared::errors::StorageError;
pub use storage::Storage;
pub use store::reducer::Action;
pub use store::types::{
    AppState, Filter, FilterUpdate, Folder, FolderColor, LoadingState, LoadingUpdate, Snapshot,
    Todo, TodoDraft, TodoPatch, DEFAULT_FOLDER_ID,
};
pub use store::TodoStore;
pub use watcher::WatcherState;

/// Initializes a store from the given storage location and starts the file
/// watcher over its data directory. Call [`WatcherState::stop`] (or drop
/// everything) to tear down.
pub fn init_with_watcher(storage: Storage) -> Result<(Arc<TodoStore>, WatcherState), String> {
    let store = TodoStore::init(storage);
    let watcher = WatcherState::new();
    watcher.start(Arc::clone(&store))?;
    Ok((store, watcher))
}
