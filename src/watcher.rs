//! File watcher for the snapshot file.
//!
//! Watches the data directory for changes made by other running instances,
//! reloads the snapshot from disk and folds it into the in-memory store.
//! Uses debouncing to avoid rapid event spam when writers touch the file in
//! multiple operations.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, Debouncer};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::storage::{cleanup_write_registry, should_suppress_event, SNAPSHOT_FILE};
use crate::store::TodoStore;

const DEBOUNCE_DURATION_MS: u64 = 200;

/// Watches the data directory of one store and feeds external snapshot
/// writes back into it.
pub struct StoreFileWatcher {
    /// The debounced watcher instance.
    debouncer: Debouncer<RecommendedWatcher>,
    /// The data directory being watched.
    watched_path: PathBuf,
}

impl StoreFileWatcher {
    /// Creates a new file watcher for the store's data directory.
    pub fn new(store: Arc<TodoStore>) -> Result<Self, notify::Error> {
        let data_dir = store.storage().data_dir().to_path_buf();

        // Ensure the directory exists
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).map_err(|e| {
                notify::Error::generic(&format!("Failed to create data directory: {}", e))
            })?;
        }

        let (tx, rx) = channel::<Result<Vec<DebouncedEvent>, notify::Error>>();

        // Create debounced watcher
        let debouncer = new_debouncer(Duration::from_millis(DEBOUNCE_DURATION_MS), tx)?;

        let watched_path = data_dir.clone();

        // Spawn event handler thread
        std::thread::spawn(move || {
            handle_events(rx, store);
        });

        let mut watcher = Self {
            debouncer,
            watched_path,
        };

        watcher.start()?;

        tracing::info!(
            target: "watcher",
            path = %watcher.watched_path.display(),
            "File watcher started"
        );

        Ok(watcher)
    }

    fn start(&mut self) -> Result<(), notify::Error> {
        self.debouncer
            .watcher()
            .watch(&self.watched_path, RecursiveMode::NonRecursive)
    }

    /// Stops watching the data directory.
    pub fn stop(&mut self) -> Result<(), notify::Error> {
        self.debouncer.watcher().unwatch(&self.watched_path)
    }
}

/// Handles debounced file events and folds external snapshots into the store.
fn handle_events(rx: Receiver<Result<Vec<DebouncedEvent>, notify::Error>>, store: Arc<TodoStore>) {
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                for event in events {
                    process_event(&event, &store);
                }
            }
            Ok(Err(e)) => {
                tracing::error!(
                    target: "watcher",
                    error = %e,
                    "Watcher error"
                );
            }
            Err(_) => {
                // Channel closed, watcher was dropped
                tracing::info!(
                    target: "watcher",
                    "Watcher channel closed, stopping event handler"
                );
                break;
            }
        }
    }
}

/// Processes a single file event: reloads the snapshot and folds it in.
fn process_event(event: &DebouncedEvent, store: &Arc<TodoStore>) {
    // Clean up expired write records periodically
    cleanup_write_registry();

    let path = &event.path;

    // Only the snapshot file matters; logs and unrelated files are ignored
    if path.file_name().map_or(true, |name| name != SNAPSHOT_FILE) {
        return;
    }

    // Check if this is a self-write that should be suppressed
    if should_suppress_event(path) {
        tracing::debug!(
            target: "watcher",
            path = %path.display(),
            "Event suppressed (self-write)"
        );
        return;
    }

    tracing::debug!(
        target: "watcher",
        path = %path.display(),
        "Snapshot changed (external write)"
    );

    match store.storage().load_with_retry() {
        Ok(Some(snapshot)) => {
            store.apply_external_snapshot(snapshot);
        }
        Ok(None) => {
            // File was deleted; keep the in-memory state
            tracing::debug!(
                target: "watcher",
                "Snapshot file removed, keeping in-memory state"
            );
        }
        Err(e) => {
            tracing::error!(
                target: "watcher",
                error = %e,
                "Failed to reload snapshot after retries"
            );
        }
    }
}

/// Thread-safe wrapper for managing the store file watcher.
pub struct WatcherState {
    watcher: Mutex<Option<StoreFileWatcher>>,
}

impl WatcherState {
    pub fn new() -> Self {
        Self {
            watcher: Mutex::new(None),
        }
    }

    /// Starts the file watcher if not already running.
    pub fn start(&self, store: Arc<TodoStore>) -> Result<(), String> {
        let mut guard = self.watcher.lock().map_err(|e| e.to_string())?;

        if guard.is_some() {
            tracing::debug!(
                target: "watcher",
                "Watcher already running"
            );
            return Ok(());
        }

        let watcher = StoreFileWatcher::new(store).map_err(|e| e.to_string())?;
        *guard = Some(watcher);

        Ok(())
    }

    /// Stops the file watcher if running.
    pub fn stop(&self) -> Result<(), String> {
        let mut guard = self.watcher.lock().map_err(|e| e.to_string())?;

        if let Some(mut watcher) = guard.take() {
            watcher.stop().map_err(|e| e.to_string())?;
            tracing::info!(
                target: "watcher",
                "File watcher stopped"
            );
        }

        Ok(())
    }

    /// Returns true if the watcher is currently running.
    pub fn is_running(&self) -> bool {
        self.watcher
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

impl Default for WatcherState {
    fn default() -> Self {
        Self::new()
    }
}
