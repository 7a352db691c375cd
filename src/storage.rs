use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::shared::errors::StorageError;
use crate::shared::paths::{ensure_dir, get_storage_dir};
use crate::store::types::Snapshot;

/// Name of the single snapshot file inside the data directory.
pub const SNAPSHOT_FILE: &str = "todos.json";

/// Duration to suppress watcher events after an internal write.
const WRITE_SUPPRESSION_WINDOW_MS: u64 = 300;

/// Maximum number of retries for JSON parse when the file is mid-write.
const MAX_PARSE_RETRIES: u32 = 3;
/// Backoff duration between parse retries in milliseconds.
const PARSE_RETRY_BACKOFF_MS: u64 = 50;

/// Global registry of recent internal writes (file path -> last write timestamp).
static WRITE_REGISTRY: once_cell::sync::Lazy<Mutex<HashMap<PathBuf, Instant>>> =
    once_cell::sync::Lazy::new(|| Mutex::new(HashMap::new()));

/// Records an internal write for a file path.
/// Called after saving to prevent the watcher from reacting to our own writes.
pub fn record_internal_write(path: &Path) {
    if let Ok(mut registry) = WRITE_REGISTRY.lock() {
        registry.insert(path.to_path_buf(), Instant::now());
        tracing::trace!(
            target: "storage",
            path = %path.display(),
            "Recorded internal write"
        );
    }
}

/// Checks if a file path was recently written by this instance (within the
/// suppression window). Returns true if the event should be suppressed.
pub fn should_suppress_event(path: &Path) -> bool {
    let suppression_window = Duration::from_millis(WRITE_SUPPRESSION_WINDOW_MS);

    if let Ok(mut registry) = WRITE_REGISTRY.lock() {
        if let Some(write_time) = registry.get(path) {
            let elapsed = write_time.elapsed();
            if elapsed < suppression_window {
                tracing::debug!(
                    target: "storage",
                    path = %path.display(),
                    elapsed_ms = elapsed.as_millis(),
                    "Suppressing event for self-write"
                );
                return true;
            }
            // Expired entry, remove it
            registry.remove(path);
        }
    }
    false
}

/// Cleans up expired entries from the write registry.
/// Call periodically to prevent memory buildup.
pub fn cleanup_write_registry() {
    let suppression_window = Duration::from_millis(WRITE_SUPPRESSION_WINDOW_MS);

    if let Ok(mut registry) = WRITE_REGISTRY.lock() {
        registry.retain(|_, write_time| write_time.elapsed() < suppression_window);
    }
}

/// Reads and writes the `{todos, folders}` snapshot blob for one data
/// directory. Construct with an explicit directory for tests and embedders,
/// or use [`Storage::default_location`].
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Storage rooted at the XDG data directory.
    pub fn default_location() -> Self {
        Self::new(get_storage_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Loads the persisted snapshot once at startup. Absence and parse
    /// failure both fall back to `None` so the caller starts from the
    /// default state; failures are logged, never surfaced.
    pub fn load(&self) -> Option<Snapshot> {
        let path = self.snapshot_path();
        if !path.exists() {
            return None;
        }

        match self.read_snapshot(&path) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::error!(
                    target: "storage",
                    path = %path.display(),
                    error = %e,
                    "Failed to load snapshot, starting from defaults"
                );
                None
            }
        }
    }

    /// Writes the snapshot and records the write in the suppression
    /// registry so the file watcher ignores it.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        ensure_dir(&self.data_dir)
            .map_err(|e| StorageError::directory(format!("{}: {e}", self.data_dir.display())))?;

        let path = self.snapshot_path();
        let content = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&path, content)?;
        record_internal_write(&path);
        Ok(())
    }

    /// Loads the snapshot with retry logic for mid-write reads. When another
    /// process is writing the file there may be a brief moment where it is
    /// incomplete; retry with backoff before giving up.
    ///
    /// Returns `Ok(None)` if the file does not exist (was deleted).
    pub fn load_with_retry(&self) -> Result<Option<Snapshot>, StorageError> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let mut last_error: Option<StorageError> = None;

        for attempt in 0..MAX_PARSE_RETRIES {
            match self.read_snapshot(&path) {
                Ok(snapshot) => {
                    if attempt > 0 {
                        tracing::debug!(
                            target: "storage",
                            attempt = attempt + 1,
                            "Loaded snapshot after retry"
                        );
                    }
                    return Ok(Some(snapshot));
                }
                Err(StorageError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(None);
                }
                Err(e @ StorageError::ParseError(_)) => {
                    if attempt < MAX_PARSE_RETRIES - 1 {
                        tracing::debug!(
                            target: "storage",
                            attempt = attempt + 1,
                            error = %e,
                            "Snapshot parse failed, retrying..."
                        );
                        thread::sleep(Duration::from_millis(
                            PARSE_RETRY_BACKOFF_MS * (attempt as u64 + 1),
                        ));
                    }
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| StorageError::directory("unknown error")))
    }

    fn read_snapshot(&self, path: &Path) -> Result<Snapshot, StorageError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }
}
