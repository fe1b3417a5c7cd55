//! Snapshot load/save gateway.
//!
//! Loading never fails: a missing document yields a fresh snapshot and an
//! unreadable one is backed up first, so the caller can always keep going.

use crate::domain::Snapshot;
use crate::error::PersistenceError;
use crate::persistence::files::{atomic_write, backup_file, user_file};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub trait SnapshotStore: Send + Sync {
    /// The user's snapshot, normalised; a fresh one when nothing usable is stored
    fn load(&self, user_id: &str) -> Snapshot;

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;
}

/// One pretty-printed JSON document per user under a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn fresh(user_id: &str) -> Snapshot {
        Snapshot::new(user_id)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, user_id: &str) -> Snapshot {
        let path = user_file(&self.data_dir, user_id);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored snapshot, starting fresh");
                return Self::fresh(user_id);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read snapshot, starting fresh");
                return Self::fresh(user_id);
            }
        };

        let mut snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                match backup_file(&path) {
                    Ok(backup) => warn!(
                        path = %path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "corrupt snapshot backed up, starting fresh"
                    ),
                    Err(backup_err) => warn!(
                        path = %path.display(),
                        error = %e,
                        backup_error = %backup_err,
                        "corrupt snapshot could not be backed up, starting fresh"
                    ),
                }
                return Self::fresh(user_id);
            }
        };

        if snapshot.user_id.is_empty() {
            snapshot.user_id = user_id.to_string();
        }
        snapshot.normalize();
        snapshot
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(snapshot)?;

        fs::create_dir_all(&self.data_dir).map_err(|source| PersistenceError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let path = user_file(&self.data_dir, &snapshot.user_id);
        atomic_write(&path, &json).map_err(|e| PersistenceError::Write {
            path: path.clone(),
            message: format!("{:#}", e),
        })?;

        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}

/// In-memory store for tests; counts saves
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: std::sync::Mutex<std::collections::HashMap<String, Snapshot>>,
    saves: std::sync::atomic::AtomicUsize,
    fail: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn saved(&self, user_id: &str) -> Option<Snapshot> {
        self.documents.lock().unwrap().get(user_id).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl SnapshotStore for MemoryStore {
    fn load(&self, user_id: &str) -> Snapshot {
        self.saved(user_id).unwrap_or_else(|| Snapshot::new(user_id))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PersistenceError::Write {
                path: PathBuf::from("memory"),
                message: "disk full".to_string(),
            });
        }
        self.saves.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .insert(snapshot.user_id.clone(), snapshot.clone());
        Ok(())
    }
}
