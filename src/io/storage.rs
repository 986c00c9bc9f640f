use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::model::list::{List, ListId};
use crate::ops::undo::UndoRecord;

pub const LISTS_KEY: &str = "lists";
pub const SELECTED_KEY: &str = "selectedListId";
pub const UNDO_KEY: &str = "deletedItems";

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not encode {key}: {source}")]
    EncodeError {
        key: &'static str,
        source: serde_json::Error,
    },
}

/// A synchronous string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadError { path, source: e }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        fs::create_dir_all(&self.dir)
            .and_then(|_| atomic_write(&path, value.as_bytes()))
            .map_err(|e| StorageError::WriteError { path, source: e })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteError { path, source: e }),
        }
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Storage adapter
// ---------------------------------------------------------------------------

/// Everything restored by [`Storage::load`]
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub lists: Vec<List>,
    pub selected: Option<ListId>,
    pub undo: Vec<UndoRecord>,
}

/// Persists the list collection, selected id and pending deletions.
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Storage { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load persisted state. Missing or unreadable values load as empty;
    /// failures are logged and never returned.
    ///
    /// Lists without a creation time get `now`. The selected id falls back to
    /// the first list when absent or dangling.
    pub fn load(&self, now: DateTime<Utc>) -> Snapshot {
        let mut lists: Vec<List> = self.read_json(LISTS_KEY).unwrap_or_default();
        for list in &mut lists {
            if list.created_at.is_none() {
                list.created_at = Some(now);
            }
        }

        let persisted = self
            .read_raw(SELECTED_KEY)
            .and_then(|raw| match raw.parse::<ListId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "ignoring unparsable selected list id");
                    None
                }
            });
        let selected = persisted
            .filter(|id| lists.iter().any(|l| l.id == *id))
            .or_else(|| lists.first().map(|l| l.id));

        let undo = self.read_json(UNDO_KEY).unwrap_or_default();

        Snapshot {
            lists,
            selected,
            undo,
        }
    }

    /// Persist the collection. An empty collection is never written, so a
    /// transient empty state cannot wipe the last saved lists; use
    /// [`Storage::clear`] for a deliberate wipe.
    pub fn save(&mut self, lists: &[List]) -> Result<(), StorageError> {
        if lists.is_empty() {
            return Ok(());
        }
        let json = serde_json::to_string(lists).map_err(|e| StorageError::EncodeError {
            key: LISTS_KEY,
            source: e,
        })?;
        self.store.set(LISTS_KEY, &json)
    }

    pub fn save_selected_id(&mut self, id: Option<ListId>) -> Result<(), StorageError> {
        match id {
            Some(id) => self.store.set(SELECTED_KEY, &id.to_string()),
            None => Ok(()),
        }
    }

    pub fn save_undo(&mut self, records: &[UndoRecord]) -> Result<(), StorageError> {
        if records.is_empty() {
            return self.store.remove(UNDO_KEY);
        }
        let json = serde_json::to_string(records).map_err(|e| StorageError::EncodeError {
            key: UNDO_KEY,
            source: e,
        })?;
        self.store.set(UNDO_KEY, &json)
    }

    /// Remove every persisted key: the user deleted their last list.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(LISTS_KEY)?;
        self.store.remove(SELECTED_KEY)?;
        self.store.remove(UNDO_KEY)
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read persisted value");
                None
            }
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "error parsing persisted value, ignoring it");
                None
            }
        }
    }
}
