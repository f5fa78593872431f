// src/store.rs
use crate::error::{StoreError, StoreResult};
use crate::models::{Collection, Entry};
use log;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Key under which the entry collection is kept.
pub const ENTRIES_KEY: &str = "journalEntries";

/// Durable string key-value storage. Every `set` replaces the whole value.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                log::error!("Failed to read {:?}: {}", path, e);
                Err(StoreError::Io(e))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|e| {
            log::error!("Failed to create data directory {:?}: {}", self.dir, e);
            StoreError::Io(e)
        })?;

        // Write beside the target and rename over it so readers never see half a file.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| { log::error!("Failed to write temp file for {:?}: {}", path, e); e })?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| {
            log::error!("Failed to replace {:?}: {}", path, e.error);
            StoreError::Io(e.error)
        })?;
        log::debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                log::error!("Failed to remove {:?}: {}", path, e);
                Err(StoreError::Io(e))
            }
        }
    }
}

/// Process-local storage; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds whole values, so keep using it.
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Reads and writes the entry collection as one JSON array.
#[derive(Debug, Clone)]
pub struct EntryStorage<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> EntryStorage<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Missing, unreadable or malformed data all load as an empty collection.
    pub fn load(&self) -> Collection {
        let raw = match self.kv.get(ENTRIES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::info!("No stored entries found. Starting with an empty journal.");
                return Collection::new();
            }
            Err(e) => {
                log::warn!("Could not read stored entries: {}. Starting with an empty journal.", e);
                return Collection::new();
            }
        };

        match serde_json::from_str::<Collection>(&raw) {
            Ok(entries) => {
                let entries = drop_duplicate_ids(entries);
                log::info!("Loaded {} entries.", entries.len());
                entries
            }
            Err(e) => {
                log::warn!("Stored entries are malformed ({}). Starting with an empty journal.", e);
                Collection::new()
            }
        }
    }

    /// Replaces the whole persisted collection.
    pub fn save(&self, entries: &[Entry]) -> StoreResult<()> {
        let serialized = serde_json::to_string(entries).map_err(|e| {
            let msg = format!("JSON serialization failed: {}", e);
            log::error!("save: {}", msg);
            StoreError::Serialization(msg)
        })?;
        self.kv.set(ENTRIES_KEY, &serialized)?;
        log::info!("Saved {} entries.", entries.len());
        Ok(())
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.kv.remove(ENTRIES_KEY)?;
        log::info!("Cleared stored entries.");
        Ok(())
    }
}

/// Keeps the first entry for each id.
fn drop_duplicate_ids(entries: Collection) -> Collection {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| {
            let first = seen.insert(entry.id);
            if !first {
                log::warn!("Dropping stored entry with duplicate id {}", entry.id);
            }
            first
        })
        .collect()
}
