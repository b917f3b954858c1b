//! Per-device key-value storage.
//!
//! Models the device-local storage the app keeps its remembered
//! active-list choice in. Injected as a port so tests can swap in an
//! in-memory map; there is no cross-device coordination.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Plain string key-value store scoped to this device.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// JSON-file backed store under the data directory.
///
/// The whole map is rewritten on every change; the file is small (a
/// handful of keys) so this stays cheap. Write failures are logged and
/// otherwise ignored, matching best-effort device storage.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    map: HashMap<String, String>,
}

impl FileStore {
    /// Open (or lazily create) the store at the given path.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();
        Self { path, map }
    }

    /// Conventional location inside a data directory.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::open(data_dir.join("device.json"))
    }

    fn flush(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("failed to create data directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(&self.map) {
            Ok(contents) => {
                if let Err(e) = std::fs::write(&self.path, contents) {
                    tracing::warn!("failed to write device store: {}", e);
                }
            }
            Err(e) => tracing::warn!("failed to encode device store: {}", e),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.map.remove(key).is_some() {
            self.flush();
        }
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.json");

        let mut store = FileStore::open(&path);
        assert!(store.get("active-list/h1").is_none());

        store.set("active-list/h1", "l1");
        assert_eq!(store.get("active-list/h1").as_deref(), Some("l1"));

        // Reopen from disk.
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("active-list/h1").as_deref(), Some("l1"));
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("data").join("device.json");

        let mut store = FileStore::open(&path);
        store.set("k", "v");
        assert!(path.exists());
    }

    #[test]
    fn test_file_store_remove() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.json");

        let mut store = FileStore::open(&path);
        store.set("k", "v");
        store.remove("k");
        assert!(store.get("k").is_none());

        let reopened = FileStore::open(&path);
        assert!(reopened.get("k").is_none());
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path);
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert!(store.get("k").is_none());
    }
}
