//! Key-value persistence for viewer state.
//!
//! The viewer persists a handful of string values (constellation links,
//! names, camera hand-off) under fixed keys. [`KeyValueStore`] abstracts the
//! backing medium so the annotation store can flush to memory in tests and to
//! disk in the tools.
//!
//! [`FileStore`] keeps one JSON file per key in ~/.skyview/ by default.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Storage keys used by the viewer
pub mod keys {
    /// JSON array of constellation links
    pub const OWN_CONSTELLATION: &str = "ownConstellation";
    /// JSON array of name assignments
    pub const CONSTELLATION_NAMES: &str = "constellationNames";
    /// Stringified camera right ascension, degrees
    pub const CURRENT_RA: &str = "currentRa";
    /// Stringified camera declination, degrees
    pub const CURRENT_DEC: &str = "currentDec";
}

/// Errors writing to a store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// String-valued key-value store.
///
/// Writes replace the whole value for a key; there are no partial updates.
pub trait KeyValueStore {
    /// Value stored under `key`, if any. Unreadable values read as absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store, the equivalent of browser local storage in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Directory-backed store with one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Root directory for all stored values (e.g., ~/.skyview)
    root_path: PathBuf,
}

impl FileStore {
    /// Create a store with the default path (~/.skyview)
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
        Ok(Self {
            root_path: PathBuf::from(home).join(".skyview"),
        })
    }

    /// Create a store with a custom root path
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Get the root directory
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// File holding the value for `key`
    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root_path.join(format!("{key}.json")))
    }

    /// List the keys currently stored.
    pub fn keys(&self) -> std::io::Result<Vec<String>> {
        if !self.root_path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root_path)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_path(PathBuf::from(".skyview")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key).ok()?;
        std::fs::read_to_string(path).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        std::fs::create_dir_all(&self.root_path)?;

        // Write a sibling temp file and rename so readers never see a torn value
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_path(dir.path().join("skyview"));
        (dir, store)
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get(keys::CURRENT_RA).is_none());

        store.set(keys::CURRENT_RA, "12.5").unwrap();
        assert_eq!(store.get(keys::CURRENT_RA).as_deref(), Some("12.5"));
        assert_eq!(store.len(), 1);

        store.remove(keys::CURRENT_RA).unwrap();
        store.remove(keys::CURRENT_RA).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_creates_directory_on_write() {
        let (_dir, mut store) = create_test_store();
        assert!(!store.root_path().exists());
        assert!(store.get(keys::OWN_CONSTELLATION).is_none());

        store.set(keys::OWN_CONSTELLATION, "[]").unwrap();
        assert!(store.root_path().join("ownConstellation.json").exists());
        assert_eq!(store.get(keys::OWN_CONSTELLATION).as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_replaces_value() {
        let (_dir, mut store) = create_test_store();
        store.set(keys::CURRENT_DEC, "-10").unwrap();
        store.set(keys::CURRENT_DEC, "45.25").unwrap();
        assert_eq!(store.get(keys::CURRENT_DEC).as_deref(), Some("45.25"));
        assert!(!store.root_path().join("currentDec.json.tmp").exists());
    }

    #[test]
    fn test_file_store_keys_and_remove() {
        let (_dir, mut store) = create_test_store();
        assert!(store.keys().unwrap().is_empty());

        store.set(keys::CURRENT_RA, "1").unwrap();
        store.set(keys::CURRENT_DEC, "2").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["currentDec", "currentRa"]);

        store.remove(keys::CURRENT_RA).unwrap();
        store.remove(keys::CURRENT_RA).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["currentDec"]);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let (_dir, mut store) = create_test_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.get("../escape").is_none());
    }
}
