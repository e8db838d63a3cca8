//! Durable key-value slots.
//!
//! A slot holds whole serialized values under short fixed keys. The store
//! rewrites every key after each mutation and reads them back once at
//! startup, so a slot only needs whole-value load/save semantics.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Whole-value key-value storage surviving process restarts.
pub trait DurableSlot: Send + Sync {
    /// Read the value stored under `key`. Returns `Ok(None)` if absent.
    fn load(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value stored under `key`.
    fn save(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if it existed.
    fn clear(&self, key: &str) -> StoreResult<bool>;
}

/// Slot keys are restricted to ASCII alphanumerics, `-` and `_`.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// `HashMap`-backed slot for tests. Data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl DurableSlot for MemorySlot {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(values.remove(key).is_some())
    }
}

/// Directory-backed slot: one `<key>.json` file per key.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a reader never observes a half-written value. Two processes
/// sharing a directory race with last-writer-wins semantics.
#[derive(Debug)]
pub struct FileSlot {
    root: PathBuf,
}

impl FileSlot {
    /// Open (or create) a slot directory.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl DurableSlot for FileSlot {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!(key, bytes = value.len(), "slot saved");
        Ok(())
    }

    fn clear(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("mockUsers").is_ok());
        assert!(validate_key("user_1-a").is_ok());
        for bad in ["", "../etc", "a/b", "with space", "dot.json"] {
            assert!(validate_key(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn memory_slot_roundtrip() {
        let slot = MemorySlot::new();
        assert!(slot.load("user").unwrap().is_none());
        slot.save("user", "\"abc\"").unwrap();
        assert_eq!(slot.load("user").unwrap().as_deref(), Some("\"abc\""));
        assert!(slot.clear("user").unwrap());
        assert!(!slot.clear("user").unwrap());
        assert!(slot.keys().unwrap().is_empty());
    }

    #[test]
    fn file_slot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::open(&dir.path().join("data")).unwrap();
        assert!(slot.load("mockUsers").unwrap().is_none());

        slot.save("mockUsers", "[]").unwrap();
        assert_eq!(slot.load("mockUsers").unwrap().as_deref(), Some("[]"));
        assert!(slot.root().join("mockUsers.json").exists());

        slot.save("mockUsers", "[1]").unwrap();
        assert_eq!(slot.load("mockUsers").unwrap().as_deref(), Some("[1]"));

        assert!(slot.clear("mockUsers").unwrap());
        assert!(slot.load("mockUsers").unwrap().is_none());
        assert!(!slot.clear("mockUsers").unwrap());
    }

    #[test]
    fn file_slot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileSlot::open(dir.path()).unwrap().save("user", "42").unwrap();
        let reopened = FileSlot::open(dir.path()).unwrap();
        assert_eq!(reopened.load("user").unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn file_slot_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::open(dir.path()).unwrap();
        assert!(matches!(
            slot.save("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
    }
}
