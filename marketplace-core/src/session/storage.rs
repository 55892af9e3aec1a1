//! Durable key/value storage backing the session entry
//!
//! On-disk layout: one JSON document per entry, `<data_dir>/<entry>.json`.
//! Writes go to `<entry>.tmp` first and are renamed into place so a crash
//! never leaves a half-written entry behind.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::SessionError;

/// Durable named entries surviving a restart
pub trait DurableStorage: Send + Sync {
    /// Read an entry, `None` if it was never written or was removed
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Replace an entry
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Remove an entry; removing a missing entry is not an error
    fn remove_item(&self, key: &str) -> Result<(), SessionError>;
}

/// File-backed storage rooted at a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `base_path`, creating the directory if needed
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| SessionError::storage(&base_path, e))?;
        Ok(Self { base_path })
    }

    /// Directory holding the entries
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file holding `key`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn write_atomic(&self, path: &Path, data: &str) -> Result<(), SessionError> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data).map_err(|e| SessionError::storage(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| SessionError::storage(path, e))
    }
}

impl DurableStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::storage(&path, e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.write_atomic(&self.entry_path(key), value)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::storage(&path, e)),
        }
    }
}

fn handle_poison<T>(_err: PoisonError<T>) -> SessionError {
    SessionError::Storage("storage lock poisoned".to_string())
}

/// In-memory storage (non-persistent, for tests)
///
/// Clones share the same entries, which lets a test simulate a restart by
/// building a second store over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.read().map_err(handle_poison)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .write()
            .map_err(handle_poison)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        self.entries.write().map_err(handle_poison)?.remove(key);
        Ok(())
    }
}
