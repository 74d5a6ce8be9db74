//! Persistence of the document set.
//!
//! State is kept in a small key-value storage; the whole document set is one
//! JSON value under a single slot key.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    Mutex,
};

use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

use crate::document::{
    Document,
    Snapshot,
};

/// Default storage slot holding the document set.
pub const DEFAULT_STORAGE_KEY: &str = "translationFiles";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access state file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored state is not valid: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("State storage lock was poisoned")]
    Poisoned,
}

/// Where the editor persists its document set after each change.
pub trait StateStore: Send + Sync + std::fmt::Debug {
    /// The stored document set, or `None` when nothing was saved yet.
    ///
    /// # Errors
    /// Returns error if the storage cannot be read or holds invalid data.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replaces the stored document set.
    ///
    /// # Errors
    /// Returns error if the storage cannot be written.
    fn save(&self, documents: &[Document]) -> Result<(), StoreError>;
}

/// JSON object file used as a key-value storage.
///
/// Only the configured slot is touched; other keys in the file survive saves.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
    key: String,
}

impl FileStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self { path: path.into(), key: key.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    fn read_slots(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str(&content)? {
            Value::Object(slots) => Ok(slots),
            other => {
                tracing::warn!(path = %self.path.display(), found = ?other, "State file is not an object, starting fresh");
                Ok(Map::new())
            }
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let mut slots = self.read_slots()?;
        let Some(value) = slots.remove(&self.key) else {
            tracing::debug!(path = %self.path.display(), key = %self.key, "No stored document set");
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    fn save(&self, documents: &[Document]) -> Result<(), StoreError> {
        let mut slots = self.read_slots()?;
        slots.insert(self.key.clone(), serde_json::to_value(documents)?);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write to a sibling file first so a crash never leaves half a state file.
        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string(&Value::Object(slots))?;
        std::fs::write(&temp_path, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), documents = documents.len(), "Saved document set");
        Ok(())
    }
}

/// In-memory storage. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    slot: Arc<Mutex<Option<Value>>>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value, as it would appear in the storage slot.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn raw(&self) -> Result<Option<Value>, StoreError> {
        Ok(self.slot.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        slot.clone().map(serde_json::from_value).transpose().map_err(StoreError::from)
    }

    fn save(&self, documents: &[Document]) -> Result<(), StoreError> {
        let value = serde_json::to_value(documents)?;
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = Some(value);
        Ok(())
    }
}
