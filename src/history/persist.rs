//! Storage collaborator: a best-effort mirror of the collection.
//!
//! The in-memory store is the source of truth. A failed write is logged and
//! never rolls back or corrupts the collection.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::history::store::{Collection, StoreSubscriber};

/// Backing store for the serialized collection.
pub trait Storage {
    /// Reads the last saved collection, or `None` when nothing was saved.
    fn load(&self) -> Result<Option<Collection>, StorageError>;

    /// Replaces the saved collection.
    fn save(&mut self, collection: &Collection) -> Result<(), StorageError>;
}

/// Collection stored as a JSON array in a file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a failed write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Option<Collection>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&mut self, collection: &Collection) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(collection)?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Collection saved");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    json: Option<String>,
    writes: usize,
}

/// In-memory storage with an optional byte quota, like a browser session
/// store.
///
/// Clones share the same contents, so a caller can keep a handle while the
/// store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects collections serializing to more than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// The saved JSON text, if any.
    pub fn contents(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|inner| inner.json.clone())
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|inner| inner.writes).unwrap_or(0)
    }

    fn poisoned() -> StorageError {
        StorageError::Io(std::io::Error::other("memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<Collection>, StorageError> {
        let inner = self.inner.lock().map_err(|_| Self::poisoned())?;
        match &inner.json {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, collection: &Collection) -> Result<(), StorageError> {
        let json = serde_json::to_string(collection)?;
        if let Some(quota) = self.quota {
            if json.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    required: json.len(),
                    quota,
                });
            }
        }
        let mut inner = self.inner.lock().map_err(|_| Self::poisoned())?;
        inner.json = Some(json);
        inner.writes += 1;
        Ok(())
    }
}

/// Store subscriber mirroring every change into a `Storage`.
#[derive(Debug)]
pub struct Persister<S> {
    storage: S,
}

impl<S: Storage> Persister<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: Storage> StoreSubscriber for Persister<S> {
    fn collection_changed(&mut self, collection: &Collection) {
        if let Err(error) = self.storage.save(collection) {
            warn!(%error, len = collection.len(), "Failed to persist collection; keeping in-memory state");
        }
    }
}
