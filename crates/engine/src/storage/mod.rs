//! Flat key-value blob storage. Keys name whole blobs; there is no partial update.

mod atomic_io;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("blob key '{key}' is not a plain file name")]
    InvalidKey { key: String },
    #[error("failed to read blob '{key}' at {path}: {source}")]
    Read {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write blob '{key}' at {path}: {source}")]
    Write {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait BlobStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError>;
    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError>;
}

/// One `<key>.json` file per blob under a root directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        let is_plain = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.')
            && !key.starts_with('.');
        if !is_plain {
            return Err(BlobStoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BlobStoreError::Read {
                key: key.to_string(),
                path,
                source,
            }),
        }
    }

    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let path = self.path_for(key)?;
        atomic_io::write_bytes_atomic(&path, bytes).map_err(|source| BlobStoreError::Write {
            key: key.to_string(),
            path,
            source,
        })
    }
}

/// In-process store. Clones share the same blobs, so a test can keep a handle
/// while the game owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, key: &str, bytes: &[u8]) -> Self {
        self.lock().insert(key.to_string(), bytes.to_vec());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn file_store_round_trips_and_reports_absent_keys() {
        let temp = TempDir::new().expect("temp");
        let mut store = FileBlobStore::new(temp.path().join("store"));

        assert!(store.get("history").expect("get").is_none());
        store.put("history", b"{}").expect("put");
        assert_eq!(store.get("history").expect("get"), Some(b"{}".to_vec()));
        assert!(store.root().join("history.json").is_file());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let temp = TempDir::new().expect("temp");
        let mut store = FileBlobStore::new(temp.path());

        assert!(matches!(
            store.put("../escape", b"x"),
            Err(BlobStoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.get(""),
            Err(BlobStoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn memory_store_clones_share_blobs() {
        let store = MemoryBlobStore::new().with_blob("seed", b"1");
        let mut writer = store.clone();
        writer.put("other", b"2").expect("put");

        assert_eq!(store.get("seed").expect("get"), Some(b"1".to_vec()));
        assert_eq!(store.get("other").expect("get"), Some(b"2".to_vec()));
    }
}
