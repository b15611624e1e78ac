//! File-backed credential store.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::CredentialStore;
use crate::error::{StorageError, StorageResult};

type Items = BTreeMap<String, String>;

/// File-based credential store.
///
/// Persists all items as one JSON object. Every write rewrites the file; the
/// file is deleted once the last item is removed.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a file store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a file store in the default location
    /// (`<config dir>/shuttle-access/credentials.json`).
    #[must_use]
    pub fn default_path() -> Self {
        let path = dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shuttle-access")
            .join("credentials.json");
        Self::new(path)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StorageResult<Items> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Items::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Items::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, items: &Items) -> StorageResult<()> {
        if items.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
                debug!(path = %self.path.display(), "removed empty credential file");
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
        debug!(path = %self.path.display(), "saved credential file");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut Items) -> bool) -> StorageResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        let mut items = self.read()?;
        if f(&mut items) {
            self.write(&items)?;
        }
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        })
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.update(|items| items.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("credentials.json"));

        assert_eq!(store.get_item("token").unwrap(), None);

        store.set_item("identity-name", "u").unwrap();
        store.set_item("token", "t").unwrap();
        assert!(store.path().exists());

        // A second handle sees the same data
        let reopened = FileStore::new(store.path());
        assert_eq!(reopened.get_item("identity-name").unwrap().as_deref(), Some("u"));
        assert_eq!(reopened.get_item("token").unwrap().as_deref(), Some("t"));
    }

    #[test]
    fn test_file_removed_with_last_item() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("credentials.json"));

        store.set_item("token", "t").unwrap();
        store.remove_item("token").unwrap();
        assert!(!store.path().exists());

        // Removing again is fine
        store.remove_item("token").unwrap();
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("credentials.json");
        file.write_str("not json").unwrap();

        let store = FileStore::new(file.path());
        let err = store.get_item("token").unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }

    #[test]
    fn test_empty_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("credentials.json");
        file.touch().unwrap();

        let store = FileStore::new(file.path());
        assert_eq!(store.get_item("token").unwrap(), None);
    }
}
