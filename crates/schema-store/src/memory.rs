use std::collections::BTreeMap;
use std::io;

use crate::traits::{normalize_path, FileStore};

/// In-memory storage backend.
///
/// All files live in a `BTreeMap`; nothing touches disk.
/// Ideal for testing and prototyping.
///
/// # Example
///
/// ```
/// use schema_store::{FileStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.write("settings/app.json", b"{}").unwrap();
///
/// let data = store.read("settings/app.json").unwrap().unwrap();
/// assert_eq!(data, b"{}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.files.get(&normalize_path(path)?).cloned())
    }

    fn write(&mut self, path: &str, data: &[u8]) -> io::Result<()> {
        self.files.insert(normalize_path(path)?, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, path: &str) -> io::Result<()> {
        self.files.remove(&normalize_path(path)?);
        Ok(())
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        Ok(self.files.contains_key(&normalize_path(path)?))
    }
}
