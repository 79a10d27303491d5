use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::traits::{normalize_path, FileStore};

/// Filesystem backend rooted at a directory.
///
/// Paths are resolved relative to the root and may not escape it. Writes
/// go to a uniquely named temporary file in the target directory and are
/// renamed into place, so a crash never leaves a half-written document
/// behind.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a store path.
    pub fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let normalized = normalize_path(path)?;
        Ok(normalized
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part)))
    }
}

impl FileStore for FsStore {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.resolve(path)?) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, path: &str, data: &[u8]) -> io::Result<()> {
        let target = self.resolve(path)?;
        let parent = target.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent)?;

        // Uniquely named sibling; dropped (and removed) if persisting fails.
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }

    fn delete(&mut self, path: &str) -> io::Result<()> {
        match fs::remove_file(self.resolve(path)?) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        Ok(self.resolve(path)?.is_file())
    }
}
