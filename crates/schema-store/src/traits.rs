use std::io;

/// Core trait for binary file storage.
///
/// Every backend implements this trait. It provides simple whole-file
/// operations keyed by a relative, `/`-separated path.
///
/// Data is stored as opaque bytes; the store does not interpret the
/// documents. Versioning and migration are handled by
/// [`SchemaDocument`](crate::SchemaDocument).
pub trait FileStore {
    /// Read the file at `path`.
    /// Returns `None` if the file does not exist.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Write `data` to `path`, replacing any existing content and creating
    /// missing parent directories.
    fn write(&mut self, path: &str, data: &[u8]) -> io::Result<()>;

    /// Delete the file at `path`. Deleting a missing file is not an error.
    fn delete(&mut self, path: &str) -> io::Result<()>;

    /// Check if a file exists.
    fn exists(&self, path: &str) -> io::Result<bool> {
        Ok(self.read(path)?.is_some())
    }
}

impl<S: FileStore + ?Sized> FileStore for &mut S {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).read(path)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> io::Result<()> {
        (**self).write(path, data)
    }

    fn delete(&mut self, path: &str) -> io::Result<()> {
        (**self).delete(path)
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        (**self).exists(path)
    }
}

/// Normalize a store path: trims separators, collapses `//` and `.`, and
/// rejects `..` so a path can never leave the store root.
pub fn normalize_path(path: &str) -> io::Result<String> {
    let mut parts = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("path `{path}` escapes the store root"),
                ))
            }
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path `{path}` is empty"),
        ));
    }
    Ok(parts.join("/"))
}
