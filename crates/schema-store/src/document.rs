//! Versioned JSON documents on top of a [`FileStore`].
//!
//! `SchemaDocument` is the glue between persisted bytes and a
//! [`SchemaManager`]: it reads a file, hands the untyped value to the
//! manager for validation and migration, falls back to the default when
//! nothing is persisted, and writes migrated data back.
//!
//! # Example
//!
//! ```
//! use schema_migrate::{FieldRule, SchemaManager, Shape};
//! use schema_store::{FileStore, MemoryStore, Origin, SchemaDocument};
//! use serde_json::json;
//!
//! let manager = SchemaManager::builder("Settings")
//!     .validator(Shape::new(0).field("dark", FieldRule::Bool))
//!     .default_value(json!({"dark": false, "version": 0}))
//!     .build()
//!     .unwrap();
//!
//! let mut doc = SchemaDocument::new(&manager, MemoryStore::new());
//! let loaded = doc.load("settings.json").unwrap();
//! assert_eq!(loaded.origin, Origin::Default);
//!
//! doc.save("settings.json", &json!({"dark": true, "version": 0})).unwrap();
//! assert_eq!(doc.load("settings.json").unwrap().value["dark"], true);
//! ```

use std::io;

use schema_migrate::{declared_version, encode, ErrorKind, SchemaError, SchemaManager, VersionedSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::result_span;
use crate::span::in_result_span;
use crate::traits::FileStore;

/// Error type for `SchemaDocument` operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Error from the underlying storage backend.
    #[error("failed to {op} `{path}`: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
    /// The stored bytes are not JSON.
    #[error("`{path}` is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// Validation, migration or default production failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl DocumentError {
    fn io(op: &'static str, path: &str, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_string(),
            source,
        }
    }

    /// True when the stored content itself is unusable (bad JSON, failed
    /// validation, bad version tag), as opposed to an I/O or configuration
    /// problem.
    pub fn is_bad_content(&self) -> bool {
        match self {
            Self::Json { .. } => true,
            Self::Schema(e) => e.kind() == ErrorKind::InvalidArgument,
            Self::Io { .. } => false,
        }
    }
}

/// Configuration for `SchemaDocument`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// If true, re-write migrated data back to the store after reading.
    pub write_back_on_read: bool,
    /// If true, persist the default when a document is loaded but absent.
    pub persist_default: bool,
    /// Write indented JSON.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            write_back_on_read: true,
            persist_default: false,
            pretty: true,
        }
    }
}

/// Where a loaded value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Stored at the latest version.
    Current,
    /// Stored at an older version and migrated.
    Migrated { from: u32 },
    /// Nothing stored; the manager's default was used.
    Default,
    /// Stored content was unusable and replaced by the default.
    Reset { reason: String },
}

/// A loaded latest-version value.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub value: Value,
    pub origin: Origin,
}

/// Loads and persists documents managed by a [`SchemaManager`].
pub struct SchemaDocument<'m, S: FileStore> {
    manager: &'m SchemaManager,
    store: S,
    config: StoreConfig,
}

impl<'m, S: FileStore> SchemaDocument<'m, S> {
    /// Create a document layer with default config.
    pub fn new(manager: &'m SchemaManager, store: S) -> Self {
        Self::with_config(manager, store, StoreConfig::default())
    }

    pub fn with_config(manager: &'m SchemaManager, store: S, config: StoreConfig) -> Self {
        Self {
            manager,
            store,
            config,
        }
    }

    pub fn manager(&self) -> &SchemaManager {
        self.manager
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a mutable reference to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Load the document at `path` as a latest-version value.
    ///
    /// Absent documents yield the manager's default (persisted if
    /// configured). Older documents are migrated and, if configured,
    /// written back.
    pub fn load(&mut self, path: &str) -> Result<Loaded, DocumentError> {
        let span = result_span!("schema_document.load", schema = self.manager.name(), path);
        in_result_span(span, || self.load_inner(path))
    }

    /// Load and decode into `T`.
    pub fn load_as<T: DeserializeOwned>(&mut self, path: &str) -> Result<T, DocumentError> {
        let loaded = self.load(path)?;
        Ok(self.manager.decode_latest(loaded.value)?)
    }

    /// Load the document, replacing unusable content with the default.
    ///
    /// Migration failures are deterministic, so retrying is pointless; this
    /// is the recovery path for callers that prefer a fresh default over an
    /// error. I/O failures and a missing default factory are still errors.
    pub fn load_or_reset(&mut self, path: &str) -> Result<Loaded, DocumentError> {
        let span = result_span!("schema_document.load_or_reset", schema = self.manager.name(), path);
        in_result_span(span, || match self.load_inner(path) {
            Err(e) if e.is_bad_content() => {
                tracing::warn!(path, error = %e, "discarding unusable document");
                let value = self.manager.get_default()?;
                self.write_value(path, &value)?;
                Ok(Loaded {
                    value,
                    origin: Origin::Reset {
                        reason: e.to_string(),
                    },
                })
            }
            other => other,
        })
    }

    /// Validate `value` against its declared version, migrate it to the
    /// latest version and persist it. Returns what was written.
    pub fn save(&mut self, path: &str, value: &Value) -> Result<Value, DocumentError> {
        let span = result_span!("schema_document.save", schema = self.manager.name(), path);
        in_result_span(span, || {
            let latest = self.manager.update_schema(Some(value))?;
            self.write_value(path, &latest)?;
            Ok(latest)
        })
    }

    /// Serialize a typed record, tag it with its version and save it.
    pub fn save_as<T: Serialize + VersionedSchema>(
        &mut self,
        path: &str,
        value: &T,
    ) -> Result<Value, DocumentError> {
        let encoded = encode(value, T::VERSION)?;
        self.save(path, &encoded)
    }

    /// Delete the document at `path`.
    pub fn delete(&mut self, path: &str) -> Result<(), DocumentError> {
        let span = result_span!("schema_document.delete", schema = self.manager.name(), path);
        in_result_span(span, || {
            self.store
                .delete(path)
                .map_err(|e| DocumentError::io("delete", path, e))
        })
    }

    fn load_inner(&mut self, path: &str) -> Result<Loaded, DocumentError> {
        let raw = self
            .store
            .read(path)
            .map_err(|e| DocumentError::io("read", path, e))?;

        let Some(raw) = raw else {
            let value = self.manager.get_default()?;
            if self.config.persist_default {
                self.write_value(path, &value)?;
            }
            tracing::debug!(path, "no stored document, using default");
            return Ok(Loaded {
                value,
                origin: Origin::Default,
            });
        };

        let stored: Value = serde_json::from_slice(&raw).map_err(|source| DocumentError::Json {
            path: path.to_string(),
            source,
        })?;
        let value = self.manager.update_schema(Some(&stored))?;

        // update_schema succeeded, so the declared version is in range.
        let from = declared_version(&stored).unwrap_or_default() as u32;
        let latest = self.manager.latest_version();
        if from == latest {
            return Ok(Loaded {
                value,
                origin: Origin::Current,
            });
        }

        tracing::info!(path, from, to = latest, "migrated document");
        if self.config.write_back_on_read {
            self.write_value(path, &value)?;
        }
        Ok(Loaded {
            value,
            origin: Origin::Migrated { from },
        })
    }

    fn write_value(&mut self, path: &str, value: &Value) -> Result<(), DocumentError> {
        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|source| DocumentError::Json {
            path: path.to_string(),
            source,
        })?;
        self.store
            .write(path, &bytes)
            .map_err(|e| DocumentError::io("write", path, e))
    }
}
