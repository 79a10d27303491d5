//! # schema-store
//!
//! File storage boundary for [`schema-migrate`](https://docs.rs/schema-migrate).
//!
//! A [`SchemaDocument`] reads a versioned JSON document from a
//! [`FileStore`], validates and migrates it through a
//! [`SchemaManager`](schema_migrate::SchemaManager), falls back to the
//! manager's default when nothing is stored, and writes migrated data back.
//!
//! ## Quick Start
//!
//! ```
//! use schema_store::{FileStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.write("plugins/notes/settings.json", b"{\"version\": 0}").unwrap();
//! assert!(store.exists("plugins/notes/settings.json").unwrap());
//! ```
//!
//! ## Backends
//!
//! | Backend | Use case |
//! |---------|----------|
//! | [`MemoryStore`] | Testing, prototyping |
//! | [`FsStore`] | Documents on disk, atomic replace on write |
//!
//! Every document operation runs inside a `tracing` span whose
//! `otel.status_code` is set from the operation's result (see [`span`]).

mod document;
mod fs;
mod memory;
pub mod span;
mod traits;

pub use document::{DocumentError, Loaded, Origin, SchemaDocument, StoreConfig};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use traits::{normalize_path, FileStore};

#[doc(hidden)]
pub use tracing as __tracing;
