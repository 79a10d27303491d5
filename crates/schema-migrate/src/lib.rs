//! # schema-migrate
//!
//! Versioned schema migrations for structured data.
//!
//! Persisted records carry an integer `version` tag. When the record shape
//! evolves, `schema-migrate` validates old data against the shape of the
//! version it declares and converts it, one version at a time, into the
//! latest shape.
//!
//! ## How It Works
//!
//! 1. A [`SchemaManager`] owns one [`Validator`] per version `0..=latest`
//!    and one [`Converter`] per transition `v → v+1`.
//! 2. [`SchemaManager::update_schema`] reads the input's `version`, validates
//!    the input against that version's shape, then runs converters
//!    `version → … → latest` in order.
//! 3. [`SchemaManager::get_default`] produces a validated latest-version
//!    record when nothing has been persisted yet.
//!
//! ## Key Concepts
//!
//! - **Linear chain**: migrations run v0→v1→…→latest, never skipping steps.
//! - **Deterministic**: the same input always yields the same output.
//! - **Checked at construction**: a manager whose validators and converters
//!   do not line up cannot be built.
//! - **Pluggable validation**: serde types ([`TypedValidator`]), declarative
//!   [`Shape`]s, or any custom [`Validator`].
//!
//! ## Example
//!
//! ```
//! use schema_migrate::{convert_fn, SchemaManager, TypedValidator, VersionedSchema};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Serialize, Deserialize)]
//! struct V0 { celsius: f64 }
//! impl VersionedSchema for V0 { const VERSION: u32 = 0; }
//!
//! #[derive(Serialize, Deserialize)]
//! struct V1 { kelvin: f64 }
//! impl VersionedSchema for V1 { const VERSION: u32 = 1; }
//!
//! let manager = SchemaManager::builder("Reading")
//!     .validator(TypedValidator::<V0>::new())
//!     .validator(TypedValidator::<V1>::new())
//!     .converter(convert_fn(|old: V0| Ok(V1 { kelvin: old.celsius + 273.15 })))
//!     .build()
//!     .unwrap();
//!
//! let latest: V1 = manager
//!     .update_schema_as(Some(&json!({"celsius": 0.0, "version": 0})))
//!     .unwrap();
//! assert_eq!(latest.kelvin, 273.15);
//! ```

mod converter;
mod error;
mod manager;
mod schema;
mod shape;
mod shape_set;
mod validator;

pub use converter::{
    convert_fn, decode, encode, value_converter, Converter, FnConverter, ValueConverter,
};
pub use error::{Diagnostic, ErrorKind, Issue, SchemaError};
pub use manager::{DefaultFactory, ManagerConfig, SchemaManager, SchemaManagerBuilder};
pub use schema::{declared_version, tag_version, VersionedSchema, VERSION_FIELD};
pub use serde_json::Value;
pub use shape::{json_type_name, FieldRule, Shape};
pub use shape_set::ShapeSet;
pub use validator::{check_version_tag, TypedValidator, Validator};

// Re-export proc macros when the `macros` feature is enabled.
#[cfg(feature = "macros")]
pub use schema_migrate_macros::{converter, versioned_schema};
