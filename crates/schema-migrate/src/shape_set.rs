//! Shape sets loaded from configuration files.
//!
//! A shape set describes every generation of one record type. It is usually
//! kept next to the application as `schema-shapes.toml`:
//!
//! ```toml
//! name = "Settings"
//!
//! [[versions]]
//! version = 0
//! [versions.fields]
//! theme = { type = "string" }
//!
//! [[versions]]
//! version = 1
//! strict = true
//! [versions.fields]
//! dark = { type = "bool" }
//!
//! [default]
//! dark = false
//! version = 1
//! ```
//!
//! Converters are code, so a shape set only provides the validators and the
//! default; [`ShapeSet::into_builder`] hands them to a
//! [`SchemaManagerBuilder`] where the converters are added.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::manager::{
    missing_default, validate_declared, validate_default, SchemaManager, SchemaManagerBuilder,
};
use crate::shape::Shape;

/// Every version of one record type, plus an optional default record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSet {
    pub name: String,
    /// Shapes in version order, starting at 0.
    pub versions: Vec<Shape>,
    /// Default record for the latest version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ShapeSet {
    /// Parse a shape set from TOML and check its version sequence.
    pub fn from_toml(src: &str) -> Result<Self, SchemaError> {
        let set: Self = toml::from_str(src)
            .map_err(|e| SchemaError::invalid_argument(format!("failed to parse shape set: {e}")))?;
        set.check()?;
        Ok(set)
    }

    /// Parse a shape set from JSON and check its version sequence.
    pub fn from_json(src: &str) -> Result<Self, SchemaError> {
        let set: Self = serde_json::from_str(src)
            .map_err(|e| SchemaError::invalid_argument(format!("failed to parse shape set: {e}")))?;
        set.check()?;
        Ok(set)
    }

    /// Versions must be dense, ascending and start at 0.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.versions.is_empty() {
            return Err(SchemaError::invalid_argument(format!(
                "shape set `{}` declares no versions",
                self.name
            )));
        }
        for (i, shape) in self.versions.iter().enumerate() {
            if shape.version as usize != i {
                return Err(SchemaError::invalid_argument(format!(
                    "shape set `{}`: entry {i} declares version {}, expected {i}",
                    self.name, shape.version
                )));
            }
        }
        Ok(())
    }

    /// Latest declared version.
    pub fn latest_version(&self) -> u32 {
        self.versions.len().saturating_sub(1) as u32
    }

    pub fn shape(&self, version: u32) -> Option<&Shape> {
        self.versions.get(version as usize)
    }

    /// Validate `data` against the shape of its declared version, with the
    /// same checks and errors as [`SchemaManager::validate_declared`].
    pub fn validate_declared(&self, data: Option<&Value>) -> Result<(u32, Value), SchemaError> {
        validate_declared(&self.name, &self.versions, data)
    }

    /// The default record, validated against the latest shape.
    pub fn validated_default(&self) -> Result<Value, SchemaError> {
        let default = self
            .default
            .as_ref()
            .ok_or_else(|| missing_default(&self.name))?;
        validate_default(&self.name, &self.versions, default)
    }

    /// Builder pre-loaded with this set's validators and default.
    pub fn into_builder(self) -> SchemaManagerBuilder {
        let builder = SchemaManager::builder(self.name).validators(self.versions);
        match self.default {
            Some(default) => builder.default_value(default),
            None => builder,
        }
    }
}
