use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Diagnostic;
use crate::schema::{tag_version, VersionedSchema, VERSION_FIELD};
use crate::shape::{json_type_name, Shape};

/// Checks untyped input against the shape rules of one schema version.
///
/// The manager treats validators as opaque capabilities: any validation
/// technology can be plugged in as long as it turns raw input into the
/// sanitized record for its version or explains why it cannot.
pub trait Validator: Send + Sync {
    /// The version this validator accepts.
    fn version(&self) -> u32;

    /// Validate `raw`, returning the validated record.
    fn validate(&self, raw: &Value) -> Result<Value, Diagnostic>;

    /// Declarative description of the accepted shape, if one exists.
    fn describe(&self) -> Option<Shape> {
        None
    }
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn version(&self) -> u32 {
        (**self).version()
    }

    fn validate(&self, raw: &Value) -> Result<Value, Diagnostic> {
        (**self).validate(raw)
    }

    fn describe(&self) -> Option<Shape> {
        (**self).describe()
    }
}

/// Validator backed by a serde type.
///
/// The version tag must equal `T::VERSION`; the rest of the record must
/// deserialize into `T`. Unknown keys are dropped unless `T` opts into
/// `#[serde(deny_unknown_fields)]`.
///
/// # Example
///
/// ```
/// use schema_migrate::{TypedValidator, Validator, VersionedSchema};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Window { width: u32 }
///
/// impl VersionedSchema for Window {
///     const VERSION: u32 = 1;
/// }
///
/// let v = TypedValidator::<Window>::new();
/// let out = v.validate(&json!({"width": 640, "dpi": 2, "version": 1})).unwrap();
/// assert_eq!(out, json!({"width": 640, "version": 1}));
/// assert!(v.validate(&json!({"width": 640, "version": 0})).is_err());
/// ```
pub struct TypedValidator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedValidator<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedValidator")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Validator for TypedValidator<T>
where
    T: VersionedSchema + Serialize + DeserializeOwned,
{
    fn version(&self) -> u32 {
        T::VERSION
    }

    fn validate(&self, raw: &Value) -> Result<Value, Diagnostic> {
        check_version_tag(raw, T::VERSION)?;
        let typed: T = serde_json::from_value(raw.clone())?;
        let out = serde_json::to_value(&typed)?;
        Ok(tag_version(out, T::VERSION))
    }
}

/// Ensure `raw` is an object whose `version` equals `expected`.
pub fn check_version_tag(raw: &Value, expected: u32) -> Result<(), Diagnostic> {
    let Some(obj) = raw.as_object() else {
        return Err(Diagnostic::single(
            "$",
            format!("expected object, got {}", json_type_name(raw)),
        ));
    };
    match obj.get(VERSION_FIELD) {
        Some(tag) if tag.as_f64() == Some(f64::from(expected)) => Ok(()),
        Some(tag) => Err(Diagnostic::single(
            VERSION_FIELD,
            format!("expected literal {expected}, got {tag}"),
        )),
        None => Err(Diagnostic::single(
            VERSION_FIELD,
            "required version tag is missing",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Tagged {
        name: bool,
        version: u32,
    }

    impl VersionedSchema for Tagged {
        const VERSION: u32 = 1;
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Untagged {
        klep: bool,
        #[serde(default)]
        version: Option<u32>,
    }

    impl VersionedSchema for Untagged {
        const VERSION: u32 = 2;
    }

    #[test]
    fn typed_validator_keeps_own_version_field() {
        let v = TypedValidator::<Tagged>::new();
        assert_eq!(v.version(), 1);
        let out = v.validate(&json!({"name": true, "version": 1})).unwrap();
        assert_eq!(out, json!({"name": true, "version": 1}));
    }

    #[test]
    fn typed_validator_reports_serde_failures() {
        let v = TypedValidator::<Tagged>::new();
        let err = v.validate(&json!({"name": "true", "version": 1})).unwrap_err();
        assert_eq!(err.issues[0].path, "$");
        assert!(err.issues[0].message.contains("invalid type"));
    }

    #[test]
    fn typed_validator_rejects_wrong_tag() {
        let v = TypedValidator::<Tagged>::new();
        let err = v.validate(&json!({"name": true, "version": 0})).unwrap_err();
        assert_eq!(err.issues[0].path, "version");
        let err = v.validate(&json!({"name": true})).unwrap_err();
        assert!(err.issues[0].message.contains("missing"));
        let err = v.validate(&json!(null)).unwrap_err();
        assert!(err.issues[0].message.contains("got null"));
    }

    #[test]
    fn deny_unknown_fields_is_honoured() {
        let v = TypedValidator::<Untagged>::new();
        assert!(v.validate(&json!({"klep": true, "version": 2})).is_ok());
        assert!(v
            .validate(&json!({"klep": true, "other": 1, "version": 2}))
            .is_err());
    }

    #[test]
    fn boxed_validators_delegate() {
        let boxed: Box<dyn Validator> = Box::new(Shape::new(4));
        assert_eq!(boxed.version(), 4);
        assert!(boxed.describe().is_some());
        assert!(TypedValidator::<Tagged>::new().describe().is_none());
    }
}
