use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::schema::{tag_version, VersionedSchema};

/// A single conversion step that transforms data from one version to the next.
///
/// Converters form a linear chain: v0→v1, v1→v2, etc. Each step receives
/// data that was either validated for its source version or produced by
/// the previous converter, and must be **deterministic and pure**.
pub trait Converter: Send + Sync {
    /// Source version.
    fn source_version(&self) -> u32;

    /// Target version. Always one step above the source for a well-formed
    /// converter; the manager rejects anything else at construction.
    fn target_version(&self) -> u32 {
        self.source_version() + 1
    }

    /// Transform a source-version record into a target-version record.
    fn convert(&self, data: Value) -> Result<Value, SchemaError>;
}

impl<C: Converter + ?Sized> Converter for Box<C> {
    fn source_version(&self) -> u32 {
        (**self).source_version()
    }

    fn target_version(&self) -> u32 {
        (**self).target_version()
    }

    fn convert(&self, data: Value) -> Result<Value, SchemaError> {
        (**self).convert(data)
    }
}

/// Deserialize converter input into its typed form.
///
/// The input was validated (or produced by a trusted converter), so a
/// failure here is a logic error and reported as `Internal`.
pub fn decode<T: DeserializeOwned>(data: Value) -> Result<T, SchemaError> {
    serde_json::from_value(data).map_err(|e| {
        SchemaError::internal(format!(
            "failed to decode {}: {e}",
            std::any::type_name::<T>()
        ))
    })
}

/// Serialize a converter result and stamp it with `version`.
pub fn encode<T: Serialize>(value: &T, version: u32) -> Result<Value, SchemaError> {
    let out = serde_json::to_value(value).map_err(|e| {
        SchemaError::internal(format!(
            "failed to encode {}: {e}",
            std::any::type_name::<T>()
        ))
    })?;
    Ok(tag_version(out, version))
}

/// Typed converter built from a closure `P -> Result<N, SchemaError>`.
///
/// Source and target versions come from the `VersionedSchema` impls of
/// `P` and `N`, so a chain assembled from typed converters cannot be
/// mislabelled.
pub struct FnConverter<P, N, F> {
    f: F,
    _marker: PhantomData<fn(P) -> N>,
}

impl<P, N, F> fmt::Debug for FnConverter<P, N, F>
where
    P: VersionedSchema,
    N: VersionedSchema,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnConverter(v{}→v{})", P::VERSION, N::VERSION)
    }
}

impl<P, N, F> Converter for FnConverter<P, N, F>
where
    P: VersionedSchema + DeserializeOwned,
    N: VersionedSchema + Serialize,
    F: Fn(P) -> Result<N, SchemaError> + Send + Sync,
{
    fn source_version(&self) -> u32 {
        P::VERSION
    }

    fn target_version(&self) -> u32 {
        N::VERSION
    }

    fn convert(&self, data: Value) -> Result<Value, SchemaError> {
        let prev: P = decode(data)?;
        let next = (self.f)(prev)?;
        encode(&next, N::VERSION)
    }
}

/// Build a typed converter from a fallible closure.
///
/// # Example
///
/// ```
/// use schema_migrate::{convert_fn, Converter, SchemaError, VersionedSchema};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct V0 { name: String }
/// impl VersionedSchema for V0 { const VERSION: u32 = 0; }
///
/// #[derive(Serialize)]
/// struct V1 { name: bool }
/// impl VersionedSchema for V1 { const VERSION: u32 = 1; }
///
/// let step = convert_fn(|old: V0| Ok::<_, SchemaError>(V1 { name: old.name == "true" }));
/// assert_eq!((step.source_version(), step.target_version()), (0, 1));
/// let out = step.convert(json!({"name": "true", "version": 0})).unwrap();
/// assert_eq!(out, json!({"name": true, "version": 1}));
/// ```
pub fn convert_fn<P, N, F>(f: F) -> FnConverter<P, N, F>
where
    P: VersionedSchema + DeserializeOwned,
    N: VersionedSchema + Serialize,
    F: Fn(P) -> Result<N, SchemaError> + Send + Sync,
{
    FnConverter {
        f,
        _marker: PhantomData,
    }
}

/// Untyped converter operating directly on JSON values.
pub struct ValueConverter<F> {
    from: u32,
    f: F,
}

impl<F> fmt::Debug for ValueConverter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueConverter(v{}→v{})", self.from, self.from + 1)
    }
}

impl<F> Converter for ValueConverter<F>
where
    F: Fn(Value) -> Result<Value, SchemaError> + Send + Sync,
{
    fn source_version(&self) -> u32 {
        self.from
    }

    fn convert(&self, data: Value) -> Result<Value, SchemaError> {
        (self.f)(data)
    }
}

/// Build an untyped converter for the step `from → from + 1`.
///
/// The closure's output is returned as-is; it is responsible for setting
/// the new `version` tag.
pub fn value_converter<F>(from: u32, f: F) -> ValueConverter<F>
where
    F: Fn(Value) -> Result<Value, SchemaError> + Send + Sync,
{
    ValueConverter { from, f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Celsius {
        temp: f64,
    }

    impl VersionedSchema for Celsius {
        const VERSION: u32 = 3;
    }

    #[derive(Serialize)]
    struct Kelvin {
        temp: f64,
    }

    impl VersionedSchema for Kelvin {
        const VERSION: u32 = 4;
    }

    #[test]
    fn typed_converter_tags_output() {
        let step = convert_fn(|c: Celsius| Ok(Kelvin { temp: c.temp + 273.0 }));
        assert_eq!(step.source_version(), 3);
        assert_eq!(step.target_version(), 4);
        let out = step.convert(json!({"temp": 1.0, "version": 3})).unwrap();
        assert_eq!(out, json!({"temp": 274.0, "version": 4}));
        assert_eq!(format!("{step:?}"), "FnConverter(v3→v4)");
    }

    #[test]
    fn undecodable_input_is_internal() {
        let step = convert_fn(|c: Celsius| Ok(Kelvin { temp: c.temp }));
        let err = step.convert(json!({"temp": "hot"})).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Internal);
    }

    #[test]
    fn closure_errors_propagate_unchanged() {
        let step = convert_fn(|_: Celsius| -> Result<Kelvin, SchemaError> {
            Err(SchemaError::invalid_argument("below absolute zero"))
        });
        let err = step.convert(json!({"temp": -500.0, "version": 3})).unwrap_err();
        assert_eq!(err, SchemaError::invalid_argument("below absolute zero"));
    }

    #[test]
    fn value_converter_defaults_target() {
        let step = value_converter(7, |mut v| {
            v["version"] = json!(8);
            Ok(v)
        });
        assert_eq!(step.target_version(), 8);
        assert_eq!(step.convert(json!({"version": 7})).unwrap(), json!({"version": 8}));

        let boxed: Box<dyn Converter> = Box::new(step);
        assert_eq!((boxed.source_version(), boxed.target_version()), (7, 8));
    }
}
