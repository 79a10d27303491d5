use serde_json::Value;

/// Name of the discriminant field every versioned record carries.
pub const VERSION_FIELD: &str = "version";

/// Trait for typed records that represent one generation of a schema.
///
/// The `#[versioned_schema(version = N)]` attribute macro generates this
/// implementation. A type may either carry its own `version` field or leave
/// it out, in which case [`TypedValidator`](crate::TypedValidator) injects
/// it into the validated output.
pub trait VersionedSchema: Sized {
    /// Generation number of this shape.
    const VERSION: u32;
}

/// Extract the declared version tag from an untyped value.
///
/// Returns `None` when the value is not an object, has no `version` field,
/// or the field is not an integral number. Negative and oversized numbers
/// are returned as-is so callers can report them as out of range.
pub fn declared_version(data: &Value) -> Option<i128> {
    let tag = data.as_object()?.get(VERSION_FIELD)?;
    if let Some(v) = tag.as_i64() {
        return Some(i128::from(v));
    }
    if let Some(v) = tag.as_u64() {
        return Some(i128::from(v));
    }
    // Float casts saturate, so huge integral floats stay out of range.
    tag.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i128)
}

/// Stamp `version` onto an object value. Non-objects are returned unchanged.
pub fn tag_version(mut value: Value, version: u32) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert(VERSION_FIELD.to_string(), Value::from(version));
    }
    value
}
