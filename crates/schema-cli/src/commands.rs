use std::fmt::Write as _;
use std::fs;

use schema_migrate::{ShapeSet, Value};
use schema_store::result_span;
use schema_store::span::in_result_span;

type Result<T = String> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Read and parse the shape set at `path`.
pub fn load_shapes(path: &str) -> Result<ShapeSet> {
    let src = fs::read_to_string(path).map_err(|e| format!("failed to read `{path}`: {e}"))?;
    let set = ShapeSet::from_toml(&src)?;
    tracing::debug!(path, name = %set.name, latest = set.latest_version(), "loaded shape set");
    Ok(set)
}

/// `schemactl inspect`: Name, latest version and fields of every version.
pub fn inspect(set: &ShapeSet) -> Result {
    let mut out = String::new();
    writeln!(out, "Schema: {}", set.name)?;
    writeln!(out, "Latest version: v{}", set.latest_version())?;
    writeln!(
        out,
        "Default: {}",
        if set.default.is_some() { "yes" } else { "no" }
    )?;

    for shape in &set.versions {
        writeln!(out)?;
        let mode = if shape.strict { " (strict)" } else { "" };
        writeln!(out, "  v{}{mode}", shape.version)?;
        if shape.fields.is_empty() {
            writeln!(out, "    (no fields)")?;
        }
        for (name, rule) in &shape.fields {
            writeln!(out, "    {name:<20} {}", rule.type_name())?;
        }
    }
    Ok(out)
}

/// `schemactl check <file>`: Validate a document against the shape of its
/// declared version.
pub fn check(set: &ShapeSet, file: &str) -> Result {
    in_result_span(result_span!("schemactl.check", file), || {
        let raw = fs::read(file).map_err(|e| format!("failed to read `{file}`: {e}"))?;
        let data: Value =
            serde_json::from_slice(&raw).map_err(|e| format!("`{file}` is not valid JSON: {e}"))?;
        check_value(set, &data)
    })
}

fn check_value(set: &ShapeSet, data: &Value) -> Result {
    let (version, _) = set.validate_declared(Some(data))?;
    let latest = set.latest_version();

    let mut out = String::new();
    write!(out, "{}: v{version} is valid", set.name)?;
    if version == latest {
        writeln!(out, " (latest)")?;
    } else {
        writeln!(out, " (needs migration to v{latest})")?;
    }
    Ok(out)
}

/// `schemactl default`: Print the default record after validating it
/// against the latest shape.
pub fn default(set: &ShapeSet, compact: bool) -> Result {
    let value = set.validated_default()?;
    let mut out = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    out.push('\n');
    Ok(out)
}
