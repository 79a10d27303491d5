//! Declarative record shapes.
//!
//! A [`Shape`] describes one schema generation as an object of named
//! [`FieldRule`]s. It implements [`Validator`] so it can be registered with a
//! [`SchemaManager`](crate::SchemaManager) directly, and it is plain serde
//! data so whole shape sets can be loaded from TOML or JSON.
//!
//! Validation collects every issue instead of stopping at the first one, and
//! the validated output contains only the declared fields plus `version`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Diagnostic;
use crate::schema::VERSION_FIELD;
use crate::validator::Validator;

/// Rule for a single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldRule {
    String,
    Bool,
    /// Any JSON number.
    Number,
    /// A number without a fractional part.
    Integer,
    /// Exactly this value.
    Literal { value: Value },
    /// The field may be absent. When present it must satisfy `inner`.
    Optional { inner: Box<FieldRule> },
    Array { items: Box<FieldRule> },
    Object {
        #[serde(default)]
        fields: BTreeMap<String, FieldRule>,
        #[serde(default)]
        strict: bool,
    },
    /// Anything, passed through untouched.
    Any,
}

impl FieldRule {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    pub fn optional(inner: FieldRule) -> Self {
        Self::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn array(items: FieldRule) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    pub fn object(fields: impl IntoIterator<Item = (String, FieldRule)>) -> Self {
        Self::Object {
            fields: fields.into_iter().collect(),
            strict: false,
        }
    }

    /// Short human-readable name used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Bool => "boolean".into(),
            Self::Number => "number".into(),
            Self::Integer => "integer".into(),
            Self::Literal { value } => format!("literal {value}"),
            Self::Optional { inner } => format!("optional {}", inner.type_name()),
            Self::Array { items } => format!("array of {}", items.type_name()),
            Self::Object { .. } => "object".into(),
            Self::Any => "any".into(),
        }
    }

    fn check(&self, value: Option<&Value>, path: &str, diag: &mut Diagnostic) -> Option<Value> {
        let value = match (self, value) {
            (Self::Optional { .. }, None) => return None,
            (Self::Optional { inner }, Some(v)) => return inner.check(Some(v), path, diag),
            (_, None) => {
                diag.push(path, format!("required {} is missing", self.type_name()));
                return None;
            }
            (_, Some(v)) => v,
        };

        let ok = match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::Integer => is_integral(value),
            Self::Literal { value: expected } => literal_eq(expected, value),
            Self::Any => true,
            Self::Array { items } => {
                let Some(elements) = value.as_array() else {
                    mismatch(diag, path, self, value);
                    return None;
                };
                let checked: Vec<Value> = elements
                    .iter()
                    .enumerate()
                    .filter_map(|(i, el)| items.check(Some(el), &format!("{path}[{i}]"), diag))
                    .collect();
                return Some(Value::Array(checked));
            }
            Self::Object { fields, strict } => {
                let Some(obj) = value.as_object() else {
                    mismatch(diag, path, self, value);
                    return None;
                };
                return Some(Value::Object(check_fields(obj, fields, *strict, path, diag)));
            }
            Self::Optional { .. } => unreachable!("optional handled above"),
        };

        if ok {
            Some(value.clone())
        } else {
            mismatch(diag, path, self, value);
            None
        }
    }
}

/// Shape of one schema generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Generation this shape belongs to. The `version` field of validated
    /// data must equal it.
    pub version: u32,
    /// Reject fields that are not declared instead of dropping them.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRule>,
}

impl Shape {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            strict: false,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field rule.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.insert(name.into(), rule);
        self
    }

    /// Reject undeclared fields.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Validate `raw` against this shape, returning the sanitized record.
    pub fn check(&self, raw: &Value) -> Result<Value, Diagnostic> {
        let mut diag = Diagnostic::new();
        let Some(obj) = raw.as_object() else {
            diag.push("$", format!("expected object, got {}", json_type_name(raw)));
            return Err(diag);
        };

        let expected = Value::from(self.version);
        match obj.get(VERSION_FIELD) {
            Some(tag) if literal_eq(&expected, tag) => {}
            Some(tag) => diag.push(
                VERSION_FIELD,
                format!("expected literal {}, got {tag}", self.version),
            ),
            None => diag.push(VERSION_FIELD, "required version tag is missing"),
        }

        let mut out = check_fields(obj, &self.fields, self.strict, "", &mut diag);
        out.insert(VERSION_FIELD.to_string(), expected);

        diag.into_result().map(|()| Value::Object(out))
    }
}

impl Validator for Shape {
    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self, raw: &Value) -> Result<Value, Diagnostic> {
        self.check(raw)
    }

    fn describe(&self) -> Option<Shape> {
        Some(self.clone())
    }
}

fn check_fields(
    obj: &Map<String, Value>,
    fields: &BTreeMap<String, FieldRule>,
    strict: bool,
    prefix: &str,
    diag: &mut Diagnostic,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, rule) in fields {
        // The root version tag is checked separately.
        if prefix.is_empty() && name == VERSION_FIELD {
            continue;
        }
        let path = make_path(prefix, name);
        if let Some(v) = rule.check(obj.get(name), &path, diag) {
            out.insert(name.clone(), v);
        }
    }
    if strict {
        for key in obj.keys() {
            let declared = fields.contains_key(key) || (prefix.is_empty() && key == VERSION_FIELD);
            if !declared {
                diag.push(make_path(prefix, key), "undeclared field");
            }
        }
    }
    out
}

fn mismatch(diag: &mut Diagnostic, path: &str, rule: &FieldRule, found: &Value) {
    let got = match rule {
        FieldRule::Literal { .. } => found.to_string(),
        _ => json_type_name(found).to_string(),
    };
    diag.push(path, format!("expected {}, got {got}", rule.type_name()));
}

fn make_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn is_integral(v: &Value) -> bool {
    match v.as_f64() {
        Some(f) => v.is_i64() || v.is_u64() || f.fract() == 0.0,
        None => false,
    }
}

/// Literal comparison. Numbers compare by value so that `2` matches `2.0`.
fn literal_eq(expected: &Value, found: &Value) -> bool {
    match (expected.as_f64(), found.as_f64()) {
        (Some(a), Some(b)) if expected.is_number() && found.is_number() => a == b,
        _ => expected == found,
    }
}

/// JSON type name of a value, as shown in diagnostics.
pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v0() -> Shape {
        Shape::new(0)
            .field("name", FieldRule::String)
            .field("otherData", FieldRule::literal("lol"))
            .field("temp", FieldRule::Number)
    }

    #[test]
    fn accepts_matching_record_and_drops_unknown_keys() {
        let out = v0()
            .check(&json!({"name": "a", "otherData": "lol", "temp": 4, "extra": 1, "version": 0}))
            .unwrap();
        assert_eq!(out, json!({"name": "a", "otherData": "lol", "temp": 4, "version": 0}));
    }

    #[test]
    fn collects_every_issue() {
        let err = v0()
            .check(&json!({"name": 5, "otherData": "nope", "version": 1}))
            .unwrap_err();
        let paths: Vec<&str> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["version", "name", "otherData", "temp"]);
        assert!(err.to_string().contains("expected string, got number"));
        assert!(err.to_string().contains("expected literal \"lol\", got \"nope\""));
    }

    #[test]
    fn root_must_be_object() {
        let err = v0().check(&json!("hello")).unwrap_err();
        assert_eq!(err.issues[0].path, "$");
        assert!(err.issues[0].message.contains("got string"));
    }

    #[test]
    fn strict_rejects_undeclared() {
        let shape = Shape::new(1).field("flag", FieldRule::Bool).strict();
        assert!(shape.check(&json!({"flag": true, "version": 1})).is_ok());
        let err = shape
            .check(&json!({"flag": true, "stray": 0, "version": 1}))
            .unwrap_err();
        assert_eq!(err.issues[0].path, "stray");
    }

    #[test]
    fn nested_rules() {
        let shape = Shape::new(2)
            .field("tags", FieldRule::array(FieldRule::String))
            .field("note", FieldRule::optional(FieldRule::String))
            .field(
                "window",
                FieldRule::object([
                    ("width".to_string(), FieldRule::Integer),
                    ("height".to_string(), FieldRule::Integer),
                ]),
            );

        let ok = shape
            .check(&json!({"tags": ["a"], "window": {"width": 3, "height": 4.0}, "version": 2}))
            .unwrap();
        assert!(ok.get("note").is_none());

        let err = shape
            .check(&json!({"tags": ["a", 1], "note": false, "window": {"width": 1.5}, "version": 2}))
            .unwrap_err();
        let paths: Vec<&str> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["note", "tags[1]", "window.height", "window.width"]);
    }

    #[test]
    fn version_literal_matches_float_form() {
        let shape = Shape::new(3);
        assert_eq!(shape.check(&json!({"version": 3.0})).unwrap(), json!({"version": 3}));
    }

    #[test]
    fn rules_roundtrip_through_toml() {
        let toml_src = r#"
            version = 0
            strict = true
            [fields]
            name = { type = "string" }
            otherData = { type = "literal", value = "lol" }
            note = { type = "optional", inner = { type = "string" } }
        "#;
        let shape: Shape = toml::from_str(toml_src).unwrap();
        assert!(shape.strict);
        assert_eq!(shape.fields["otherData"], FieldRule::literal("lol"));
        assert_eq!(
            shape.fields["note"],
            FieldRule::optional(FieldRule::String)
        );
    }
}
