use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::converter::Converter;
use crate::error::SchemaError;
use crate::schema::declared_version;
use crate::shape::Shape;
use crate::validator::Validator;

/// Produces an unvalidated instance of the latest shape.
pub type DefaultFactory = Box<dyn Fn() -> Value + Send + Sync>;

/// Configuration for the schema manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerConfig {
    /// If true, the output of a migration chain is validated against the
    /// latest shape before it is returned. Only the caller's declared
    /// version is validated otherwise; converter output is trusted.
    pub validate_migrated_output: bool,
}

/// Validates versioned data and migrates it, one step at a time, to the
/// latest schema version.
///
/// A manager owns one validator per version `0..=latest` and one converter
/// per transition `v → v+1`. It is immutable after construction and can be
/// shared freely between threads.
///
/// # Example
///
/// ```
/// use schema_migrate::{value_converter, FieldRule, SchemaManager, Shape};
/// use serde_json::json;
///
/// let manager = SchemaManager::builder("Settings")
///     .validator(Shape::new(0).field("dark", FieldRule::String))
///     .validator(Shape::new(1).field("dark", FieldRule::Bool))
///     .converter(value_converter(0, |v| {
///         Ok(json!({"dark": v["dark"] == "yes", "version": 1}))
///     }))
///     .default_value(json!({"dark": false, "version": 1}))
///     .build()
///     .unwrap();
///
/// let latest = manager.update_schema(Some(&json!({"dark": "yes", "version": 0}))).unwrap();
/// assert_eq!(latest, json!({"dark": true, "version": 1}));
/// assert_eq!(manager.get_default().unwrap(), json!({"dark": false, "version": 1}));
/// ```
pub struct SchemaManager {
    name: String,
    validators: Vec<Box<dyn Validator>>,
    converters: Vec<Box<dyn Converter>>,
    default: Option<DefaultFactory>,
    config: ManagerConfig,
}

impl SchemaManager {
    /// Create a manager, checking that the validator and converter lists
    /// line up: validator `i` accepts version `i`, converter `i` migrates
    /// `i → i+1`, and there is exactly one more validator than converters.
    pub fn new(
        name: impl Into<String>,
        validators: Vec<Box<dyn Validator>>,
        converters: Vec<Box<dyn Converter>>,
        default: Option<DefaultFactory>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        validate_chain(&name, &validators, &converters)?;
        Ok(Self {
            name,
            validators,
            converters,
            default,
            config: ManagerConfig::default(),
        })
    }

    /// Create a builder for incremental construction.
    pub fn builder(name: impl Into<String>) -> SchemaManagerBuilder {
        SchemaManagerBuilder {
            name: name.into(),
            validators: Vec::new(),
            converters: Vec::new(),
            default: None,
            config: ManagerConfig::default(),
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The latest schema version (equal to the number of converters).
    pub fn latest_version(&self) -> u32 {
        self.converters.len() as u32
    }

    /// Validators in version order, for callers that expose accepted shapes.
    pub fn schemas(&self) -> &[Box<dyn Validator>] {
        &self.validators
    }

    /// Declarative shape of every version, where the validator provides one.
    pub fn describe(&self) -> Vec<(u32, Option<Shape>)> {
        self.validators
            .iter()
            .map(|v| (v.version(), v.describe()))
            .collect()
    }

    /// Check if data at `version` needs migration.
    pub fn needs_migration(&self, version: u32) -> bool {
        version != self.latest_version()
    }

    /// List all registered conversion steps as (from, to) pairs.
    pub fn registered_steps(&self) -> Vec<(u32, u32)> {
        self.converters
            .iter()
            .map(|c| (c.source_version(), c.target_version()))
            .collect()
    }

    /// Whether a default factory is configured.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Validate `data` against its declared version and migrate it to the
    /// latest version.
    ///
    /// `None` stands for absent input, `Some(Value::Null)` for null input;
    /// both are rejected. Only the declared version is validated; each
    /// converter's output is trusted to match the next version unless
    /// [`ManagerConfig::validate_migrated_output`] is set.
    pub fn update_schema(&self, data: Option<&Value>) -> Result<Value, SchemaError> {
        let (version, validated) = self.validate_declared(data)?;
        self.migrate_validated(validated, version)
    }

    /// Validate `data` against the validator of its declared version without
    /// migrating it. Returns the declared version and the validated value.
    pub fn validate_declared(&self, data: Option<&Value>) -> Result<(u32, Value), SchemaError> {
        validate_declared(&self.name, &self.validators, data)
    }

    /// Shorthand for `update_schema(Some(data))`.
    pub fn migrate(&self, data: &Value) -> Result<Value, SchemaError> {
        self.update_schema(Some(data))
    }

    /// Like [`update_schema`](Self::update_schema), decoding the latest
    /// record into `T`.
    pub fn update_schema_as<T: DeserializeOwned>(
        &self,
        data: Option<&Value>,
    ) -> Result<T, SchemaError> {
        let latest = self.update_schema(data)?;
        self.decode_latest(latest)
    }

    /// Produce the default value for the latest version.
    ///
    /// The factory output is validated against the latest shape; a factory
    /// that produces an invalid record is reported, not accepted.
    pub fn get_default(&self) -> Result<Value, SchemaError> {
        let factory = self
            .default
            .as_ref()
            .ok_or_else(|| missing_default(&self.name))?;
        validate_default(&self.name, &self.validators, &factory())
    }

    /// Like [`get_default`](Self::get_default), decoding into `T`.
    pub fn get_default_as<T: DeserializeOwned>(&self) -> Result<T, SchemaError> {
        let value = self.get_default()?;
        self.decode_latest(value)
    }

    fn migrate_validated(&self, validated: Value, version: u32) -> Result<Value, SchemaError> {
        let latest = self.latest_version();
        if version == latest {
            return Ok(validated);
        }

        let mut current = validated;
        let mut step = version;
        while step < latest {
            let converter = self.converters.get(step as usize).ok_or_else(|| {
                SchemaError::internal(format!("No converter found for version {step}"))
            })?;
            current = converter.convert(current)?;
            step += 1;
        }

        if self.config.validate_migrated_output {
            return validate_at(&self.name, &self.validators, &current, latest);
        }
        Ok(current)
    }

    /// Decode a latest-version value into `T`. Failures are `Internal`:
    /// validated data is expected to fit the latest type.
    pub fn decode_latest<T: DeserializeOwned>(&self, value: Value) -> Result<T, SchemaError> {
        serde_json::from_value(value).map_err(|e| {
            SchemaError::internal(format!(
                "failed to decode latest {} data: {e}",
                self.name
            ))
        })
    }
}

impl fmt::Debug for SchemaManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaManager")
            .field("name", &self.name)
            .field("latest_version", &self.latest_version())
            .field("steps", &self.registered_steps())
            .field("has_default", &self.has_default())
            .field("config", &self.config)
            .finish()
    }
}

/// Error for a manager or shape set without a default.
pub(crate) fn missing_default(name: &str) -> SchemaError {
    SchemaError::not_found(format!("No default schema found for {name}."))
}

/// Reject absent input, extract the declared version, range-check it
/// against `validators` and validate the data at that version.
pub(crate) fn validate_declared<V: Validator>(
    name: &str,
    validators: &[V],
    data: Option<&Value>,
) -> Result<(u32, Value), SchemaError> {
    let data = match data {
        None | Some(Value::Null) => {
            return Err(SchemaError::invalid_argument(
                "Input data either null | undefined.",
            ))
        }
        Some(data) => data,
    };

    let declared = declared_version(data)
        .ok_or_else(|| SchemaError::invalid_argument("Couldn't get input data version."))?;

    let latest = validators.len().saturating_sub(1) as u32;
    let version = match u32::try_from(declared) {
        Ok(v) if v <= latest => v,
        _ => {
            return Err(SchemaError::invalid_argument(format!(
                "Failed to get a valid version number found \"{declared}\" expected [0, {latest}]."
            )))
        }
    };

    let validated = validate_at(name, validators, data, version)?;
    Ok((version, validated))
}

/// Validate a default candidate against the latest validator.
pub(crate) fn validate_default<V: Validator>(
    name: &str,
    validators: &[V],
    candidate: &Value,
) -> Result<Value, SchemaError> {
    let latest = validators.len().saturating_sub(1) as u32;
    validate_at(name, validators, candidate, latest)
}

fn validate_at<V: Validator>(
    name: &str,
    validators: &[V],
    data: &Value,
    version: u32,
) -> Result<Value, SchemaError> {
    let validator = validators.get(version as usize).ok_or_else(|| {
        SchemaError::internal(format!("No validator found for version {version}"))
    })?;
    validator
        .validate(data)
        .map_err(|diagnostic| SchemaError::ValidationFailed {
            name: name.to_string(),
            version,
            diagnostic,
        })
}

/// Check that the chain is complete and strictly ordered.
fn validate_chain(
    name: &str,
    validators: &[Box<dyn Validator>],
    converters: &[Box<dyn Converter>],
) -> Result<(), SchemaError> {
    if validators.is_empty() {
        return Err(SchemaError::internal(format!(
            "schema manager `{name}` requires at least one validator"
        )));
    }
    if validators.len() != converters.len() + 1 {
        return Err(SchemaError::internal(format!(
            "schema manager `{name}` has {} validators and {} converters; expected exactly one more validator than converters",
            validators.len(),
            converters.len()
        )));
    }
    for (i, v) in validators.iter().enumerate() {
        if v.version() as usize != i {
            return Err(SchemaError::internal(format!(
                "schema manager `{name}`: validator at position {i} accepts version {}",
                v.version()
            )));
        }
    }
    for (i, c) in converters.iter().enumerate() {
        let (from, to) = (c.source_version(), c.target_version());
        if from as usize != i || to as usize != i + 1 {
            return Err(SchemaError::internal(format!(
                "schema manager `{name}`: converter at position {i} migrates v{from}→v{to}, expected v{i}→v{}",
                i + 1
            )));
        }
    }
    Ok(())
}

/// Builder for constructing a [`SchemaManager`].
pub struct SchemaManagerBuilder {
    name: String,
    validators: Vec<Box<dyn Validator>>,
    converters: Vec<Box<dyn Converter>>,
    default: Option<DefaultFactory>,
    config: ManagerConfig,
}

impl SchemaManagerBuilder {
    /// Append the validator for the next version.
    pub fn validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Append several validators in order.
    pub fn validators<I>(mut self, validators: I) -> Self
    where
        I: IntoIterator,
        I::Item: Validator + 'static,
    {
        for v in validators {
            self.validators.push(Box::new(v));
        }
        self
    }

    /// Append the converter for the next transition.
    pub fn converter<C: Converter + 'static>(mut self, converter: C) -> Self {
        self.converters.push(Box::new(converter));
        self
    }

    /// Set the default factory.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(Box::new(factory));
        self
    }

    /// Use a fixed value as the default.
    pub fn default_value(self, value: Value) -> Self {
        self.default_with(move || value.clone())
    }

    /// Set the manager configuration.
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate migration output against the latest shape.
    pub fn validate_migrated_output(mut self, enabled: bool) -> Self {
        self.config.validate_migrated_output = enabled;
        self
    }

    /// Build the manager, checking the chain.
    pub fn build(self) -> Result<SchemaManager, SchemaError> {
        let mut manager =
            SchemaManager::new(self.name, self.validators, self.converters, self.default)?;
        manager.config = self.config;
        Ok(manager)
    }
}
