//! End-to-end migration through a three-version chain.
//!
//! v0 `{name: string, otherData: "lol", temp: number}` →
//! v1 `{name: bool}` →
//! v2 `{klep: bool, otherData: "lol"}`

use schema_migrate::{
    convert_fn, value_converter, ErrorKind, FieldRule, SchemaError, SchemaManager, Shape,
    TypedValidator, Validator, VersionedSchema,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Lol {
    #[serde(rename = "lol")]
    Lol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Version0 {
    name: String,
    other_data: Lol,
    temp: f64,
}

impl VersionedSchema for Version0 {
    const VERSION: u32 = 0;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Version1 {
    name: bool,
}

impl VersionedSchema for Version1 {
    const VERSION: u32 = 1;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Version2 {
    klep: bool,
    other_data: Lol,
}

impl VersionedSchema for Version2 {
    const VERSION: u32 = 2;
}

fn typed_manager() -> SchemaManager {
    SchemaManager::builder("Test")
        .validator(TypedValidator::<Version0>::new())
        .validator(TypedValidator::<Version1>::new())
        .validator(TypedValidator::<Version2>::new())
        .converter(convert_fn(|v0: Version0| {
            Ok(Version1 {
                name: v0.name == "true",
            })
        }))
        .converter(convert_fn(|v1: Version1| {
            Ok(Version2 {
                klep: v1.name,
                other_data: Lol::Lol,
            })
        }))
        .default_with(|| json!({"klep": false, "otherData": "lol", "version": 2}))
        .build()
        .unwrap()
}

fn shape_manager() -> SchemaManager {
    SchemaManager::builder("Test")
        .validator(
            Shape::new(0)
                .field("name", FieldRule::String)
                .field("otherData", FieldRule::literal("lol"))
                .field("temp", FieldRule::Number),
        )
        .validator(Shape::new(1).field("name", FieldRule::Bool))
        .validator(
            Shape::new(2)
                .field("klep", FieldRule::Bool)
                .field("otherData", FieldRule::literal("lol")),
        )
        .converter(value_converter(0, |v| {
            Ok(json!({"name": v["name"] == "true", "version": 1}))
        }))
        .converter(value_converter(1, |v| {
            Ok(json!({"klep": v["name"].clone(), "otherData": "lol", "version": 2}))
        }))
        .default_value(json!({"klep": false, "otherData": "lol", "version": 2}))
        .build()
        .unwrap()
}

fn managers() -> Vec<SchemaManager> {
    vec![typed_manager(), shape_manager()]
}

#[test]
fn migrates_v0_to_latest() {
    let input = json!({"name": "true", "otherData": "lol", "temp": 43, "version": 0});
    for manager in managers() {
        let out = manager.update_schema(Some(&input)).unwrap();
        assert_eq!(out, json!({"klep": true, "otherData": "lol", "version": 2}));
    }
}

#[test]
fn migrates_v1_to_latest() {
    for manager in managers() {
        let out = manager
            .update_schema(Some(&json!({"name": false, "version": 1})))
            .unwrap();
        assert_eq!(out, json!({"klep": false, "otherData": "lol", "version": 2}));
    }
}

#[test]
fn typed_result() {
    let latest: Version2 = typed_manager()
        .update_schema_as(Some(&json!({"name": "nope", "otherData": "lol", "temp": 1, "version": 0})))
        .unwrap();
    assert_eq!(
        latest,
        Version2 {
            klep: false,
            other_data: Lol::Lol
        }
    );
}

#[test]
fn latest_input_is_returned_unchanged() {
    let input = json!({"klep": true, "otherData": "lol", "version": 2});
    for manager in managers() {
        assert_eq!(manager.update_schema(Some(&input)).unwrap(), input);
    }
}

#[test]
fn null_and_undefined_inputs() {
    for manager in managers() {
        for err in [
            manager.update_schema(None).unwrap_err(),
            manager.update_schema(Some(&Value::Null)).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert!(err.to_string().contains("Input data either null | undefined"));
        }
    }
}

#[test]
fn out_of_range_versions() {
    for manager in managers() {
        for bad in [-1, 3, 100] {
            let err = manager
                .update_schema(Some(&json!({"klep": true, "version": bad})))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert!(err.to_string().contains("expected [0, 2]"), "{err}");
        }
    }
}

#[test]
fn invalid_shape_for_declared_version() {
    for manager in managers() {
        let err = manager
            .update_schema(Some(&json!({"name": "true", "otherData": "rofl", "temp": 1, "version": 0})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let msg = err.to_string();
        assert!(msg.contains("Test"));
        assert!(msg.contains("version 0"));
    }
}

#[test]
fn each_validator_accepts_only_its_own_shape() {
    let samples = [
        json!({"name": "true", "otherData": "lol", "temp": 43, "version": 0}),
        json!({"name": true, "version": 1}),
        json!({"klep": true, "otherData": "lol", "version": 2}),
    ];
    for manager in managers() {
        for (v, validator) in manager.schemas().iter().enumerate() {
            for (s, sample) in samples.iter().enumerate() {
                let result = validator.validate(sample);
                assert_eq!(result.is_ok(), v == s, "validator v{v} on sample v{s}");
            }
        }
    }
}

#[test]
fn default_matches_factory_output() {
    for manager in managers() {
        assert_eq!(
            manager.get_default().unwrap(),
            json!({"klep": false, "otherData": "lol", "version": 2})
        );
    }
    let typed: Version2 = typed_manager().get_default_as().unwrap();
    assert!(!typed.klep);
}

#[test]
fn default_without_factory_is_not_found() {
    let manager = SchemaManager::builder("NoDefault")
        .validator(Shape::new(0))
        .build()
        .unwrap();
    let err = manager.get_default().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("NoDefault"));
}

#[test]
fn invalid_default_is_rejected() {
    let manager = SchemaManager::builder("BadDefault")
        .validator(TypedValidator::<Version2>::new())
        .default_with(|| json!({"klep": "false", "otherData": "lol", "version": 2}))
        .build()
        .unwrap();
    let err = manager.get_default().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(err, SchemaError::ValidationFailed { version: 2, .. }));
}

#[test]
fn repeated_calls_are_identical() {
    let manager = typed_manager();
    let input = json!({"name": "true", "otherData": "lol", "temp": 43, "version": 0});
    let first = manager.update_schema(Some(&input)).unwrap();
    let second = manager.update_schema(Some(&input)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn introspection() {
    let typed = typed_manager();
    assert_eq!(typed.latest_version(), 2);
    assert_eq!(typed.registered_steps(), vec![(0, 1), (1, 2)]);
    assert!(typed.describe().iter().all(|(_, shape)| shape.is_none()));

    let shaped = shape_manager();
    let described = shaped.describe();
    assert_eq!(described.len(), 3);
    let v2 = described[2].1.as_ref().unwrap();
    assert_eq!(v2.fields["klep"], FieldRule::Bool);
}
