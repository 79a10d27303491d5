//! End-to-end document handling on a real directory.

use schema_migrate::{
    converter, versioned_schema, ErrorKind, SchemaManager, TypedValidator, VersionedSchema,
};
use schema_store::{DocumentError, FileStore, FsStore, Origin, SchemaDocument, StoreConfig};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[versioned_schema(version = 0)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NoteV0 {
    text: String,
}

#[versioned_schema(version = 1)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NoteV1 {
    text: String,
    pinned: bool,
}

#[versioned_schema(version = 2)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NoteV2 {
    title: String,
    body: String,
    pinned: bool,
}

#[converter(from = 0, to = 1)]
fn add_pinned(old: NoteV0) -> NoteV1 {
    NoteV1 {
        text: old.text,
        pinned: false,
    }
}

#[converter(from = 1, to = 2)]
fn split_title(old: NoteV1) -> NoteV2 {
    let mut lines = old.text.splitn(2, '\n');
    NoteV2 {
        title: lines.next().unwrap_or_default().to_string(),
        body: lines.next().unwrap_or_default().to_string(),
        pinned: old.pinned,
    }
}

fn manager() -> SchemaManager {
    SchemaManager::builder("Note")
        .validator(TypedValidator::<NoteV0>::new())
        .validator(TypedValidator::<NoteV1>::new())
        .validator(TypedValidator::<NoteV2>::new())
        .converter(register_add_pinned())
        .converter(register_split_title())
        .default_with(|| json!({"title": "", "body": "", "pinned": false, "version": 2}))
        .build()
        .unwrap()
}

fn read_json(dir: &std::path::Path, rel: &str) -> Value {
    serde_json::from_slice(&std::fs::read(dir.join(rel)).unwrap()).unwrap()
}

#[test]
fn migrates_files_across_two_steps_and_writes_back() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("note.json"),
        r#"{"text": "Groceries\nmilk, eggs", "version": 0}"#,
    )
    .unwrap();

    let m = manager();
    let mut doc = SchemaDocument::new(&m, FsStore::new(dir.path()));
    let loaded = doc.load("note.json").unwrap();
    assert_eq!(loaded.origin, Origin::Migrated { from: 0 });
    assert_eq!(
        read_json(dir.path(), "note.json"),
        json!({"title": "Groceries", "body": "milk, eggs", "pinned": false, "version": 2})
    );

    let note: NoteV2 = doc.load_as("note.json").unwrap();
    assert_eq!(note.title, "Groceries");
}

#[test]
fn save_as_tags_and_migrates_typed_records() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager();
    let mut doc = SchemaDocument::new(&m, FsStore::new(dir.path()));

    let written = doc
        .save_as(
            "nested/old.json",
            &NoteV1 {
                text: "Title only".into(),
                pinned: true,
            },
        )
        .unwrap();
    assert_eq!(written["version"], NoteV2::VERSION);
    assert_eq!(written["pinned"], true);
    assert_eq!(read_json(dir.path(), "nested/old.json"), written);
}

#[test]
fn persisted_default_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager();
    let config = StoreConfig {
        persist_default: true,
        ..StoreConfig::default()
    };
    {
        let mut doc = SchemaDocument::with_config(&m, FsStore::new(dir.path()), config);
        assert_eq!(doc.load("n.json").unwrap().origin, Origin::Default);
    }
    let mut doc = SchemaDocument::new(&m, FsStore::new(dir.path()));
    assert_eq!(doc.load("n.json").unwrap().origin, Origin::Current);
}

#[test]
fn unreadable_and_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager();
    let mut store = FsStore::new(dir.path());
    store.write("null.json", b"null").unwrap();
    store.write("unversioned.json", br#"{"title": "x"}"#).unwrap();
    let mut doc = SchemaDocument::new(&m, store);

    let err = doc.load("null.json").unwrap_err();
    assert!(err.to_string().contains("null | undefined"));

    let err = doc.load("unversioned.json").unwrap_err();
    match &err {
        DocumentError::Schema(e) => assert_eq!(e.kind(), ErrorKind::InvalidArgument),
        other => panic!("unexpected error: {other}"),
    }

    let reset = doc.load_or_reset("unversioned.json").unwrap();
    assert!(matches!(reset.origin, Origin::Reset { .. }));
    assert_eq!(read_json(dir.path(), "unversioned.json")["version"], 2);
}

#[test]
fn escaping_paths_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager();
    let mut doc = SchemaDocument::new(&m, FsStore::new(dir.path()));
    let err = doc.load("../outside.json").unwrap_err();
    assert!(matches!(err, DocumentError::Io { op: "read", .. }));
    assert!(!err.is_bad_content());
}
