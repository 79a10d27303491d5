//! # Plugin Settings: Versioned settings file with automatic migration
//!
//! A plugin stores its settings as JSON on disk. Between releases the
//! settings layout changes; older files are migrated on load and written
//! back, and a fresh install gets the default.
//!
//! ```text
//! v0 saves:  { "theme": "dark", "version": 0 }
//! v1 loads:  { "dark": true, "fontSize": 14, "version": 1 }  ← auto-migrated
//! ```
//!
//! Run: `cargo run -p schema-store --example plugin_settings`

use schema_migrate::{converter, versioned_schema, SchemaManager, TypedValidator};
use schema_store::{FileStore, FsStore, Origin, SchemaDocument};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ── Schema v0 ───────────────────────────────────────────────────────

#[versioned_schema(version = 0)]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingsV0 {
    theme: String,
}

// ── Schema v1 (boolean theme, font size) ────────────────────────────

#[versioned_schema(version = 1)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsV1 {
    dark: bool,
    font_size: u32,
}

#[converter(from = 0, to = 1)]
fn split_theme(old: SettingsV0) -> SettingsV1 {
    SettingsV1 {
        dark: old.theme == "dark",
        font_size: 14,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schema_store=debug".into()),
        )
        .init();

    println!("=== Plugin Settings Example ===\n");

    let manager = SchemaManager::builder("PluginSettings")
        .validator(TypedValidator::<SettingsV0>::new())
        .validator(TypedValidator::<SettingsV1>::new())
        .converter(register_split_theme())
        .default_value(json!({"dark": false, "fontSize": 12, "version": 1}))
        .build()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut doc = SchemaDocument::new(&manager, FsStore::new(dir.path()));

    // ── Step 1: Fresh install ───────────────────────────────────────
    println!("1. Fresh install, nothing on disk...");
    let loaded = doc.load("notes/settings.json").unwrap();
    assert_eq!(loaded.origin, Origin::Default);
    println!("   Default: {}", loaded.value);

    // ── Step 2: An old release left a v0 file behind ────────────────
    println!("\n2. Old release wrote a v0 file...");
    doc.store_mut()
        .write("notes/settings.json", br#"{"theme": "dark", "version": 0}"#)
        .unwrap();

    let settings: SettingsV1 = doc.load_as("notes/settings.json").unwrap();
    println!("   Migrated: dark={}, font_size={}", settings.dark, settings.font_size);
    assert!(settings.dark);

    let on_disk = std::fs::read_to_string(dir.path().join("notes/settings.json")).unwrap();
    println!("   Written back:\n{on_disk}");

    // ── Step 3: Corrupt file recovery ───────────────────────────────
    println!("\n3. File gets corrupted...");
    doc.store_mut()
        .write("notes/settings.json", b"{\"dark\": ")
        .unwrap();
    let loaded = doc.load_or_reset("notes/settings.json").unwrap();
    if let Origin::Reset { reason } = &loaded.origin {
        println!("   Reset to default: {reason}");
    }

    println!("\n=== Done ===");
}
