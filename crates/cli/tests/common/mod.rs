//! Store fixture shared by the CLI tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use firmdex_core::db::{Collection, SqliteStore};
use serde_json::{json, Value};

fn insert(store: &SqliteStore, collection: Collection, doc: Value) {
    let id = match &doc["_id"] {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    };
    let sql = format!("INSERT INTO {} (id, body) VALUES (?1, ?2)", collection.table());
    store.connection().execute(&sql, [id, doc.to_string()]).expect("insert document");
}

/// Seed `root/firmdex.db` with two firmware of one device and a few files.
pub fn seed_store(root: &Path) -> PathBuf {
    let db_path = root.join("firmdex.db");
    let store = SqliteStore::open(&db_path).expect("open store");

    insert(
        &store,
        Collection::Firmwares,
        json!({
            "_id": "fw1", "vendor": "ACME", "device_name": "Router1", "device_part": "",
            "version": "1.0", "device_class": "router", "submission_date": 1_700_000_000.0,
            "tags": {"stable": "success"},
            "processed_analysis": {"unpacker": {"file_system_flag": true, "file_system_id": "blob1"}},
        }),
    );
    insert(
        &store,
        Collection::Firmwares,
        json!({
            "_id": "fw2", "vendor": "ACME", "device_name": "Router1", "device_part": "",
            "version": "1.1", "device_class": "router", "submission_date": 1_700_100_000.0,
        }),
    );
    insert(
        &store,
        Collection::FileObjects,
        json!({
            "_id": "fo1", "file_name": "busybox", "size": 2048, "files_included": [],
            "virtual_file_path": {"fw1": ["fw1|/bin/busybox"]},
            "processed_analysis": {"file_type": {"mime": "application/x-executable"}},
            "comments": [{"comment": "suspicious", "author": "alice", "time": 1_700_000_500.0}],
        }),
    );
    insert(&store, Collection::FileObjectKeys, json!({"_id": {"key": "processed_analysis.file_type"}, "percentContaining": 100.0}));
    store
        .connection()
        .execute(
            "INSERT INTO analysis_blobs (id, body) VALUES (?1, ?2)",
            ["blob1".to_string(), json!({"plugin_used": "squashfs"}).to_string()],
        )
        .expect("insert blob");
    db_path
}

/// Write a JSON config next to the store, pointing at it relatively.
pub fn write_config(root: &Path) -> PathBuf {
    let config_path = root.join("firmdex.json");
    let config = json!({"data_storage": {"db_path": "firmdex.db"}, "logging": {"level": "warn"}});
    std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).expect("write config");
    config_path
}
