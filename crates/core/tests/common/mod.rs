//! Seeding helpers shared by the integration tests.
//!
//! The crate is read-only, so fixtures are written through the raw connection.
#![allow(dead_code)]

use std::path::PathBuf;

use firmdex_core::db::{Collection, SqliteStore};
use firmdex_core::services::FrontendDb;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A store file in a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn temp_store() -> (TempDir, PathBuf, SqliteStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("firmdex.db");
    let store = SqliteStore::open(&db_path).expect("open store");
    (dir, db_path, store)
}

pub fn insert(store: &SqliteStore, collection: Collection, doc: Value) {
    let id = match &doc["_id"] {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    };
    let sql = format!("INSERT INTO {} (id, body) VALUES (?1, ?2)", collection.table());
    store
        .connection()
        .execute(&sql, [id, doc.to_string()])
        .expect("insert document");
}

pub fn insert_blob(store: &SqliteStore, id: &str, body: Value) {
    store
        .connection()
        .execute("INSERT INTO analysis_blobs (id, body) VALUES (?1, ?2)", [id.to_string(), body.to_string()])
        .expect("insert blob");
}

pub fn firmware(uid: &str, vendor: &str, device_name: &str, version: &str, submission_date: f64) -> Value {
    json!({
        "_id": uid,
        "vendor": vendor,
        "device_name": device_name,
        "device_part": "",
        "version": version,
        "device_class": "router",
        "submission_date": submission_date,
        "tags": {},
        "processed_analysis": {},
    })
}

pub fn file_object(uid: &str, file_name: &str, virtual_file_path: Value) -> Value {
    json!({
        "_id": uid,
        "file_name": file_name,
        "size": 1024,
        "files_included": [],
        "virtual_file_path": virtual_file_path,
        "processed_analysis": {"file_type": {"mime": "application/octet-stream"}},
        "comments": [],
    })
}

pub fn frontend(store: SqliteStore) -> FrontendDb<SqliteStore> {
    FrontendDb::new(store)
}
