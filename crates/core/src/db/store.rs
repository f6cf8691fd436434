use std::fmt;
use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::db::aggregate::{run_pipeline, Stage};
use crate::db::{Document, FindOptions, Query};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Keeps `IN (...)` lists below SQLite's bound-parameter limit.
const MAX_KEYS_PER_STATEMENT: usize = 500;

/// Error type for store and query operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// JSON (de)serialization outside of a specific stored document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The filter document could not be understood.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A stored document does not have the shape its collection requires.
    #[error("Malformed document {id} in {collection}: {source}")]
    MalformedDocument { collection: Collection, id: String, source: serde_json::Error },

    /// A document that had to exist was not found.
    #[error("Document {id} not found in {collection}")]
    NotFound { collection: Collection, id: String },

    /// A file object has no virtual path below the requested root.
    #[error("File object {uid} has no virtual path under {root_uid}")]
    MissingVirtualPath { uid: String, root_uid: String },

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// The logical collections this crate reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Firmware metadata documents.
    Firmwares,
    /// Every file unpacked from a firmware.
    FileObjects,
    /// Precomputed field statistics over `FileObjects` (one row per field path).
    FileObjectKeys,
}

impl Collection {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Collection::Firmwares => "firmwares",
            Collection::FileObjects => "file_objects",
            Collection::FileObjectKeys => "file_object_keys",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Read access to a document store.
///
/// Only `find` and `load_blob` must be provided; the remaining operations are
/// expressed on top of `find` but may be overridden by stores that can do
/// better.
pub trait DocumentStore {
    /// Documents of `collection` matching `query`, with `options` applied.
    fn find(
        &self,
        collection: Collection,
        query: &Query,
        options: &FindOptions,
    ) -> DbResult<Vec<Document>>;

    /// Fetch an offloaded analysis result by reference id.
    fn load_blob(&self, id: &str) -> DbResult<Option<Value>>;

    fn find_one(&self, collection: Collection, query: &Query) -> DbResult<Option<Document>> {
        Ok(self.find(collection, query, &FindOptions::new().limit(1))?.into_iter().next())
    }

    fn find_by_id(&self, collection: Collection, uid: &str) -> DbResult<Option<Document>> {
        self.find_one(collection, &Query::by_id(uid))
    }

    fn count_documents(&self, collection: Collection, query: &Query) -> DbResult<usize> {
        Ok(self.find(collection, query, &FindOptions::new())?.len())
    }

    fn aggregate(&self, collection: Collection, pipeline: &[Stage]) -> DbResult<Vec<Document>> {
        let documents = self.find(collection, &Query::all(), &FindOptions::new())?;
        Ok(run_pipeline(documents, pipeline))
    }
}

/// SQLite-backed document store.
///
/// Each collection is a table of `(id, body)` rows where `body` is the JSON
/// document and `id` its `_id`. Filters on `_id` read only the keyed rows;
/// other filtering, sorting and paging happen in process, in row order.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given path, creating missing tables.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing store without write access.
    pub fn open_read_only(path: &Path) -> DbResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        check_schema_version(current_schema_version(&conn)?)?;
        Ok(Self { conn })
    }

    /// Open a fresh in-memory store (useful for tests and scratch work).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer the `DocumentStore` operations.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn load_collection(&self, collection: Collection) -> DbResult<Vec<Document>> {
        let sql = format!("SELECT id, body FROM {} ORDER BY rowid", collection.table());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, body) = row?;
            out.push(parse_body(collection, id, &body)?);
        }
        Ok(out)
    }

    /// Rows with the given ids, in row order. Other rows are never parsed.
    fn load_by_ids(&self, collection: Collection, ids: &[String]) -> DbResult<Vec<Document>> {
        let mut rows: Vec<(i64, String, String)> = Vec::new();
        for chunk in ids.chunks(MAX_KEYS_PER_STATEMENT) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql =
                format!("SELECT rowid, id, body FROM {} WHERE id IN ({placeholders})", collection.table());
            let mut stmt = self.conn.prepare(&sql)?;
            let found = stmt.query_map(params_from_iter(chunk), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?;
            for row in found {
                rows.push(row?);
            }
        }
        rows.sort_by_key(|(rowid, _, _)| *rowid);
        rows.dedup_by_key(|(rowid, _, _)| *rowid);

        rows.into_iter().map(|(_, id, body)| parse_body(collection, id, &body)).collect()
    }
}

impl DocumentStore for SqliteStore {
    fn find(
        &self,
        collection: Collection,
        query: &Query,
        options: &FindOptions,
    ) -> DbResult<Vec<Document>> {
        let documents = match query.id_restriction() {
            Some(ids) => self.load_by_ids(collection, &ids)?,
            None => self.load_collection(collection)?,
        };
        let matched: Vec<Document> = documents
            .into_iter()
            .filter(|document| query.matches(document))
            .collect();
        debug!(%collection, %query, matched = matched.len(), "find");
        Ok(options.apply(matched))
    }

    fn load_blob(&self, id: &str) -> DbResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM analysis_blobs WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        Ok(body.map(|body| serde_json::from_str(&body)).transpose()?)
    }
}

fn parse_body(collection: Collection, id: String, body: &str) -> DbResult<Document> {
    let value: Value = serde_json::from_str(body)
        .map_err(|source| DbError::MalformedDocument { collection, id: id.clone(), source })?;
    let Value::Object(mut document) = value else {
        let source = <serde_json::Error as serde::de::Error>::custom("document body is not a JSON object");
        return Err(DbError::MalformedDocument { collection, id, source });
    };
    if !document.contains_key("_id") {
        document.insert("_id".to_string(), Value::String(id));
    }
    Ok(document)
}

/// Create the collection tables if they are missing.
///
/// This only bootstraps an empty store; data is never rewritten.
///
/// Version map:
/// - 0: no schema
/// - 1: collection tables + analysis_blobs
fn ensure_schema(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;
    check_schema_version(current_version)?;

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS firmwares (
                id   TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS file_objects (
                id   TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS file_object_keys (
                id   TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS analysis_blobs (
                id   TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

fn check_schema_version(found: i32) -> DbResult<()> {
    // Reject DBs created with a newer schema than we support.
    if found > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }
    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
