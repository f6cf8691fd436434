//! Document store access.
//!
//! This module wraps the store holding firmware analysis results:
//! - `firmwares`: one document per firmware image
//! - `file_objects`: one document per unpacked file
//! - `file_object_keys`: precomputed field statistics over `file_objects`
//!
//! It defines:
//! - `Query` / `FindOptions`: the filter dialect and paging options.
//! - `Stage`: a small aggregation pipeline.
//! - `DocumentStore`: read operations any backing store has to offer.
//! - `SqliteStore`: the SQLite implementation.
//! - Typed records (`FirmwareRecord`, `FileObjectRecord`, ...).
//! - `FrontendConfig` and helpers to open a store from a config file.

pub mod aggregate;
pub mod config;
pub mod context;
pub mod models;
pub mod query;
pub mod store;
pub mod util;

pub use aggregate::Stage;
pub use config::*;
pub use context::*;
pub use models::*;
pub use query::{Document, FindOptions, Query, SortKey, SortOrder};
pub use store::*;
pub use util::*;
