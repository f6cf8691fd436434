//! firmdex-core
//!
//! Read-only query and presentation layer over a firmware analysis store.
//!
//! This crate defines the stored record types, the filter dialect and store
//! abstraction, and the `FrontendDb` service that turns raw records into
//! display shapes: human-readable identifiers, tag lists, search results,
//! virtual file trees and small aggregate reports.
//!
//! All substantive logic lives here so it is testable and reusable from
//! multiple frontends (CLI, web UI, REST API).

pub mod analysis;
pub mod db;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
