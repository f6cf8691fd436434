//! firmdex CLI library.
//!
//! Command implementations live here (rather than in `main.rs`) so they can
//! be exercised by integration tests and reused by other binaries.

pub mod commands;
pub mod logging;

pub use commands::*;
