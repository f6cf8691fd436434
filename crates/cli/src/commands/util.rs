use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use firmdex_core::db::{load_config, FrontendContext, Query};
use firmdex_core::model::Tags;
use serde::Serialize;

/// Open the store named by `--config` and/or `--db`.
///
/// With both, the config supplies settings and `--db` overrides its store path.
pub fn open_context(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<FrontendContext> {
    match (config_path, db_path) {
        (Some(config_path), None) => FrontendContext::from_config_path(config_path),
        (Some(config_path), Some(db_path)) => {
            let config = load_config(config_path)?;
            FrontendContext::with_config(config, db_path)
        }
        (None, Some(db_path)) => FrontendContext::from_db_path(db_path),
        (None, None) => Err(anyhow!(
            "No store configured: pass --config <file> (or set FIRMDEX_CONFIG) or --db <path>"
        )),
    }
}

/// Parse a filter given on the command line as JSON text.
pub fn parse_query(text: &str) -> Result<Query> {
    Query::parse(text).with_context(|| format!("Failed to parse query: {text}"))
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<()> {
    let serialized =
        serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {what} to JSON"))?;
    println!("{serialized}");
    Ok(())
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, or `-` when there is no usable timestamp.
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// `name(color), ...` in name order; `-` for no tags.
pub fn format_tags(tags: &Tags) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter().map(|(name, color)| format!("{name}({})", color.as_str())).collect::<Vec<_>>().join(", ")
}
