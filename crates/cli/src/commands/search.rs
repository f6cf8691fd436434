use anyhow::{Context, Result};
use firmdex_core::db::FrontendContext;
use serde_json::json;
use tracing::debug;

use crate::commands::{format_tags, parse_query, print_json};

/// Run a two-tier search and print the matching objects.
pub fn search_command(
    ctx: &FrontendContext,
    query: &str,
    skip: usize,
    limit: usize,
    only_parent_firmware: bool,
    json: bool,
) -> Result<()> {
    let query = parse_query(query)?;
    let uids = ctx
        .db
        .generic_search(&query, skip, limit, only_parent_firmware)
        .context("Failed to run search")?;
    debug!(%query, skip, limit, only_parent_firmware, results = uids.len(), "search finished");
    if json {
        return print_json(&uids, "search results");
    }
    let entries = ctx.db.get_meta_list_from_id_list(&uids, false).context("Failed to build meta list")?;
    println!("Matches ({}):", entries.len());
    if entries.is_empty() {
        println!("  (none)");
    }
    for entry in entries {
        println!("  - {} {} [tags: {}]", entry.uid, entry.hid, format_tags(&entry.tags));
    }
    Ok(())
}

/// Print how many results a search would produce.
pub fn count_command(ctx: &FrontendContext, query: &str, only_parent_firmware: bool, json: bool) -> Result<()> {
    let query = parse_query(query)?;
    let total = ctx
        .db
        .get_number_of_total_matches(&query, only_parent_firmware)
        .context("Failed to count matches")?;
    if json {
        return print_json(&json!({"query": query.as_document(), "matches": total}), "match count");
    }
    println!("{total}");
    Ok(())
}
