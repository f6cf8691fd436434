use anyhow::{anyhow, Context, Result};
use firmdex_core::db::FrontendContext;
use serde_json::json;

use crate::commands::{format_tags, format_timestamp, print_json};

/// Print the human-readable identifier of an object.
pub fn hid_command(ctx: &FrontendContext, uid: &str, root_uid: Option<&str>, json: bool) -> Result<()> {
    let hid = ctx.db.get_hid(uid, root_uid).with_context(|| format!("Failed to resolve HID of {uid}"))?;
    if json {
        return print_json(&json!({"uid": uid, "hid": hid}), "HID");
    }
    if hid.is_empty() {
        println!("{uid}: (unknown)");
    } else {
        println!("{hid}");
    }
    Ok(())
}

/// Print a meta list for the given ids.
pub fn meta_list_command(ctx: &FrontendContext, uids: &[String], only_firmwares: bool, json: bool) -> Result<()> {
    let entries = ctx.db.get_meta_list_from_id_list(uids, only_firmwares).context("Failed to build meta list")?;
    if json {
        return print_json(&entries, "meta list");
    }
    print_meta_entries(&entries);
    Ok(())
}

/// Print the most recently submitted firmware.
pub fn latest_firmwares_command(ctx: &FrontendContext, limit: usize, json: bool) -> Result<()> {
    let entries = ctx.db.get_last_added_firmwares(limit).context("Failed to list latest firmware")?;
    if json {
        return print_json(&entries, "latest firmware");
    }
    print_meta_entries(&entries);
    Ok(())
}

fn print_meta_entries(entries: &[firmdex_core::model::MetaEntry]) {
    println!("Objects ({}):", entries.len());
    if entries.is_empty() {
        println!("  (none)");
        return;
    }
    for entry in entries {
        println!(
            "  - {} {} [tags: {}] submitted={}",
            entry.uid,
            entry.hid,
            format_tags(&entry.tags),
            format_timestamp(entry.submitted_at().filter(|_| entry.submission_date > 0.0))
        );
    }
}

/// Print file object summaries below `root_uid`.
pub fn nice_list_command(ctx: &FrontendContext, uids: &[String], root_uid: &str, json: bool) -> Result<()> {
    let entries = ctx.db.get_data_for_nice_list(uids, root_uid).context("Failed to build file list")?;
    if json {
        return print_json(&entries, "file list");
    }
    println!("Files ({}):", entries.len());
    if entries.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for entry in entries {
        println!(
            "  - {} {} bytes, {} ({} included)",
            entry.uid,
            entry.size,
            entry.mime_type,
            entry.files_included.len()
        );
        for path in &entry.virtual_file_paths {
            println!("      {path}");
        }
    }
    Ok(())
}

/// Print the other known versions of a firmware's device.
pub fn other_versions_command(ctx: &FrontendContext, uid: &str, json: bool) -> Result<()> {
    let firmware = ctx
        .db
        .get_firmware(uid)
        .with_context(|| format!("Failed to load firmware {uid}"))?
        .ok_or_else(|| anyhow!("Firmware not found: {uid}"))?;
    let versions = ctx.db.get_other_versions_of_firmware(&firmware).context("Failed to list other versions")?;
    if json {
        let rows: Vec<_> = versions.iter().map(|(uid, version)| json!({"uid": uid, "version": version})).collect();
        return print_json(&rows, "other versions");
    }
    println!("Other versions of {} ({}):", firmware.hid(), versions.len());
    if versions.is_empty() {
        println!("  (none)");
    }
    for (uid, version) in versions {
        println!("  - {version} [{uid}]");
    }
    Ok(())
}
