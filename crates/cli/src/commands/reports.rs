use anyhow::{Context, Result};
use firmdex_core::db::FrontendContext;

use crate::commands::{format_timestamp, print_json};

/// Print the most recent comments.
pub fn comments_command(ctx: &FrontendContext, limit: usize, json: bool) -> Result<()> {
    let comments = ctx.db.get_latest_comments(limit).context("Failed to load comments")?;
    if json {
        return print_json(&comments, "comments");
    }
    println!("Comments ({}):", comments.len());
    if comments.is_empty() {
        println!("  (none)");
    }
    for entry in comments {
        let author = entry.comment.author.as_deref().unwrap_or("anonymous");
        println!(
            "  - {} {} on {}: {}",
            format_timestamp(entry.posted_at()),
            author,
            entry.uid,
            entry.comment.comment
        );
    }
    Ok(())
}

/// Print device names grouped by class and vendor.
pub fn device_names_command(ctx: &FrontendContext, json: bool) -> Result<()> {
    let dict = ctx.db.get_device_name_dict().context("Failed to load device names")?;
    if json {
        return print_json(&dict, "device names");
    }
    if dict.is_empty() {
        println!("(none)");
    }
    for (device_class, vendors) in &dict {
        println!("{device_class}");
        for (vendor, names) in vendors {
            println!("  {vendor}: {}", names.join(", "));
        }
    }
    Ok(())
}

pub fn vendors_command(ctx: &FrontendContext, json: bool) -> Result<()> {
    let vendors = ctx.db.get_vendor_list().context("Failed to list vendors")?;
    print_list(&vendors, "Vendors", json)
}

pub fn device_classes_command(ctx: &FrontendContext, json: bool) -> Result<()> {
    let classes = ctx.db.get_device_class_list().context("Failed to list device classes")?;
    print_list(&classes, "Device classes", json)
}

fn print_list(values: &[String], label: &str, json: bool) -> Result<()> {
    if json {
        return print_json(values, label);
    }
    println!("{label} ({}):", values.len());
    if values.is_empty() {
        println!("  (none)");
    }
    for value in values {
        println!("  - {value}");
    }
    Ok(())
}

/// Print the tree of analysis fields common enough to show.
pub fn analysis_structure_command(ctx: &FrontendContext, json: bool) -> Result<()> {
    let structure = ctx.db.create_analysis_structure().context("Failed to build analysis structure")?;
    if json {
        return print_json(&structure, "analysis structure");
    }
    print!("{structure}");
    Ok(())
}
