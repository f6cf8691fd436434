use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use firmdex::commands::*;
use firmdex::logging;
use tracing::debug;

/// Read-only browser for a firmware analysis store.
///
/// This CLI is a thin wrapper around `firmdex-core` (exposed in code as
/// `firmdex_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(name = "firmdex", version, about = "Browse firmware analysis results", long_about = None)]
struct Cli {
    /// Frontend config file (JSON or YAML).
    #[arg(long, global = true, env = "FIRMDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Store file; overrides the config's `db_path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the human-readable identifier of a firmware or file object.
    Hid {
        uid: String,

        /// Firmware to resolve file-object paths under.
        #[arg(long)]
        root: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show uid, HID, tags and submission date for the given ids.
    MetaList {
        #[arg(required = true)]
        uids: Vec<String>,

        /// Skip ids that are not firmware.
        #[arg(long, default_value_t = false)]
        only_firmwares: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the most recently submitted firmware.
    LatestFirmwares {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Summarize file objects (size, mime type, virtual paths) below a root.
    NiceList {
        #[arg(required = true)]
        uids: Vec<String>,

        #[arg(long)]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Search firmware, then file objects, with a JSON filter.
    ///
    /// Example: `firmdex search '{"vendor": {"$regex": "acme", "$options": "i"}}'`
    Search {
        query: String,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Maximum results; 0 returns everything.
        #[arg(long, default_value_t = 0)]
        limit: usize,

        /// Report the firmware containing matching files instead of the files.
        #[arg(long, default_value_t = false)]
        parent_firmware: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Count the results a search would produce.
    Count {
        query: String,

        #[arg(long, default_value_t = false)]
        parent_firmware: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the virtual file tree of an object below a root.
    Tree {
        uid: String,

        #[arg(long)]
        root: String,

        /// Only report children among these ids (comma separated).
        #[arg(long, value_delimiter = ',')]
        whitelist: Vec<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the most recent comments.
    Comments {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show device names grouped by device class and vendor.
    DeviceNames {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List all firmware vendors.
    Vendors {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List all device classes.
    DeviceClasses {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List other firmware versions of the same device.
    OtherVersions {
        uid: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the analysis fields present in most file objects.
    AnalysisStructure {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = open_context(cli.config.as_deref(), cli.db.as_deref())?;
    logging::init(Some(&ctx.config.logging.level))?;
    debug!(
        db_path = %ctx.config.data_storage.db_path,
        threshold = ctx.config.data_storage.structural_threshold,
        "store opened"
    );

    match cli.command {
        Command::Hid { uid, root, json } => hid_command(&ctx, &uid, root.as_deref(), json)?,
        Command::MetaList { uids, only_firmwares, json } => {
            meta_list_command(&ctx, &uids, only_firmwares, json)?
        }
        Command::LatestFirmwares { limit, json } => latest_firmwares_command(&ctx, limit, json)?,
        Command::NiceList { uids, root, json } => nice_list_command(&ctx, &uids, &root, json)?,
        Command::Search { query, skip, limit, parent_firmware, json } => {
            search_command(&ctx, &query, skip, limit, parent_firmware, json)?
        }
        Command::Count { query, parent_firmware, json } => {
            count_command(&ctx, &query, parent_firmware, json)?
        }
        Command::Tree { uid, root, whitelist, json } => {
            tree_command(&ctx, &uid, &root, &whitelist, json)?
        }
        Command::Comments { limit, json } => comments_command(&ctx, limit, json)?,
        Command::DeviceNames { json } => device_names_command(&ctx, json)?,
        Command::Vendors { json } => vendors_command(&ctx, json)?,
        Command::DeviceClasses { json } => device_classes_command(&ctx, json)?,
        Command::OtherVersions { uid, json } => other_versions_command(&ctx, &uid, json)?,
        Command::AnalysisStructure { json } => analysis_structure_command(&ctx, json)?,
    }

    Ok(())
}
