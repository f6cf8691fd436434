use anyhow::Result;
use firmdex_core::db::FrontendContext;
use firmdex_core::model::FileTreeNode;
use tracing::debug;

use crate::commands::print_json;

/// Print the virtual file tree roots of `uid` below `root_uid`.
pub fn tree_command(
    ctx: &FrontendContext,
    uid: &str,
    root_uid: &str,
    whitelist: &[String],
    json: bool,
) -> Result<()> {
    let whitelist = (!whitelist.is_empty()).then_some(whitelist);
    let tree = ctx.db.generate_file_tree_node(uid, root_uid, whitelist);
    debug!(%uid, %root_uid, roots = tree.len(), available = tree.is_available(), "file tree built");
    if json {
        let roots: Vec<FileTreeNode> = tree.nodes().collect();
        return print_json(&roots, "file tree");
    }
    for root in &tree {
        print!("{root}");
    }
    Ok(())
}
