//! Query services turning stored records into display shapes.
//!
//! `FrontendDb` is split by concern across the submodules; every submodule
//! adds an `impl` block to the same type.

pub mod file_tree;
pub mod frontend;
pub mod reports;
pub mod search;

pub use file_tree::{FileTree, FileTreeNodes};
pub use frontend::{DeviceNameDict, FrontendDb};
pub use search::dedup_preserving_order;
