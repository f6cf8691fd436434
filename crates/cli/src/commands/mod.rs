pub mod identifiers;
pub mod reports;
pub mod search;
pub mod tree;
pub mod util;

pub use identifiers::*;
pub use reports::*;
pub use search::*;
pub use tree::*;
pub use util::*;
