//! Nested view over dotted analysis field paths.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Message shown before the field statistics have been computed.
pub const STATISTICS_NOT_COMPUTED: &str = "Database statistics do not seem to be created yet.";

/// A tree of field names built from dotted paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldTree {
    children: BTreeMap<String, FieldTree>,
}

impl FieldTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a dotted path (`"file_type.mime"`); empty segments are ignored.
    pub fn insert(&mut self, dotted: &str) {
        let mut node = self;
        for segment in dotted.split('.').filter(|segment| !segment.is_empty()) {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldTree> {
        self.children.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    fn fmt_children(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
        let count = self.children.len();
        for (index, (name, child)) in self.children.iter().enumerate() {
            let last = index + 1 == count;
            writeln!(f, "{prefix}{}{name}", if last { "└── " } else { "├── " })?;
            let next_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            child.fmt_children(f, &next_prefix)?;
        }
        Ok(())
    }
}

impl fmt::Display for FieldTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_children(f, "")
    }
}

/// Build a [`FieldTree`] from a flat list of dotted field paths.
pub fn visualize_complete_tree<I, S>(fields: I) -> FieldTree
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tree = FieldTree::new();
    for field in fields {
        tree.insert(field.as_ref());
    }
    tree
}

/// Result of rendering the analysis field structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStructure {
    /// The statistics collection is empty.
    NotComputed,
    Tree(FieldTree),
}

impl fmt::Display for AnalysisStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStructure::NotComputed => writeln!(f, "{STATISTICS_NOT_COMPUTED}"),
            AnalysisStructure::Tree(tree) => write!(f, "{tree}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree_from_dotted_paths() {
        let tree = visualize_complete_tree(["file_type", "file_type.mime", "crypto.keys.rsa"]);
        assert_eq!(tree.names().collect::<Vec<_>>(), vec!["crypto", "file_type"]);
        assert!(tree.get("file_type").unwrap().get("mime").is_some());
        assert!(tree.get("crypto").unwrap().get("keys").unwrap().get("rsa").is_some());
    }

    #[test]
    fn renders_box_drawing_tree() {
        let tree = visualize_complete_tree(["a.b", "c"]);
        assert_eq!(tree.to_string(), "├── a\n│   └── b\n└── c\n");
    }
}
