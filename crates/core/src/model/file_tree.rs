use std::fmt;

use serde::Serialize;

/// What a node of a virtual file tree stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Intermediate directory inside a container; has no uid of its own.
    Virtual,
    /// An actual file object.
    Real { uid: String, size: u64, mime_type: String, has_children: bool },
    /// Placeholder for an object whose data could not be loaded.
    NotAnalyzed { uid: String },
}

/// One node of a virtual file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTreeNode {
    pub name: String,
    pub root_uid: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTreeNode>,
}

impl FileTreeNode {
    pub fn virtual_dir(name: impl Into<String>, root_uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_uid: root_uid.into(),
            kind: NodeKind::Virtual,
            children: Vec::new(),
        }
    }

    pub fn real(
        uid: impl Into<String>,
        root_uid: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        has_children: bool,
    ) -> Self {
        Self {
            name: name.into(),
            root_uid: root_uid.into(),
            kind: NodeKind::Real { uid: uid.into(), size, mime_type: mime_type.into(), has_children },
            children: Vec::new(),
        }
    }

    pub fn not_analyzed(uid: impl Into<String>, root_uid: impl Into<String>) -> Self {
        let uid = uid.into();
        Self {
            name: format!("{uid} (not analyzed yet)"),
            root_uid: root_uid.into(),
            kind: NodeKind::NotAnalyzed { uid },
            children: Vec::new(),
        }
    }

    pub fn uid(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Virtual => None,
            NodeKind::Real { uid, .. } | NodeKind::NotAnalyzed { uid } => Some(uid),
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, NodeKind::Virtual)
    }

    pub fn is_not_analyzed(&self) -> bool {
        matches!(self.kind, NodeKind::NotAnalyzed { .. })
    }

    /// Whether the node can be expanded further.
    ///
    /// Real nodes report the flag computed from their included files; virtual
    /// nodes are expandable when they hold children.
    pub fn has_children(&self) -> bool {
        match &self.kind {
            NodeKind::Real { has_children, .. } => *has_children,
            NodeKind::Virtual => !self.children.is_empty(),
            NodeKind::NotAnalyzed { .. } => false,
        }
    }

    /// Attach a child, merging it into an existing virtual child of the same name.
    pub fn add_child_node(&mut self, child: FileTreeNode) {
        if child.is_virtual() {
            if let Some(existing) =
                self.children.iter_mut().find(|c| c.is_virtual() && c.name == child.name)
            {
                for grandchild in child.children {
                    existing.add_child_node(grandchild);
                }
                return;
            }
        }
        self.children.push(child);
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|child| child.name.as_str()).collect()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match &self.kind {
            NodeKind::Virtual => writeln!(f, "{indent}{}/", self.name)?,
            NodeKind::Real { uid, size, mime_type, has_children } => {
                let marker = if *has_children { " +" } else { "" };
                writeln!(f, "{indent}{} [{uid}] {size} bytes, {mime_type}{marker}", self.name)?
            }
            NodeKind::NotAnalyzed { .. } => writeln!(f, "{indent}{}", self.name)?,
        }
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for FileTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_children_with_equal_names_are_merged() {
        let mut root = FileTreeNode::virtual_dir("fw", "fw");

        let mut etc_a = FileTreeNode::virtual_dir("etc", "fw");
        etc_a.add_child_node(FileTreeNode::real("a", "fw", "passwd", 10, "text/plain", false));
        let mut etc_b = FileTreeNode::virtual_dir("etc", "fw");
        etc_b.add_child_node(FileTreeNode::real("b", "fw", "shadow", 12, "text/plain", false));

        root.add_child_node(etc_a);
        root.add_child_node(etc_b);

        assert_eq!(root.child_names(), vec!["etc"]);
        assert_eq!(root.children[0].child_names(), vec!["passwd", "shadow"]);
    }

    #[test]
    fn not_analyzed_placeholder_carries_uid() {
        let node = FileTreeNode::not_analyzed("abc", "fw");
        assert_eq!(node.name, "abc (not analyzed yet)");
        assert_eq!(node.uid(), Some("abc"));
        assert!(!node.has_children());
    }

    #[test]
    fn serializes_kind_inline() {
        let node = FileTreeNode::real("a", "fw", "busybox", 5, "application/x-executable", true);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["kind"], "real");
        assert_eq!(value["uid"], "a");
        assert_eq!(value["has_children"], true);
        assert!(value.get("children").is_none());
    }
}
