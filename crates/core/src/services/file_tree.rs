//! Virtual file tree construction.
//!
//! A file object reached through `n` virtual paths below a root yields `n`
//! independent root-to-leaf node chains. Each path string is split on `/`;
//! the first segment (the `uid|...|` containment prefix) is dropped, every
//! remaining segment but the last becomes a virtual directory, and the chain
//! ends in a real node describing the file object itself.

use std::iter::FusedIterator;

use tracing::warn;

use crate::db::{from_document, Collection, DbError, DbResult, Document, DocumentStore, FileObjectRecord};
use crate::model::FileTreeNode;
use crate::services::FrontendDb;

/// Tree roots for one file object below one root, ready to be iterated.
///
/// Holds the loaded record; [`FileTree::nodes`] can be called any number of
/// times and always yields the same, finite sequence.
#[derive(Debug, Clone)]
pub struct FileTree {
    uid: String,
    root_uid: String,
    source: TreeSource,
}

#[derive(Debug, Clone)]
enum TreeSource {
    Record { record: FileObjectRecord, paths: Vec<String>, whitelist: Option<Vec<String>> },
    /// Data missing or malformed: a single "not analyzed" placeholder.
    Unavailable,
}

impl FileTree {
    fn build(
        uid: &str,
        root_uid: &str,
        document: DbResult<Option<Document>>,
        whitelist: Option<&[String]>,
    ) -> Self {
        let source = match load_source(uid, root_uid, document, whitelist) {
            Ok(source) => source,
            Err(err) => {
                warn!(%uid, %root_uid, error = %err, "file tree node not available");
                TreeSource::Unavailable
            }
        };
        Self { uid: uid.to_string(), root_uid: root_uid.to_string(), source }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn root_uid(&self) -> &str {
        &self.root_uid
    }

    /// Whether the record could be loaded (otherwise the only node is a placeholder).
    pub fn is_available(&self) -> bool {
        matches!(self.source, TreeSource::Record { .. })
    }

    /// Number of roots [`FileTree::nodes`] yields.
    pub fn len(&self) -> usize {
        match &self.source {
            TreeSource::Record { paths, .. } => paths.len(),
            TreeSource::Unavailable => 1,
        }
    }

    /// Never empty: an unavailable record still yields its placeholder.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the tree roots, one per virtual path occurrence.
    pub fn nodes(&self) -> FileTreeNodes<'_> {
        FileTreeNodes { tree: self, next: 0 }
    }

    fn node_at(&self, index: usize) -> Option<FileTreeNode> {
        match &self.source {
            TreeSource::Unavailable => {
                (index == 0).then(|| FileTreeNode::not_analyzed(&self.uid, &self.root_uid))
            }
            TreeSource::Record { record, paths, whitelist } => {
                let path = paths.get(index)?;
                let segments: Vec<&str> = path.split('/').skip(1).collect();
                Some(self.node_from_segments(record, &segments, whitelist.as_deref()))
            }
        }
    }

    fn node_from_segments(
        &self,
        record: &FileObjectRecord,
        segments: &[&str],
        whitelist: Option<&[String]>,
    ) -> FileTreeNode {
        match segments {
            [directory, rest @ ..] if !rest.is_empty() => {
                let mut node = FileTreeNode::virtual_dir(*directory, &self.root_uid);
                node.add_child_node(self.node_from_segments(record, rest, whitelist));
                node
            }
            _ => {
                let has_children = match whitelist {
                    Some(allowed) if !allowed.is_empty() => {
                        allowed.iter().any(|uid| record.files_included.contains(uid))
                    }
                    _ => !record.files_included.is_empty(),
                };
                FileTreeNode::real(
                    &record.uid,
                    &self.root_uid,
                    &record.file_name,
                    record.size,
                    record.processed_analysis.mime_type(),
                    has_children,
                )
            }
        }
    }
}

fn load_source(
    uid: &str,
    root_uid: &str,
    document: DbResult<Option<Document>>,
    whitelist: Option<&[String]>,
) -> DbResult<TreeSource> {
    let document = document?.ok_or_else(|| DbError::NotFound {
        collection: Collection::FileObjects,
        id: uid.to_string(),
    })?;
    let mut record: FileObjectRecord = from_document(Collection::FileObjects, document)?;
    if !record.virtual_file_path.contains_root(root_uid) {
        // Tree for a container below the top-level firmware.
        record.virtual_file_path = record.virtual_file_path.partial(root_uid);
    }
    let paths = record.virtual_file_path.get(root_uid).map(<[String]>::to_vec).unwrap_or_default();
    if paths.is_empty() {
        return Err(DbError::MissingVirtualPath { uid: uid.to_string(), root_uid: root_uid.to_string() });
    }
    Ok(TreeSource::Record { record, paths, whitelist: whitelist.map(<[String]>::to_vec) })
}

/// Iterator over the roots of a [`FileTree`].
#[derive(Debug, Clone)]
pub struct FileTreeNodes<'a> {
    tree: &'a FileTree,
    next: usize,
}

impl Iterator for FileTreeNodes<'_> {
    type Item = FileTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.node_at(self.next)?;
        self.next += 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tree.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FileTreeNodes<'_> {}

impl FusedIterator for FileTreeNodes<'_> {}

impl<'a> IntoIterator for &'a FileTree {
    type Item = FileTreeNode;
    type IntoIter = FileTreeNodes<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes()
    }
}

impl<S: DocumentStore> FrontendDb<S> {
    /// Tree roots for `uid` below `root_uid`.
    ///
    /// The record is looked up among file objects, then among firmware. With a
    /// non-empty `whitelist`, a real node only reports children if one of its
    /// included files is whitelisted. Lookup or shape errors never propagate:
    /// they produce a tree whose only node is a "not analyzed" placeholder.
    pub fn generate_file_tree_node(&self, uid: &str, root_uid: &str, whitelist: Option<&[String]>) -> FileTree {
        let document = self.store.find_by_id(Collection::FileObjects, uid).and_then(|found| match found {
            Some(doc) => Ok(Some(doc)),
            None => self.store.find_by_id(Collection::Firmwares, uid),
        });
        FileTree::build(uid, root_uid, document, whitelist)
    }
}
