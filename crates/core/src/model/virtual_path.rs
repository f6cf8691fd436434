//! Virtual file paths.
//!
//! A virtual path string records where an unpacked file sits relative to a
//! root firmware: `"<root uid>|<container uid>|...|/dir/file"`. The `|`
//! separated prefix is the containment chain, the text after the last `|` is
//! the path inside the innermost container.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator between the uids of the containment chain.
pub const CHAIN_SEPARATOR: char = '|';

/// Text after the last `|` of a virtual path (the path inside the innermost container).
pub fn top_of_virtual_path(virtual_path: &str) -> &str {
    virtual_path.rsplit(CHAIN_SEPARATOR).next().unwrap_or_default()
}

/// Mapping from parent firmware uid to the virtual paths of one file object.
///
/// Keeps the stored key order: "the first root" of a record is the first key
/// as written in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFilePaths(Vec<(String, Vec<String>)>);

impl VirtualFilePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert (replaces the paths of an existing root).
    pub fn with_root<I, S>(mut self, root_uid: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(root_uid.into(), paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn insert(&mut self, root_uid: String, paths: Vec<String>) {
        match self.0.iter_mut().find(|(uid, _)| *uid == root_uid) {
            Some((_, existing)) => *existing = paths,
            None => self.0.push((root_uid, paths)),
        }
    }

    pub fn get(&self, root_uid: &str) -> Option<&[String]> {
        self.0.iter().find(|(uid, _)| uid == root_uid).map(|(_, paths)| paths.as_slice())
    }

    pub fn contains_root(&self, root_uid: &str) -> bool {
        self.get(root_uid).is_some()
    }

    /// Parent uids in stored order.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(uid, _)| uid.as_str())
    }

    /// Paths of the first stored root.
    pub fn first(&self) -> Option<&[String]> {
        self.0.first().map(|(_, paths)| paths.as_slice())
    }

    /// Paths under `root_uid`, or under the first stored root when it is absent.
    pub fn get_or_first(&self, root_uid: Option<&str>) -> Option<&[String]> {
        root_uid.and_then(|root| self.get(root)).or_else(|| self.first())
    }

    /// First virtual path under `root_uid` (falling back to the first root).
    pub fn one_virtual_path(&self, root_uid: Option<&str>) -> Option<&str> {
        self.get_or_first(root_uid).and_then(|paths| paths.first()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Restrict paths to those passing through `ancestor_uid`, re-rooted at it.
    ///
    /// Used to build a file tree below a container that is not itself a
    /// top-level firmware. The result has the single key `ancestor_uid`; its
    /// paths are sorted and free of duplicates (the same file may be reached
    /// from the ancestor through several top-level firmwares).
    pub fn partial(&self, ancestor_uid: &str) -> VirtualFilePaths {
        let mut paths = BTreeSet::new();
        for (_, root_paths) in &self.0 {
            for path in root_paths {
                let segments: Vec<&str> = path.split(CHAIN_SEPARATOR).collect();
                if let Some(index) = segments.iter().position(|segment| *segment == ancestor_uid) {
                    paths.insert(segments[index..].join("|"));
                }
            }
        }
        VirtualFilePaths(vec![(ancestor_uid.to_string(), paths.into_iter().collect())])
    }
}

impl Serialize for VirtualFilePaths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (uid, paths) in &self.0 {
            map.serialize_entry(uid, paths)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VirtualFilePaths {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathsVisitor;

        impl<'de> Visitor<'de> for PathsVisitor {
            type Value = VirtualFilePaths;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from parent uid to a list of virtual paths")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((uid, paths)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((uid, paths));
                }
                Ok(VirtualFilePaths(entries))
            }
        }

        deserializer.deserialize_map(PathsVisitor)
    }
}
