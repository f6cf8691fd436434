//! Display-side data model.
//!
//! These are the shapes handed to the presentation layer: tag colors, meta
//! list entries, nice list rows, comment feed entries, virtual paths and file
//! tree nodes. None of them are stored as such.

pub mod file_tree;
pub mod virtual_path;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use file_tree::{FileTreeNode, NodeKind};
pub use virtual_path::{top_of_virtual_path, VirtualFilePaths};

/// Mime type reported when the file type plugin has not produced a result.
pub const MIME_NOT_RUN: &str = "file-type-plugin/not-run-yet";

/// Badge color of a tag.
///
/// Stored values are the presentation layer's class names; unknown values
/// fall back to `Gray`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagColor {
    #[serde(rename = "primary")]
    Blue,
    #[serde(rename = "success")]
    Green,
    #[serde(rename = "info")]
    LightBlue,
    #[serde(rename = "warning")]
    Orange,
    #[serde(rename = "danger")]
    Red,
    #[serde(rename = "default", other)]
    Gray,
}

impl TagColor {
    pub fn as_str(self) -> &'static str {
        match self {
            TagColor::Gray => "default",
            TagColor::Blue => "primary",
            TagColor::Green => "success",
            TagColor::LightBlue => "info",
            TagColor::Orange => "warning",
            TagColor::Red => "danger",
        }
    }
}

/// Tag name -> color.
pub type Tags = BTreeMap<String, TagColor>;

/// One row of a meta list: `(uid, hid, tags, submission_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub uid: String,
    pub hid: String,
    pub tags: Tags,
    /// Seconds since the epoch; `0` for file objects.
    pub submission_date: f64,
}

impl MetaEntry {
    /// Submission time as a UTC timestamp, if representable.
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        timestamp_to_datetime(self.submission_date)
    }
}

/// One row of the "nice list" summary of file objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NiceListEntry {
    pub uid: String,
    pub files_included: Vec<String>,
    pub size: u64,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
    pub virtual_file_paths: Vec<String>,
}

/// A user comment attached to a file object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "text")]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Seconds since the epoch.
    pub time: f64,
}

/// A comment annotated with the uid of the object it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentEntry {
    #[serde(flatten)]
    pub comment: Comment,
    pub uid: String,
}

impl CommentEntry {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        timestamp_to_datetime(self.comment.time)
    }
}

fn timestamp_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(whole, nanos)
}
