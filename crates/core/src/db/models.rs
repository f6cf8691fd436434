use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::ProcessedAnalysis;
use crate::db::{Collection, DbError, DbResult, Document};
use crate::model::{Comment, Tags, VirtualFilePaths};

/// Deserialize a stored document into a typed record.
///
/// Shape errors become [`DbError::MalformedDocument`] naming the document id.
pub fn from_document<T: DeserializeOwned>(collection: Collection, document: Document) -> DbResult<T> {
    let id = document.get("_id").and_then(Value::as_str).unwrap_or("<unknown>").to_string();
    serde_json::from_value(Value::Object(document))
        .map_err(|source| DbError::MalformedDocument { collection, id, source })
}

/// Firmware image metadata.
///
/// A firmware document may also describe the image as a file (name, size,
/// included files, virtual paths); those fields are optional here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirmwareRecord {
    #[serde(rename = "_id")]
    pub uid: String,
    pub vendor: String,
    pub device_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_part: Option<String>,
    pub version: String,
    pub device_class: String,
    #[serde(default)]
    pub submission_date: f64,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub processed_analysis: ProcessedAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub files_included: Vec<String>,
    #[serde(default)]
    pub virtual_file_path: VirtualFilePaths,
}

impl FirmwareRecord {
    pub fn new(
        uid: impl Into<String>,
        vendor: impl Into<String>,
        device_name: impl Into<String>,
        version: impl Into<String>,
        device_class: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            vendor: vendor.into(),
            device_name: device_name.into(),
            device_part: None,
            version: version.into(),
            device_class: device_class.into(),
            submission_date: 0.0,
            tags: Tags::new(),
            processed_analysis: ProcessedAnalysis::default(),
            file_name: None,
            size: None,
            files_included: Vec::new(),
            virtual_file_path: VirtualFilePaths::new(),
        }
    }

    /// Builder-style helper to set the device part.
    pub fn with_device_part(mut self, device_part: Option<String>) -> Self {
        self.device_part = device_part;
        self
    }

    /// Human-readable identifier:
    /// `"{vendor} {device_name} - {part} {version} ({device_class})"`.
    ///
    /// A missing or empty part drops together with its separator, leaving
    /// `"{vendor} {device_name} -{version} ({device_class})"`.
    pub fn hid(&self) -> String {
        let versioned = match self.device_part.as_deref() {
            None | Some("") => self.version.clone(),
            Some(part) => format!(" {part} {}", self.version),
        };
        format!("{} {} -{} ({})", self.vendor, self.device_name, versioned, self.device_class)
    }
}

/// A file unpacked from a firmware (or from another container).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileObjectRecord {
    #[serde(rename = "_id")]
    pub uid: String,
    pub file_name: String,
    pub size: u64,
    #[serde(default)]
    pub files_included: Vec<String>,
    #[serde(default)]
    pub virtual_file_path: VirtualFilePaths,
    #[serde(default)]
    pub processed_analysis: ProcessedAnalysis,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub tags: Tags,
}

impl FileObjectRecord {
    pub fn new(uid: impl Into<String>, file_name: impl Into<String>, size: u64) -> Self {
        Self {
            uid: uid.into(),
            file_name: file_name.into(),
            size,
            files_included: Vec::new(),
            virtual_file_path: VirtualFilePaths::new(),
            processed_analysis: ProcessedAnalysis::default(),
            comments: Vec::new(),
            tags: Tags::new(),
        }
    }

    /// Human-readable identifier: the top of the first virtual path under
    /// `root_uid` (or under the first parent if `root_uid` is absent/unknown).
    pub fn hid(&self, root_uid: Option<&str>) -> Option<String> {
        self.virtual_file_path
            .one_virtual_path(root_uid)
            .map(|path| crate::model::top_of_virtual_path(path).to_string())
    }
}

/// Either kind of stored object.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredObject {
    Firmware(FirmwareRecord),
    File(FileObjectRecord),
}

impl StoredObject {
    pub fn uid(&self) -> &str {
        match self {
            StoredObject::Firmware(fw) => &fw.uid,
            StoredObject::File(fo) => &fo.uid,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            StoredObject::Firmware(fw) => &fw.tags,
            StoredObject::File(fo) => &fo.tags,
        }
    }

    pub fn processed_analysis(&self) -> &ProcessedAnalysis {
        match self {
            StoredObject::Firmware(fw) => &fw.processed_analysis,
            StoredObject::File(fo) => &fo.processed_analysis,
        }
    }
}

impl From<FirmwareRecord> for StoredObject {
    fn from(record: FirmwareRecord) -> Self {
        StoredObject::Firmware(record)
    }
}

impl From<FileObjectRecord> for StoredObject {
    fn from(record: FileObjectRecord) -> Self {
        StoredObject::File(record)
    }
}

/// Row of the field statistics collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldStatistic {
    #[serde(rename = "_id")]
    pub id: FieldKey,
    /// Share of file objects containing the field, in percent.
    #[serde(rename = "percentContaining")]
    pub percent_containing: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldKey {
    pub key: String,
}

/// The three fields `get_device_name_dict` needs from a firmware.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeviceNameEntry {
    pub device_class: String,
    pub vendor: String,
    pub device_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn firmware_hid_omits_empty_device_part() {
        let fw = FirmwareRecord::new("fw", "ACME", "Router1", "2.0", "router")
            .with_device_part(Some(String::new()));
        assert_eq!(fw.hid(), "ACME Router1 -2.0 (router)");

        let fw = fw.with_device_part(None);
        assert_eq!(fw.hid(), "ACME Router1 -2.0 (router)");

        let fw = fw.with_device_part(Some("kernel".into()));
        assert_eq!(fw.hid(), "ACME Router1 - kernel 2.0 (router)");
    }

    #[test]
    fn malformed_documents_name_their_id() {
        let doc = json!({"_id": "bad", "file_name": 5}).as_object().cloned().unwrap();
        let err = from_document::<FileObjectRecord>(Collection::FileObjects, doc).unwrap_err();
        match err {
            DbError::MalformedDocument { collection, id, .. } => {
                assert_eq!(collection, Collection::FileObjects);
                assert_eq!(id, "bad");
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
