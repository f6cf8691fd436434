use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{json, Value};
use tracing::debug;

use crate::analysis::{AnalysisJoiner, BlobAnalysisJoiner, ProcessedAnalysis, UNPACKER};
use crate::db::query::get_path;
use crate::db::{
    from_document, Collection, DbResult, DeviceNameEntry, DocumentStore, FileObjectRecord,
    FindOptions, FirmwareRecord, Query, SortKey, StoredObject, DEFAULT_STRUCTURAL_THRESHOLD,
};
use crate::model::{top_of_virtual_path, MetaEntry, NiceListEntry, TagColor, VirtualFilePaths};

/// device_class -> vendor -> device names (first-seen order, no duplicates).
pub type DeviceNameDict = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Read-only query service over a [`DocumentStore`].
///
/// Stateless apart from its configuration: every call issues its own queries
/// and returns fully materialized results.
pub struct FrontendDb<S> {
    pub(crate) store: S,
    pub(crate) joiner: Box<dyn AnalysisJoiner>,
    pub(crate) structural_threshold: f64,
}

impl<S: fmt::Debug> fmt::Debug for FrontendDb<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontendDb")
            .field("store", &self.store)
            .field("structural_threshold", &self.structural_threshold)
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> FrontendDb<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            joiner: Box::new(BlobAnalysisJoiner),
            structural_threshold: DEFAULT_STRUCTURAL_THRESHOLD,
        }
    }

    /// Replace the joiner used to resolve offloaded analysis results.
    pub fn with_joiner(mut self, joiner: impl AnalysisJoiner + 'static) -> Self {
        self.joiner = Box::new(joiner);
        self
    }

    pub fn with_structural_threshold(mut self, threshold: f64) -> Self {
        self.structural_threshold = threshold;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Record lookups
    // =========================================================================

    pub fn is_firmware_id(&self, uid: &str) -> DbResult<bool> {
        Ok(self.store.count_documents(Collection::Firmwares, &Query::by_id(uid))? > 0)
    }

    /// The firmware record with this uid.
    pub fn get_firmware(&self, uid: &str) -> DbResult<Option<FirmwareRecord>> {
        self.store
            .find_by_id(Collection::Firmwares, uid)?
            .map(|doc| from_document(Collection::Firmwares, doc))
            .transpose()
    }

    /// The file object record with this uid.
    pub fn get_file_object(&self, uid: &str) -> DbResult<Option<FileObjectRecord>> {
        self.store
            .find_by_id(Collection::FileObjects, uid)?
            .map(|doc| from_document(Collection::FileObjects, doc))
            .transpose()
    }

    /// Firmware first, file object as fallback.
    pub fn get_object(&self, uid: &str) -> DbResult<Option<StoredObject>> {
        if let Some(firmware) = self.get_firmware(uid)? {
            return Ok(Some(firmware.into()));
        }
        Ok(self.get_file_object(uid)?.map(StoredObject::from))
    }

    pub fn get_file_name(&self, uid: &str) -> DbResult<Option<String>> {
        let options = FindOptions::new().limit(1).project(["file_name"]);
        let found = self.store.find(Collection::FileObjects, &Query::by_id(uid), &options)?;
        Ok(found
            .first()
            .and_then(|doc| doc.get("file_name"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// True when every uid exists as a file object (and for an empty list).
    pub fn all_uids_found_in_database(&self, uids: &[String]) -> DbResult<bool> {
        if uids.is_empty() {
            return Ok(true);
        }
        let query = Query::id_in(uids.iter().cloned());
        Ok(self.store.count_documents(Collection::FileObjects, &query)? == uids.len())
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Human-readable identifier for `uid`; empty for unknown ids.
    ///
    /// Firmware ids render from their metadata; file objects use the top of
    /// their first virtual path under `root_uid` (any root if `root_uid` is
    /// missing or not one of the object's parents).
    pub fn get_hid(&self, uid: &str, root_uid: Option<&str>) -> DbResult<String> {
        let hid = if self.is_firmware_id(uid)? {
            self.get_firmware(uid)?.map(|fw| fw.hid())
        } else {
            self.file_object_hid(uid, root_uid)?
        };
        Ok(hid.unwrap_or_default())
    }

    fn file_object_hid(&self, uid: &str, root_uid: Option<&str>) -> DbResult<Option<String>> {
        let options = FindOptions::new().limit(1).project(["virtual_file_path"]);
        let found = self.store.find(Collection::FileObjects, &Query::by_id(uid), &options)?;
        let Some(doc) = found.into_iter().next() else {
            return Ok(None);
        };
        let paths: VirtualFilePaths = match doc.get("virtual_file_path") {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
            None => VirtualFilePaths::new(),
        };
        Ok(paths.one_virtual_path(root_uid).map(|path| top_of_virtual_path(path).to_string()))
    }

    // =========================================================================
    // Meta lists
    // =========================================================================

    /// Render records as `(uid, hid, tags, submission_date)` rows.
    ///
    /// Missing records are skipped. Each row's tags are the stored tags plus
    /// the name of the unpacker plugin (light blue).
    pub fn get_meta_list<I>(&self, records: I) -> DbResult<Vec<MetaEntry>>
    where
        I: IntoIterator<Item = Option<StoredObject>>,
    {
        let mut entries = Vec::new();
        for record in records.into_iter().flatten() {
            let mut tags = record.tags().clone();
            if let Some(unpacker) = self.unpacker_name(record.processed_analysis())? {
                tags.insert(unpacker, TagColor::LightBlue);
            }
            let (uid, hid, submission_date) = match record {
                StoredObject::Firmware(fw) => {
                    let hid = fw.hid();
                    (fw.uid, hid, fw.submission_date)
                }
                StoredObject::File(fo) => {
                    let hid = fo.hid(None).unwrap_or_default();
                    (fo.uid, hid, 0.0)
                }
            };
            entries.push(MetaEntry { uid, hid, tags, submission_date });
        }
        Ok(entries)
    }

    /// Resolve ids (firmware first, then file object) and render a meta list.
    pub fn get_meta_list_from_id_list<I, T>(&self, uids: I, only_firmwares: bool) -> DbResult<Vec<MetaEntry>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut records = Vec::new();
        for uid in uids {
            let uid = uid.as_ref();
            let record = if only_firmwares {
                self.get_firmware(uid)?.map(StoredObject::from)
            } else {
                self.get_object(uid)?
            };
            records.push(record);
        }
        self.get_meta_list(records)
    }

    /// Newest firmware (by submission date) as a meta list.
    pub fn get_last_added_firmwares(&self, limit: usize) -> DbResult<Vec<MetaEntry>> {
        let query = Query::from_value(json!({"submission_date": {"$gt": 1}}))?;
        let options = FindOptions::new().sort_by(SortKey::descending("submission_date")).limit(limit);
        let records = self
            .store
            .find(Collection::Firmwares, &query, &options)?
            .into_iter()
            .map(|doc| from_document::<FirmwareRecord>(Collection::Firmwares, doc).map(|fw| Some(fw.into())))
            .collect::<DbResult<Vec<_>>>()?;
        self.get_meta_list(records)
    }

    /// Unpacker name, following an offloaded result one level through the joiner.
    fn unpacker_name(&self, analysis: &ProcessedAnalysis) -> DbResult<Option<String>> {
        if analysis.is_offloaded(UNPACKER) {
            let joined = self.joiner.retrieve_analysis(&self.store, analysis)?;
            return Ok(joined.unpacker_name().map(str::to_string));
        }
        Ok(analysis.unpacker_name().map(str::to_string))
    }

    // =========================================================================
    // Nice list
    // =========================================================================

    /// Summaries of file objects for list views.
    ///
    /// Virtual paths are taken under `root_uid`, or from the first parent when
    /// `root_uid` is not one of the object's parents.
    pub fn generate_nice_list_data<I>(records: I, root_uid: &str) -> Vec<NiceListEntry>
    where
        I: IntoIterator<Item = Option<FileObjectRecord>>,
    {
        records
            .into_iter()
            .flatten()
            .map(|record| {
                let virtual_file_paths =
                    record.virtual_file_path.get_or_first(Some(root_uid)).unwrap_or_default().to_vec();
                NiceListEntry {
                    mime_type: record.processed_analysis.mime_type().to_string(),
                    uid: record.uid,
                    files_included: record.files_included,
                    size: record.size,
                    virtual_file_paths,
                }
            })
            .collect()
    }

    pub fn get_data_for_nice_list(&self, uids: &[String], root_uid: &str) -> DbResult<Vec<NiceListEntry>> {
        let query = Query::id_in(uids.iter().cloned());
        let records = self
            .store
            .find(Collection::FileObjects, &query, &FindOptions::new())?
            .into_iter()
            .map(|doc| from_document::<FileObjectRecord>(Collection::FileObjects, doc).map(Some))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Self::generate_nice_list_data(records, root_uid))
    }

    // =========================================================================
    // Firmware attributes
    // =========================================================================

    /// Distinct values of a firmware attribute (sorted), optionally restricted by a filter.
    pub fn get_firmware_attribute_list(
        &self,
        attribute: &str,
        restrictions: Option<&Query>,
    ) -> DbResult<Vec<String>> {
        let all = Query::all();
        let query = restrictions.unwrap_or(&all);
        let options = FindOptions::new().project([attribute]);
        let values: BTreeSet<String> = self
            .store
            .find(Collection::Firmwares, query, &options)?
            .iter()
            .filter_map(|doc| get_path(doc, attribute))
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        Ok(values.into_iter().collect())
    }

    pub fn get_device_class_list(&self) -> DbResult<Vec<String>> {
        self.get_firmware_attribute_list("device_class", None)
    }

    pub fn get_vendor_list(&self) -> DbResult<Vec<String>> {
        self.get_firmware_attribute_list("vendor", None)
    }

    /// device_class -> vendor -> unique device names in first-seen order.
    pub fn get_device_name_dict(&self) -> DbResult<DeviceNameDict> {
        let options = FindOptions::new().project(["device_class", "device_name", "vendor"]);
        let mut dict = DeviceNameDict::new();
        for doc in self.store.find(Collection::Firmwares, &Query::all(), &options)? {
            let entry: DeviceNameEntry = from_document(Collection::Firmwares, doc)?;
            let names = dict.entry(entry.device_class).or_default().entry(entry.vendor).or_default();
            if !names.contains(&entry.device_name) {
                names.push(entry.device_name);
            }
        }
        Ok(dict)
    }

    /// Other firmware of the same device: `(uid, version)` pairs.
    pub fn get_other_versions_of_firmware(&self, firmware: &FirmwareRecord) -> DbResult<Vec<(String, String)>> {
        let query = Query::from_value(json!({
            "vendor": firmware.vendor,
            "device_name": firmware.device_name,
            "device_part": firmware.device_part,
        }))?;
        let options = FindOptions::new().project(["version"]);
        let found = self.store.find(Collection::Firmwares, &query, &options)?;
        debug!(uid = %firmware.uid, candidates = found.len(), "other versions");
        Ok(found
            .iter()
            .filter_map(|doc| {
                let uid = doc.get("_id")?.as_str()?;
                let version = doc.get("version").and_then(Value::as_str).unwrap_or_default();
                (uid != firmware.uid).then(|| (uid.to_string(), version.to_string()))
            })
            .collect())
    }
}
