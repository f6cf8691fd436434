//! Stored plugin results and the helpers that interpret them.
//!
//! `processed_analysis` is a map from plugin name to that plugin's result
//! document. A plugin that has not run simply has no entry; a result that was
//! too large to embed is replaced by a stub carrying `file_system_flag: true`
//! and the id of a blob holding the real result.

pub mod structure;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{DbResult, Document, DocumentStore};
use crate::model::MIME_NOT_RUN;

pub use structure::{visualize_complete_tree, AnalysisStructure, FieldTree, STATISTICS_NOT_COMPUTED};

/// Plugin extracting files from containers.
pub const UNPACKER: &str = "unpacker";
/// Plugin identifying file types.
pub const FILE_TYPE: &str = "file_type";

/// Marks a result stub whose body lives in the blob store.
const FILE_SYSTEM_FLAG: &str = "file_system_flag";
/// Blob id of an offloaded result.
const FILE_SYSTEM_ID: &str = "file_system_id";

/// How far a plugin result is available on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    /// No entry for the plugin.
    NotRun,
    /// An entry exists but its body is offloaded or unreadable.
    Partial,
    /// The full result is embedded.
    Complete,
}

/// The `processed_analysis` document of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessedAnalysis(Document);

impl ProcessedAnalysis {
    pub fn new(results: Document) -> Self {
        Self(results)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn status(&self, plugin: &str) -> AnalysisStatus {
        match self.0.get(plugin) {
            None => AnalysisStatus::NotRun,
            Some(Value::Object(_)) if self.is_offloaded(plugin) => AnalysisStatus::Partial,
            Some(Value::Object(_)) => AnalysisStatus::Complete,
            Some(_) => AnalysisStatus::Partial,
        }
    }

    /// The result document of `plugin`, if there is one.
    pub fn result(&self, plugin: &str) -> Option<&Document> {
        self.0.get(plugin).and_then(Value::as_object)
    }

    pub fn field(&self, plugin: &str, key: &str) -> Option<&Value> {
        self.result(plugin).and_then(|result| result.get(key))
    }

    /// Whether the result of `plugin` was moved out to the blob store.
    pub fn is_offloaded(&self, plugin: &str) -> bool {
        self.field(plugin, FILE_SYSTEM_FLAG).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Mime type from the file type plugin, or the "not run yet" sentinel.
    pub fn mime_type(&self) -> &str {
        match self.status(FILE_TYPE) {
            AnalysisStatus::Complete => {
                self.field(FILE_TYPE, "mime").and_then(Value::as_str).unwrap_or(MIME_NOT_RUN)
            }
            AnalysisStatus::NotRun | AnalysisStatus::Partial => MIME_NOT_RUN,
        }
    }

    /// Name of the unpacker plugin recorded in the embedded result.
    pub fn unpacker_name(&self) -> Option<&str> {
        self.field(UNPACKER, "plugin_used").and_then(Value::as_str)
    }
}

/// Resolves offloaded plugin results into full ones.
pub trait AnalysisJoiner {
    fn retrieve_analysis(
        &self,
        store: &dyn DocumentStore,
        analysis: &ProcessedAnalysis,
    ) -> DbResult<ProcessedAnalysis>;
}

/// Joiner reading offloaded results from the store's blob table.
///
/// An offloaded entry whose blob is missing is kept as the stub.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobAnalysisJoiner;

impl AnalysisJoiner for BlobAnalysisJoiner {
    fn retrieve_analysis(
        &self,
        store: &dyn DocumentStore,
        analysis: &ProcessedAnalysis,
    ) -> DbResult<ProcessedAnalysis> {
        let mut joined = analysis.0.clone();
        for (plugin, entry) in joined.iter_mut() {
            if !analysis.is_offloaded(plugin) {
                continue;
            }
            let Some(blob_id) = entry.get(FILE_SYSTEM_ID).and_then(Value::as_str) else {
                continue;
            };
            if let Some(blob) = store.load_blob(blob_id)? {
                tracing::debug!(%plugin, %blob_id, "joined offloaded analysis result");
                *entry = blob;
            }
        }
        Ok(ProcessedAnalysis(joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis(value: Value) -> ProcessedAnalysis {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn status_distinguishes_missing_offloaded_and_complete() {
        let a = analysis(json!({
            "unpacker": {"file_system_flag": true, "file_system_id": "blob-1"},
            "file_type": {"mime": "application/zip"},
            "broken": "oops"
        }));
        assert_eq!(a.status("crypto"), AnalysisStatus::NotRun);
        assert_eq!(a.status(UNPACKER), AnalysisStatus::Partial);
        assert_eq!(a.status(FILE_TYPE), AnalysisStatus::Complete);
        assert_eq!(a.status("broken"), AnalysisStatus::Partial);
    }

    #[test]
    fn mime_type_falls_back_to_sentinel() {
        assert_eq!(analysis(json!({})).mime_type(), MIME_NOT_RUN);
        assert_eq!(analysis(json!({"file_type": {"mime": "text/plain"}})).mime_type(), "text/plain");
        assert_eq!(
            analysis(json!({"file_type": {"file_system_flag": true}})).mime_type(),
            MIME_NOT_RUN
        );
    }
}
