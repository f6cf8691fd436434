//! Small aggregate reports: the comment feed and the analysis field structure.

use serde_json::{json, Value};
use tracing::debug;

use crate::analysis::{visualize_complete_tree, AnalysisStructure};
use crate::db::{
    from_document, Collection, DbError, DbResult, Document, DocumentStore, FieldStatistic,
    FindOptions, Query, SortKey, Stage,
};
use crate::model::{Comment, CommentEntry};
use crate::services::FrontendDb;

const PROCESSED_ANALYSIS: &str = "processed_analysis";

fn comment_entry(document: Document) -> DbResult<CommentEntry> {
    let uid = document.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
    let raw = document.get("comments").cloned().unwrap_or(Value::Null);
    let comment: Comment = serde_json::from_value(raw).map_err(|source| DbError::MalformedDocument {
        collection: Collection::FileObjects,
        id: uid.clone(),
        source,
    })?;
    Ok(CommentEntry { comment, uid })
}

impl<S: DocumentStore> FrontendDb<S> {
    /// The `limit` most recent comments across all file objects, newest first.
    pub fn get_latest_comments(&self, limit: usize) -> DbResult<Vec<CommentEntry>> {
        let pipeline = [
            Stage::Match(Query::from_value(json!({"comments": {"$not": {"$size": 0}}}))?),
            Stage::Project(vec!["comments".to_string()]),
            Stage::Unwind("comments".to_string()),
            Stage::Sort(vec![SortKey::descending("comments.time")]),
            Stage::Limit(limit),
        ];
        let mut comments = self
            .store
            .aggregate(Collection::FileObjects, &pipeline)?
            .into_iter()
            .map(comment_entry)
            .collect::<DbResult<Vec<_>>>()?;
        comments.sort_by(|a, b| b.comment.time.total_cmp(&a.comment.time));
        Ok(comments)
    }

    /// Tree of analysis fields present in at least `structural_threshold`
    /// percent of file objects.
    pub fn create_analysis_structure(&self) -> DbResult<AnalysisStructure> {
        if self.store.count_documents(Collection::FileObjectKeys, &Query::all())? == 0 {
            return Ok(AnalysisStructure::NotComputed);
        }
        let prefix = format!("{PROCESSED_ANALYSIS}.");
        let mut fields = Vec::new();
        for doc in self.store.find(Collection::FileObjectKeys, &Query::all(), &FindOptions::new())? {
            let statistic: FieldStatistic = from_document(Collection::FileObjectKeys, doc)?;
            if statistic.percent_containing < self.structural_threshold {
                continue;
            }
            if let Some(field) = statistic.id.key.strip_prefix(&prefix) {
                fields.push(field.to_string());
            }
        }
        debug!(threshold = self.structural_threshold, fields = fields.len(), "analysis structure");
        Ok(AnalysisStructure::Tree(visualize_complete_tree(fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_entry_takes_uid_from_document_id() {
        let doc = json!({"_id": "fo1", "comments": {"comment": "hi", "author": "me", "time": 3.0}});
        let entry = comment_entry(doc.as_object().unwrap().clone()).unwrap();
        assert_eq!(entry.uid, "fo1");
        assert_eq!(entry.comment.comment, "hi");
        assert_eq!(entry.comment.time, 3.0);
    }

    #[test]
    fn comment_entry_rejects_non_object_comment() {
        let doc = json!({"_id": "fo1", "comments": 7});
        assert!(matches!(
            comment_entry(doc.as_object().unwrap().clone()),
            Err(DbError::MalformedDocument { .. })
        ));
    }
}
