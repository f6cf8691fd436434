//! Minimal aggregation pipeline over in-process documents.

use serde_json::Value;

use crate::db::query::{get_path, project_document, set_path, sort_documents};
use crate::db::{Document, Query, SortKey};

/// One aggregation stage.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Keep documents matching the filter.
    Match(Query),
    /// Keep `_id` and the listed fields.
    Project(Vec<String>),
    /// Emit one document per element of the array at the given path.
    ///
    /// Documents where the path is missing, not an array, or empty are dropped.
    Unwind(String),
    /// Stable sort by the given keys.
    Sort(Vec<SortKey>),
    /// Truncate to the first `n` documents.
    Limit(usize),
}

/// Run `stages` in order over `documents`.
pub fn run_pipeline(documents: Vec<Document>, stages: &[Stage]) -> Vec<Document> {
    stages.iter().fold(documents, |docs, stage| apply_stage(docs, stage))
}

fn apply_stage(mut documents: Vec<Document>, stage: &Stage) -> Vec<Document> {
    match stage {
        Stage::Match(query) => documents.into_iter().filter(|doc| query.matches(doc)).collect(),
        Stage::Project(fields) => {
            documents.iter().map(|doc| project_document(doc, fields)).collect()
        }
        Stage::Unwind(path) => documents.into_iter().flat_map(|doc| unwind(doc, path)).collect(),
        Stage::Sort(keys) => {
            sort_documents(&mut documents, keys);
            documents
        }
        Stage::Limit(n) => {
            documents.truncate(*n);
            documents
        }
    }
}

fn unwind(document: Document, path: &str) -> Vec<Document> {
    let items = match get_path(&document, path) {
        Some(Value::Array(items)) => items.clone(),
        _ => return Vec::new(),
    };
    items
        .into_iter()
        .map(|item| {
            let mut unwound = document.clone();
            set_path(&mut unwound, path, item);
            unwound
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn unwind_sort_limit_over_comments() {
        let docs = vec![
            doc(json!({"_id": "a", "comments": [{"time": 1}, {"time": 5}], "size": 3})),
            doc(json!({"_id": "b", "comments": []})),
            doc(json!({"_id": "c", "comments": [{"time": 3}]})),
        ];
        let out = run_pipeline(
            docs,
            &[
                Stage::Project(vec!["comments".into()]),
                Stage::Unwind("comments".into()),
                Stage::Sort(vec![SortKey::descending("comments.time")]),
                Stage::Limit(2),
            ],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], doc(json!({"_id": "a", "comments": {"time": 5}})));
        assert_eq!(out[1], doc(json!({"_id": "c", "comments": {"time": 3}})));
    }
}
