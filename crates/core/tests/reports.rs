mod common;

use firmdex_core::analysis::{AnalysisStructure, STATISTICS_NOT_COMPUTED};
use firmdex_core::db::{Collection, SqliteStore};
use serde_json::json;

use common::{file_object, frontend, insert};

fn statistic(key: &str, percent: f64) -> serde_json::Value {
    json!({"_id": {"key": key}, "percentContaining": percent})
}

#[test]
fn latest_comments_are_newest_first_across_objects() {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    let mut fo1 = file_object("fo1", "a", json!({}));
    fo1["comments"] = json!([
        {"comment": "old", "author": "alice", "time": 1.0},
        {"comment": "newest", "author": "alice", "time": 5.0},
    ]);
    insert(&store, Collection::FileObjects, fo1);
    let mut fo2 = file_object("fo2", "b", json!({}));
    fo2["comments"] = json!([{"text": "mid", "author": "bob", "time": 3.0}]);
    insert(&store, Collection::FileObjects, fo2);
    insert(&store, Collection::FileObjects, file_object("fo3", "c", json!({})));
    let mut fo4 = file_object("fo4", "d", json!({}));
    fo4.as_object_mut().unwrap().remove("comments");
    insert(&store, Collection::FileObjects, fo4);
    let db = frontend(store);

    let all = db.get_latest_comments(10).expect("comments");
    let texts: Vec<_> = all.iter().map(|entry| entry.comment.comment.as_str()).collect();
    assert_eq!(texts, vec!["newest", "mid", "old"]);
    let uids: Vec<_> = all.iter().map(|entry| entry.uid.as_str()).collect();
    assert_eq!(uids, vec!["fo1", "fo2", "fo1"]);
    assert_eq!(all[1].comment.author.as_deref(), Some("bob"));

    let top = db.get_latest_comments(2).expect("comments");
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].comment.comment, "newest");
    assert_eq!(top[1].comment.comment, "mid");
}

#[test]
fn latest_comments_on_empty_store() {
    let db = frontend(SqliteStore::open_in_memory().expect("in-memory store"));
    assert!(db.get_latest_comments(5).expect("comments").is_empty());
}

#[test]
fn analysis_structure_not_computed_without_statistics() {
    let db = frontend(SqliteStore::open_in_memory().expect("in-memory store"));
    let structure = db.create_analysis_structure().expect("structure");
    assert_eq!(structure, AnalysisStructure::NotComputed);
    assert_eq!(structure.to_string().trim_end(), STATISTICS_NOT_COMPUTED);
}

#[test]
fn analysis_structure_applies_threshold_and_strips_prefix() {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    insert(&store, Collection::FileObjectKeys, statistic("processed_analysis", 100.0));
    insert(&store, Collection::FileObjectKeys, statistic("processed_analysis.file_type", 100.0));
    insert(&store, Collection::FileObjectKeys, statistic("processed_analysis.file_type.mime", 90.0));
    insert(&store, Collection::FileObjectKeys, statistic("processed_analysis.crypto.keys", 10.0));
    insert(&store, Collection::FileObjectKeys, statistic("file_name", 100.0));
    insert(&store, Collection::FileObjectKeys, statistic("processed_analysis.exact", 50.0));

    let db = frontend(store);
    let AnalysisStructure::Tree(tree) = db.create_analysis_structure().expect("structure") else {
        panic!("expected a field tree");
    };
    assert_eq!(tree.names().collect::<Vec<_>>(), vec!["exact", "file_type"]);
    assert!(tree.get("file_type").and_then(|node| node.get("mime")).is_some());

    let rendered = db.create_analysis_structure().expect("structure").to_string();
    assert!(rendered.contains("file_type"));
    assert!(!rendered.contains("crypto"));
    assert!(!rendered.contains("file_name"));
}

#[test]
fn lower_threshold_includes_rare_fields() {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    insert(&store, Collection::FileObjectKeys, statistic("processed_analysis.file_type", 100.0));
    insert(&store, Collection::FileObjectKeys, statistic("processed_analysis.crypto.keys", 10.0));

    let db = frontend(store).with_structural_threshold(5.0);
    let AnalysisStructure::Tree(tree) = db.create_analysis_structure().expect("structure") else {
        panic!("expected a field tree");
    };
    assert_eq!(tree.names().collect::<Vec<_>>(), vec!["crypto", "file_type"]);
    assert_eq!(tree.to_string(), "├── crypto\n│   └── keys\n└── file_type\n");
}
