mod common;

use firmdex_core::db::{Collection, Query, SqliteStore};
use firmdex_core::services::FrontendDb;
use serde_json::json;

use common::{file_object, firmware, frontend, insert};

fn hit(mut doc: serde_json::Value) -> serde_json::Value {
    doc["hit"] = json!(true);
    doc
}

/// Firmware fwZ/fwA match; fwM only contains matching files.
fn seeded() -> FrontendDb<SqliteStore> {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    insert(&store, Collection::Firmwares, hit(firmware("fwZ", "Zyx", "Router", "1", 30.0)));
    insert(&store, Collection::Firmwares, hit(firmware("fwA", "ACME", "Router", "1", 10.0)));
    insert(&store, Collection::Firmwares, firmware("fwM", "Midco", "Switch", "1", 20.0));
    insert(&store, Collection::FileObjects, hit(file_object("fo_b", "b.bin", json!({"fwM": ["fwM|/b.bin"]}))));
    insert(
        &store,
        Collection::FileObjects,
        hit(file_object("fo_a", "a.bin", json!({"fwA": ["fwA|/a.bin"], "fwM": ["fwM|/x/a.bin"]}))),
    );
    insert(&store, Collection::FileObjects, file_object("fo_c", "c.bin", json!({"fwZ": ["fwZ|/c.bin"]})));
    frontend(store)
}

fn query() -> Query {
    Query::parse(r#"{"hit": true}"#).expect("query")
}

#[test]
fn firmware_tier_comes_before_file_tier_with_unlimited_results() {
    let db = seeded();
    let result = db.generic_search(&query(), 0, 0, false).expect("search");
    assert_eq!(result, vec!["fwA", "fwZ", "fo_a", "fo_b"]);
}

#[test]
fn full_first_tier_skips_second_tier() {
    let db = seeded();
    let result = db.generic_search(&query(), 0, 2, false).expect("search");
    assert_eq!(result, vec!["fwA", "fwZ"]);
}

#[test]
fn skip_past_firmware_tier_carries_into_file_tier() {
    let db = seeded();
    let result = db.generic_search(&query(), 3, 0, false).expect("search");
    assert_eq!(result, vec!["fo_b"]);
}

#[test]
fn skip_inside_firmware_tier_resets_file_tier_offset() {
    let db = seeded();
    let result = db.generic_search(&query(), 1, 2, false).expect("search");
    assert_eq!(result, vec!["fwZ", "fo_a"]);
}

#[test]
fn parent_firmware_search_deduplicates_in_first_seen_order() {
    let db = seeded();
    let result = db.generic_search(&query(), 0, 0, true).expect("search");
    assert_eq!(result, vec!["fwA", "fwZ", "fwM"]);
}

#[test]
fn total_matches_per_mode() {
    let db = seeded();
    assert_eq!(db.get_number_of_total_matches(&query(), false).expect("count"), 2);
    assert_eq!(db.get_number_of_total_matches(&query(), true).expect("count"), 3);
}

#[test]
fn empty_query_counts_every_file_object_unless_restricted() {
    let db = seeded();
    let empty = Query::parse("{}").expect("query");
    assert_eq!(db.get_number_of_total_matches(&empty, false).expect("count"), 3);
    assert_eq!(db.get_number_of_total_matches(&empty, true).expect("count"), 0);

    let listed = db.generic_search(&empty, 0, 0, false).expect("search");
    let file_objects = listed.iter().filter(|uid| uid.starts_with("fo_")).count();
    assert_eq!(file_objects, db.get_number_of_total_matches(&empty, false).expect("count"));
}

#[test]
fn regex_query_searches_both_tiers() {
    let db = seeded();
    let by_name = Query::parse(r#"{"$or": [{"vendor": {"$regex": "^acme", "$options": "i"}}, {"file_name": "c.bin"}]}"#)
        .expect("query");
    assert_eq!(db.generic_search(&by_name, 0, 0, false).expect("search"), vec!["fwA", "fo_c"]);
}

#[test]
fn rest_firmware_listing_is_newest_first_unless_recursive() {
    let db = seeded();
    assert_eq!(db.rest_get_firmware_uids(0, 0, None, false).expect("uids"), vec!["fwZ", "fwM", "fwA"]);
    assert_eq!(db.rest_get_firmware_uids(1, 1, None, false).expect("uids"), vec!["fwM"]);
    assert_eq!(db.rest_get_firmware_uids(0, 0, Some(&query()), true).expect("uids"), vec!["fwA", "fwZ", "fwM"]);
}

#[test]
fn rest_file_object_listing_pages_in_store_order() {
    let db = seeded();
    assert_eq!(db.rest_get_file_object_uids(0, 0, None).expect("uids"), vec!["fo_b", "fo_a", "fo_c"]);
    assert_eq!(db.rest_get_file_object_uids(1, 1, None).expect("uids"), vec!["fo_a"]);
    assert_eq!(db.rest_get_file_object_uids(0, 0, Some(&query())).expect("uids"), vec!["fo_b", "fo_a"]);
}
