mod common;

use predicates::prelude::*;
use tempfile::tempdir;

use common::{seed_store, write_config};

fn firmdex(db: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("firmdex");
    cmd.env_remove("FIRMDEX_CONFIG").env_remove("FIRMDEX_LOG").arg("--db").arg(db);
    cmd
}

#[test]
fn hid_prints_firmware_identifier() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    firmdex(&db)
        .args(["hid", "fw1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACME Router1 -1.0 (router)"));
}

#[test]
fn hid_json_for_unknown_uid_is_empty() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    let output = firmdex(&db).args(["hid", "nope", "--json"]).output().expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["hid"], "");
}

#[test]
fn meta_list_shows_joined_unpacker_tag() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    firmdex(&db)
        .args(["meta-list", "fw1", "fo1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("squashfs(info)"))
        .stdout(predicate::str::contains("stable(success)"))
        .stdout(predicate::str::contains("/bin/busybox"))
        .stdout(predicate::str::contains("2023-11-14 22:13:20"));
}

#[test]
fn latest_firmwares_json_is_newest_first() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    let output = firmdex(&db).args(["latest-firmwares", "--limit", "5", "--json"]).output().expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let uids: Vec<_> = value.as_array().unwrap().iter().map(|e| e["uid"].as_str().unwrap()).collect();
    assert_eq!(uids, vec!["fw2", "fw1"]);
}

#[test]
fn nice_list_prints_paths_and_mime() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    firmdex(&db)
        .args(["nice-list", "fo1", "--root", "fw1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("application/x-executable"))
        .stdout(predicate::str::contains("fw1|/bin/busybox"));
}

#[test]
fn search_and_count_use_json_filters() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    let output = firmdex(&db)
        .args(["search", r#"{"$or": [{"vendor": "ACME"}, {"file_name": "busybox"}]}"#, "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let uids: Vec<String> = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(uids, vec!["fw1", "fw2", "fo1"]);

    firmdex(&db)
        .args(["count", r#"{"file_name": "busybox"}"#, "--parent-firmware"])
        .assert()
        .success()
        .stdout("1\n");
    firmdex(&db).args(["count", "{}"]).assert().success().stdout("1\n");
    firmdex(&db).args(["count", "{}", "--parent-firmware"]).assert().success().stdout("0\n");
}

#[test]
fn debug_log_level_reports_search_on_stderr() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    firmdex(&db)
        .env("FIRMDEX_LOG", "debug")
        .args(["search", r#"{"vendor": "ACME"}"#, "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("store opened"))
        .stderr(predicate::str::contains("search finished"));

    firmdex(&db)
        .args(["search", r#"{"vendor": "ACME"}"#, "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("search finished").not());
}

#[test]
fn tree_prints_virtual_directories_and_placeholder() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    firmdex(&db)
        .args(["tree", "fo1", "--root", "fw1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bin/"))
        .stdout(predicate::str::contains("busybox [fo1]"));
    firmdex(&db)
        .args(["tree", "missing", "--root", "fw1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("missing (not analyzed yet)"));
}

#[test]
fn reports_render_comments_devices_and_structure() {
    let dir = tempdir().expect("tempdir");
    let db = seed_store(dir.path());
    firmdex(&db)
        .args(["comments"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice on fo1: suspicious"));
    firmdex(&db)
        .args(["device-names"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACME: Router1"));
    firmdex(&db).args(["vendors"]).assert().success().stdout(predicate::str::contains("- ACME"));
    firmdex(&db).args(["device-classes"]).assert().success().stdout(predicate::str::contains("- router"));
    firmdex(&db)
        .args(["other-versions", "fw1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.1 [fw2]"));
    firmdex(&db)
        .args(["analysis-structure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("└── file_type"));
}

#[test]
fn config_file_locates_store() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let config = write_config(dir.path());
    assert_cmd::cargo::cargo_bin_cmd!("firmdex")
        .env_remove("FIRMDEX_LOG")
        .env("FIRMDEX_CONFIG", &config)
        .args(["vendors", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ACME\""));
}
