//! End-to-end CLI tests: each test runs the `cup` binary in an isolated
//! temp directory with an explicit config/data path and checks both the
//! human workflow and the JSON contracts.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness
// ---------------------------------------------------------------------------

/// Build a `cup` command rooted in `dir`, acting as `user`.
fn cup(dir: &Path, user: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cup"));
    cmd.current_dir(dir);
    cmd.arg("--data").arg(dir.join("catalog.json"));
    cmd.arg("--config").arg(dir.join("config.toml"));
    cmd.env("CUPPA_USER", user);
    // Quiet tracing on stderr.
    cmd.env("CUPPA_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

/// Add a shop via `--json`, returning its server id.
fn add_shop(dir: &Path, user: &str, name: &str, extra: &[&str]) -> String {
    let mut cmd = cup(dir, user);
    cmd.args(["add", name, "--json"]);
    cmd.args(extra);
    let output = cmd.output().expect("add should not crash");
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value =
        serde_json::from_slice(&output.stdout).expect("add --json should produce valid JSON");
    json["id"].as_str().expect("id field").to_string()
}

fn list_json(dir: &Path, user: &str, extra: &[&str]) -> Vec<Value> {
    let mut cmd = cup(dir, user);
    cmd.args(["list", "--json"]);
    cmd.args(extra);
    let output = cmd.output().expect("list should not crash");
    assert!(
        output.status.success(),
        "list failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json.as_array().expect("array output").clone()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_creates_catalog_and_config() {
    let dir = TempDir::new().expect("tempdir");
    cup(dir.path(), "alice")
        .args(["init", "--curator", "alice", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"catalog_created\": true"));
    assert!(dir.path().join("catalog.json").exists());
    assert!(dir.path().join("config.toml").exists());

    // Second init finds, not clobbers.
    cup(dir.path(), "alice")
        .args(["init", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"catalog_created\": false"));
}

#[test]
fn add_then_list_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let id = add_shop(
        dir.path(),
        "alice",
        "Huckleberry Roasters",
        &["--rating", "4.5", "--price", "2", "--category", "sunnyside"],
    );
    assert!(id.starts_with("srv-"), "server-assigned id, got {id}");

    let items = list_json(dir.path(), "alice", &[]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Huckleberry Roasters");
    assert_eq!(items[0]["rating"], 4.5);
    assert_eq!(items[0]["price_level"], 2);
    assert_eq!(items[0]["category"], "sunnyside");
    assert_eq!(items[0]["owner_id"], "alice");
}

#[test]
fn list_sorts_by_rating_with_id_tiebreak() {
    let dir = TempDir::new().expect("tempdir");
    let a = add_shop(dir.path(), "alice", "Alpha", &["--rating", "4.0"]);
    let b = add_shop(dir.path(), "alice", "Beta", &["--rating", "4.0"]);
    let c = add_shop(dir.path(), "alice", "Gamma", &["--rating", "5.0"]);

    let items = list_json(dir.path(), "alice", &["--sort", "rating"]);
    let ids: Vec<&str> = items.iter().map(|i| i["id"].as_str().expect("id")).collect();
    assert_eq!(ids, [c.as_str(), a.as_str(), b.as_str()]);
}

#[test]
fn search_filters_the_table() {
    let dir = TempDir::new().expect("tempdir");
    add_shop(
        dir.path(),
        "alice",
        "Crema",
        &["--address", "2862 Larimer St"],
    );
    add_shop(dir.path(), "alice", "Corvus", &["--tags", "pour-over"]);

    let hits = list_json(dir.path(), "alice", &["--query", "larimer"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Crema");

    let hits = list_json(dir.path(), "alice", &["--query", "pour-over"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Corvus");
}

#[test]
fn quick_edits_persist() {
    let dir = TempDir::new().expect("tempdir");
    let id = add_shop(dir.path(), "alice", "Crema", &["--rating", "3.0"]);

    cup(dir.path(), "alice")
        .args(["rate", id.as_str(), "4.5"])
        .assert()
        .success();
    cup(dir.path(), "alice")
        .args(["price", id.as_str(), "3"])
        .assert()
        .success();

    let items = list_json(dir.path(), "alice", &[]);
    assert_eq!(items[0]["rating"], 4.5);
    assert_eq!(items[0]["price_level"], 3);
}

#[test]
fn off_grid_rating_is_rejected_with_code() {
    let dir = TempDir::new().expect("tempdir");
    let id = add_shop(dir.path(), "alice", "Crema", &[]);

    cup(dir.path(), "alice")
        .args(["rate", id.as_str(), "3.3", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));

    // Value unchanged.
    let items = list_json(dir.path(), "alice", &[]);
    assert_eq!(items[0]["rating"], 0.0);
}

#[test]
fn edit_and_rm() {
    let dir = TempDir::new().expect("tempdir");
    let id = add_shop(dir.path(), "alice", "Crema", &["--category", "rino"]);

    cup(dir.path(), "alice")
        .args(["edit", id.as_str(), "--notes", "best cortado in town", "--clear-category"])
        .assert()
        .success();

    let items = list_json(dir.path(), "alice", &[]);
    assert_eq!(items[0]["notes"], "best cortado in town");
    assert!(items[0].get("category").is_none(), "category cleared");

    cup(dir.path(), "alice").args(["rm", id.as_str()]).assert().success();
    assert!(list_json(dir.path(), "alice", &[]).is_empty());
}

#[test]
fn show_prints_capabilities() {
    let dir = TempDir::new().expect("tempdir");
    let id = add_shop(dir.path(), "alice", "Crema", &[]);
    cup(dir.path(), "alice")
        .args(["show", id.as_str(), "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("view, edit, delete"));
}

// ---------------------------------------------------------------------------
// Private vs. shared scopes
// ---------------------------------------------------------------------------

#[test]
fn private_lists_are_isolated_per_user() {
    let dir = TempDir::new().expect("tempdir");
    add_shop(dir.path(), "alice", "Alice's spot", &[]);
    assert!(list_json(dir.path(), "bob", &[]).is_empty());
}

#[test]
fn shared_list_is_visible_to_everyone_but_owner_guarded() {
    let dir = TempDir::new().expect("tempdir");
    let id = add_shop(dir.path(), "alice", "Shared find", &["--shared"]);

    let items = list_json(dir.path(), "bob", &["--shared"]);
    assert_eq!(items.len(), 1);

    // Bob cannot mutate Alice's shared item.
    cup(dir.path(), "bob")
        .args(["rate", id.as_str(), "1.0", "--shared", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));

    // Alice still can.
    cup(dir.path(), "alice")
        .args(["rate", id.as_str(), "5.0", "--shared"])
        .assert()
        .success();
}

#[test]
fn curator_may_edit_any_shared_item() {
    let dir = TempDir::new().expect("tempdir");
    // Configure carol as curator.
    cup(dir.path(), "alice")
        .args(["init", "--curator", "carol"])
        .assert()
        .success();
    let id = add_shop(dir.path(), "alice", "Shared find", &["--shared"]);

    cup(dir.path(), "carol")
        .args(["rate", id.as_str(), "2.5", "--shared"])
        .assert()
        .success();

    let items = list_json(dir.path(), "alice", &["--shared"]);
    assert_eq!(items[0]["rating"], 2.5);
}

#[test]
fn private_view_without_identity_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cup"));
    cmd.current_dir(dir.path());
    cmd.arg("--data").arg(dir.path().join("catalog.json"));
    cmd.arg("--config").arg(dir.path().join("config.toml"));
    cmd.env_remove("CUPPA_USER");
    cmd.env_remove("FORMAT");
    cmd.env("CUPPA_LOG", "error");
    cmd.args(["list", "--json"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

#[test]
fn map_shows_only_items_with_coordinates() {
    let dir = TempDir::new().expect("tempdir");
    add_shop(
        dir.path(),
        "alice",
        "Mapped",
        &["--lat", "39.7613", "--lng", "-104.9831"],
    );
    add_shop(dir.path(), "alice", "Unmapped", &[]);

    let output = cup(dir.path(), "alice")
        .args(["map", "--json"])
        .output()
        .expect("map should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let markers = json["markers"].as_array().expect("markers array");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["label"], "Mapped (0)");
}

#[test]
fn map_pretty_output_names_the_viewport() {
    let dir = TempDir::new().expect("tempdir");
    add_shop(
        dir.path(),
        "alice",
        "Solo",
        &["--lat", "39.7613", "--lng", "-104.9831"],
    );
    cup(dir.path(), "alice")
        .args(["map", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("viewport: zoom 15"));
}
