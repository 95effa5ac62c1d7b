//! CLI binary integration tests using assert_cmd + predicates.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("schema-contract").expect("binary should exist")
}

fn write_json(dir: &TempDir, name: &str, value: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, value.to_string()).unwrap();
    path
}

// ── Diff exit-code contract ─────────────────────────────────────────────────

#[test]
fn diff_exits_zero_when_no_breaking_changes() {
    let dir = TempDir::new().unwrap();
    let base = write_json(&dir, "base.json", &serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}}}));
    let next = write_json(&dir, "next.json", &serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}, "extra": {"type": "number"}}}));

    cmd()
        .args(["diff", base.to_str().unwrap(), next.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"breakingCount\": 0"));
}

#[test]
fn diff_exits_one_when_required_is_removed() {
    let dir = TempDir::new().unwrap();
    let base = write_json(
        &dir,
        "base.json",
        &serde_json::json!({"type": "object", "required": ["id"], "properties": {"id": {"type": "string"}}}),
    );
    let next = write_json(&dir, "next.json", &serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}}}));

    cmd()
        .args(["diff", base.to_str().unwrap(), next.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"/id\""));
}

#[test]
fn diff_exits_two_on_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let next = write_json(&dir, "next.json", &serde_json::json!({"type": "string"}));

    cmd()
        .args(["diff", dir.path().join("missing.json").to_str().unwrap(), next.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to open input file"));
}

#[test]
fn diff_exits_two_on_malformed_json() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("base.json");
    fs::write(&base, "{ not json").unwrap();
    let next = write_json(&dir, "next.json", &serde_json::json!({"type": "string"}));

    cmd()
        .args(["diff", base.to_str().unwrap(), next.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse JSON"));
}

#[test]
fn diff_writes_report_to_output_file() {
    let dir = TempDir::new().unwrap();
    let base = write_json(&dir, "base.json", &serde_json::json!({"type": "string"}));
    let next = write_json(&dir, "next.json", &serde_json::json!({"type": "string"}));
    let output = dir.path().join("report.json");

    cmd()
        .args(["diff", base.to_str().unwrap(), next.to_str().unwrap()])
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["breakingCount"], 0);
}

#[test]
fn diff_supports_compact_output_format() {
    let dir = TempDir::new().unwrap();
    let base = write_json(&dir, "base.json", &serde_json::json!({"type": "string"}));
    let next = write_json(&dir, "next.json", &serde_json::json!({"type": "string"}));

    cmd()
        .args(["diff", base.to_str().unwrap(), next.to_str().unwrap()])
        .args(["--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"breakingCount\":0"));
}

// ── Infer ────────────────────────────────────────────────────────────────────

#[test]
fn infer_produces_a_schema_from_a_sample_payload() {
    let dir = TempDir::new().unwrap();
    let payload = write_json(&dir, "payload.json", &serde_json::json!({"id": "abc", "count": 3}));

    cmd()
        .args(["infer", payload.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"object\""))
        .stdout(predicate::str::contains("\"count\""));
}

// ── Normalize ────────────────────────────────────────────────────────────────

#[test]
fn normalize_promotes_required_true_hints() {
    let dir = TempDir::new().unwrap();
    let schema = write_json(
        &dir,
        "schema.json",
        &serde_json::json!({"type": "object", "properties": {"id": {"type": "string", "required": true}}}),
    );

    let assert = cmd().args(["normalize", schema.to_str().unwrap()]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let normalized: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(normalized["required"], serde_json::json!(["id"]));
    assert!(normalized["properties"]["id"].get("required").is_none());
}
