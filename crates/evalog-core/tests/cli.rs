//! End-to-end tests for the `evalog` binary.
//!
//! Tests cover:
//! - Header written once across repeated invocations
//! - Smoke record contents
//! - Config file and environment resolution
//! - Exit codes for schema drift and unusable destinations
//! - Header recovery for an empty existing log

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command isolated from the caller's evalog environment.
fn evalog(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("evalog").unwrap();
    cmd.env_remove("EVALOG_LOG_PATH")
        .env_remove("EVALOG_CONFIG")
        .env_remove("EVALOG_LOG")
        .env("EVALOG_DATA", home.join("data"))
        .env("XDG_CONFIG_HOME", home.join("config"));
    cmd
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

fn default_log(home: &Path) -> PathBuf {
    home.join("data").join("experiment_log.csv")
}

#[test]
fn smoke_writes_header_and_sample_row() {
    let tmp = TempDir::new().unwrap();

    evalog(tmp.path())
        .arg("smoke")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Logged run run-"));

    let rows = read_rows(&default_log(tmp.path()));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "run_id");
    assert_eq!(rows[0].len(), 14);
    assert_eq!(rows[1][2], "smoke_test");
    assert_eq!(rows[1][3], "openai:gpt-4o-mini");
    assert_eq!(rows[1][8], "123.4");
    assert_eq!(rows[1][11], "initial sanity");
}

#[test]
fn repeated_logs_share_one_header() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("nested").join("runs.csv");

    for task in ["a", "b", "c"] {
        evalog(tmp.path())
            .args(["log", "--task", task, "--log-path"])
            .arg(&log)
            .assert()
            .success();
    }

    let rows = read_rows(&log);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.iter().filter(|r| r[0] == "run_id").count(), 1);
    assert_eq!(rows[3][2], "c");
}

#[test]
fn json_output_reports_run_id() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("runs.csv");

    let output = evalog(tmp.path())
        .args(["--format", "json", "log", "--run-id", "exp-1", "--log-path"])
        .arg(&log)
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["run_id"], "exp-1");
    assert_eq!(doc["schema_version"], "1.0.0");
    assert_eq!(doc["record"]["run_id"], "exp-1");
    assert_eq!(doc["record"]["task"], "");
    let logged_ts = read_rows(&log)[1][1].clone();
    assert_eq!(doc["record"]["timestamp"], logged_ts.as_str());
    assert_eq!(read_rows(&log)[1][0], "exp-1");
}

#[test]
fn no_auto_id_leaves_run_id_empty() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("runs.csv");

    evalog(tmp.path())
        .args(["log", "--no-auto-id", "--task", "t", "--log-path"])
        .arg(&log)
        .assert()
        .success();

    let rows = read_rows(&log);
    assert_eq!(rows[1][0], "");
    assert!(!rows[1][1].is_empty());
}

#[test]
fn config_file_supplies_prefix_and_path() {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config").join("evalog");
    fs::create_dir_all(&config_dir).unwrap();
    let log = tmp.path().join("from-config.csv");
    let config = serde_json::json!({
        "log_path": log,
        "run_id_prefix": "bench",
    });
    fs::write(config_dir.join("config.json"), config.to_string()).unwrap();

    evalog(tmp.path())
        .args(["log", "--task", "t"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bench-"));

    assert!(read_rows(&log)[1][0].starts_with("bench-"));
}

#[test]
fn env_log_path_is_honored() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("env.csv");

    evalog(tmp.path())
        .env("EVALOG_LOG_PATH", &log)
        .arg("smoke")
        .assert()
        .success();

    assert!(log.exists());
    assert!(!default_log(tmp.path()).exists());
}

#[test]
fn header_drift_rejected_with_exit_code() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("old.csv");
    fs::write(&log, "run_id,task\nr1,x\n").unwrap();

    evalog(tmp.path())
        .args(["--header-check", "reject", "log", "--task", "t", "--log-path"])
        .arg(&log)
        .assert()
        .code(14)
        .stderr(predicate::str::contains("does not match schema"));

    assert_eq!(fs::read_to_string(&log).unwrap(), "run_id,task\nr1,x\n");
}

#[test]
fn parent_path_is_a_file() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    evalog(tmp.path())
        .args(["log", "--log-path"])
        .arg(blocker.join("runs.csv"))
        .assert()
        .code(10);
}

#[test]
fn destination_directory_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("runs.csv");
    fs::create_dir(&log).unwrap();

    evalog(tmp.path())
        .args(["log", "--task", "t", "--log-path"])
        .arg(&log)
        .assert()
        .code(13);

    assert!(log.is_dir());
    assert_eq!(fs::read_dir(&log).unwrap().count(), 0);
}

#[test]
fn empty_log_file_gains_header() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("runs.csv");
    fs::write(&log, "").unwrap();

    for task in ["a", "b"] {
        evalog(tmp.path())
            .args(["log", "--task", task, "--log-path"])
            .arg(&log)
            .assert()
            .success();
    }

    let rows = read_rows(&log);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "run_id");
    assert_eq!(rows.iter().filter(|r| r[0] == "run_id").count(), 1);
}

#[test]
fn missing_explicit_config_is_config_error() {
    let tmp = TempDir::new().unwrap();

    evalog(tmp.path())
        .args(["--config"])
        .arg(tmp.path().join("nope.json"))
        .arg("smoke")
        .assert()
        .code(10);
}

#[test]
fn score_prints_both_metrics() {
    let tmp = TempDir::new().unwrap();

    evalog(tmp.path())
        .args([
            "score",
            "--reference-term",
            "alpha",
            "--reference-term",
            "beta",
            "--context",
            "a b c",
            "--answer",
            "Alpha appears here",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("relevance=0.5"));

    evalog(tmp.path())
        .args(["score", "--context", "a b c", "--answer", "b c d", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"factuality\":0.5"));
}

#[test]
fn schema_lists_fields_in_order() {
    let tmp = TempDir::new().unwrap();

    evalog(tmp.path())
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("run_id\ntimestamp\ntask\nmodel\n"));
}
