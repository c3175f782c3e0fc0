//! Integration tests for the localmind CLI.
//!
//! Only commands that never touch the model run here; everything that needs
//! an Ollama daemon is covered by the library-level tests with a mock
//! client.

use assert_cmd::cargo;
use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use tempfile::TempDir;

fn localmind() -> Command {
    Command::new(cargo::cargo_bin!("localmind"))
}

#[test]
fn test_help() {
    localmind()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local-first personal AI assistant"));
}

#[test]
fn test_version() {
    localmind()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_debug_interactive_requires_problem() {
    localmind().arg("debug-interactive").assert().failure();
}

#[test]
fn test_plan_requires_message() {
    localmind().arg("plan").assert().failure();
}

#[test]
fn test_cleanup_on_empty_store() {
    let temp = TempDir::new().unwrap();
    localmind()
        .arg("--root")
        .arg(temp.path())
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("No old logs to clean up."));
}

#[test]
fn test_cleanup_removes_old_records() {
    let temp = TempDir::new().unwrap();

    // Seed the store with one stale and one fresh record
    let store = localmind::store::LogStore::open(temp.path()).unwrap();
    let mut stale = localmind::store::LogRecord::new("plan", "old prompt", "old response");
    stale.timestamp = Utc::now() - Duration::days(30);
    store.append(&stale).unwrap();
    store
        .append(&localmind::store::LogRecord::new("plan", "fresh", "r"))
        .unwrap();

    localmind()
        .arg("--root")
        .arg(temp.path())
        .arg("cleanup")
        .arg("7")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 log entries"));

    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn test_search_empty_store() {
    let temp = TempDir::new().unwrap();
    localmind()
        .arg("--root")
        .arg(temp.path())
        .arg("search")
        .arg("anything")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries match"));
}

#[test]
fn test_search_finds_seeded_record() {
    let temp = TempDir::new().unwrap();
    let store = localmind::store::LogStore::open(temp.path()).unwrap();
    store
        .append(&localmind::store::LogRecord::new(
            "debug",
            "the parser crashes on empty input",
            "response",
        ))
        .unwrap();

    localmind()
        .arg("--root")
        .arg(temp.path())
        .arg("search")
        .arg("parser")
        .assert()
        .success()
        .stdout(predicate::str::contains("parser crashes"));
}

#[test]
fn test_weekly_with_no_records() {
    let temp = TempDir::new().unwrap();
    localmind()
        .arg("--root")
        .arg(temp.path())
        .arg("weekly")
        .assert()
        .success()
        .stdout(predicate::str::contains("No logs from the past week."));
}

#[test]
fn test_weekly_renders_seeded_records() {
    let temp = TempDir::new().unwrap();
    let store = localmind::store::LogStore::open(temp.path()).unwrap();
    store
        .append(
            &localmind::store::LogRecord::new("journal", "long day", "rest").with_metrics(
                Some(7),
                Some(8),
                Some(2),
            ),
        )
        .unwrap();

    localmind()
        .arg("--root")
        .arg(temp.path())
        .arg("weekly")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total interactions: 1"))
        .stdout(predicate::str::contains("Focus"));
}

#[test]
fn test_invalid_config_is_a_clean_error() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("localmind.toml"), "timeout_secs = 0\n").unwrap();

    localmind()
        .arg("--root")
        .arg(temp.path())
        .arg("weekly")
        .assert()
        .failure()
        .code(7)
        .stderr(predicate::str::contains("Invalid configuration"));
}
