//! CLI integration tests.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn adzengine() -> Command {
    cargo_bin_cmd!("adzengine")
}

/// A config file whose database lives next to it.
fn workspace(extra: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("ads.db");
    let path = dir.path().join("config.toml");
    let contents = format!(
        "[database]\nurl = \"{}\"\npool_size = 2\n\n[logging]\nlevel = \"error\"\n{extra}",
        db.display()
    );
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

#[test]
fn test_help_lists_commands() {
    adzengine()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("rank"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_migrate_creates_database() {
    let (dir, config) = workspace("");
    adzengine()
        .args(["migrate", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Database schema is current"));
    assert!(dir.path().join("ads.db").exists());
}

#[test]
fn test_check_config_json() {
    let (_dir, config) = workspace("\n[matching]\ntop_n = 7\n");
    adzengine()
        .args(["--json", "check-config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\":true"))
        .stdout(predicate::str::contains("\"top_n\":7"));
}

#[test]
fn test_check_config_rejects_invalid_fee() {
    let (_dir, config) = workspace("\n[ledger]\nplatform_fee = 1.5\n");
    adzengine()
        .args(["check-config", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("platform_fee"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    adzengine()
        .args(["migrate", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("migrate failed"));
}

#[test]
fn test_balance_of_unknown_user_fails() {
    let (_dir, config) = workspace("");
    adzengine()
        .args(["balance", "--user", "nobody", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("balance failed"));
}

#[test]
fn test_rank_unknown_campaign_fails() {
    let (_dir, config) = workspace("");
    adzengine()
        .args(["rank", "--campaign", "missing", "--config"])
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_reconcile_empty_database() {
    let (_dir, config) = workspace("");
    adzengine()
        .args(["reconcile", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Every billable record is settled"));
}

#[test]
fn test_reconcile_json_lists_nothing() {
    let (_dir, config) = workspace("");
    adzengine()
        .args(["--json", "reconcile", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unsettled\":[]"));
}
