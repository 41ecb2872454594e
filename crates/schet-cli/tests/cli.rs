//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn rules_show_prints_builtin_patterns() {
    let mut cmd = Command::cargo_bin("schet").unwrap();
    cmd.args(["rules", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invoice_number"))
        .stdout(predicate::str::contains("pattern"));
}

#[test]
fn config_init_creates_a_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut cmd = Command::cargo_bin("schet").unwrap();
    cmd.args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();

    assert!(path.exists());

    let mut show = Command::cargo_bin("schet").unwrap();
    show.arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dpi"));
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{}").unwrap();

    let mut cmd = Command::cargo_bin("schet").unwrap();
    cmd.args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn rules_init_then_validate_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");

    Command::cargo_bin("schet")
        .unwrap()
        .args(["rules", "init", "--output"])
        .arg(&path)
        .assert()
        .success();

    Command::cargo_bin("schet")
        .unwrap()
        .args(["rules", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("patterns compile"));
}

#[test]
fn process_rejects_missing_input() {
    let mut cmd = Command::cargo_bin("schet").unwrap();
    cmd.args(["process", "no-such-file.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn batch_rejects_empty_glob() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = dir.path().join("*.pdf").display().to_string();

    let mut cmd = Command::cargo_bin("schet").unwrap();
    cmd.args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}
