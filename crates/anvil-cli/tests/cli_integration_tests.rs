//! End-to-end tests against the compiled `anvil` binary, each with its own
//! `ANVIL_HOME` so they never touch the operator's real install tree.

use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

fn anvil_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("anvil").unwrap();
    cmd.env("ANVIL_HOME", home);
    cmd
}

#[test]
fn list_on_a_fresh_home_reports_nothing_installed() {
    let home = tempfile::tempdir().unwrap();
    anvil_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing installed"));
}

#[test]
fn which_for_an_unknown_binary_reports_not_installed() {
    let home = tempfile::tempdir().unwrap();
    anvil_cmd(home.path())
        .args(["which", "nonexistent-tool"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is not installed"));
}

#[test]
fn remove_of_an_unknown_tool_fails_with_install_failed_exit_code() {
    let home = tempfile::tempdir().unwrap();
    anvil_cmd(home.path())
        .args(["remove", "nonexistent-tool"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn install_of_an_unknown_recipe_fails_with_recipe_not_found_exit_code() {
    let home = tempfile::tempdir().unwrap();
    anvil_cmd(home.path())
        .args(["install", "nonexistent-tool"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn cache_stats_on_a_fresh_home_reports_zero_artifacts() {
    let home = tempfile::tempdir().unwrap();
    anvil_cmd(home.path())
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 artifacts"));
}

#[test]
fn cleanup_orphans_on_a_fresh_home_reports_no_orphans() {
    let home = tempfile::tempdir().unwrap();
    anvil_cmd(home.path())
        .args(["cleanup", "orphans"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no orphans"));
}
