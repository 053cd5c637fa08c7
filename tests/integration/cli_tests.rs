//! Top-level CLI surface: help, version, argument errors.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn autoiso() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("autoiso"));
    cmd.env("NO_COLOR", "1").env_remove("AUTOISO_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    autoiso()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_arguments_prints_help_and_exits_2() {
    autoiso()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_version_flag() {
    autoiso()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!("autoiso ", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_version_command() {
    autoiso()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("autoiso {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_json() {
    let output = autoiso()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_subcommand_fails() {
    autoiso()
        .arg("burn")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_build_requires_source() {
    autoiso()
        .arg("build")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--source"));
}

#[test]
fn test_no_color_env_accepts_conventional_values() {
    for value in ["1", "yes", "anything"] {
        Command::new(assert_cmd::cargo::cargo_bin!("autoiso"))
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(format!("autoiso {}\n", env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_no_color_env_falsey_values_keep_colour_setting() {
    for value in ["0", "false", ""] {
        Command::new(assert_cmd::cargo::cargo_bin!("autoiso"))
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success();
    }
}
