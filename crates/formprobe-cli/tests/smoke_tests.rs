//! Smoke tests for the formprobe binary
//!
//! None of these reach a real page.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn formprobe() -> Command {
    let mut cmd = Command::cargo_bin("formprobe").expect("formprobe binary should exist");
    cmd.env_remove("FORMPROBE_URL")
        .env_remove("FORMPROBE_HEADLESS")
        .env_remove("CHROMIUM_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_flag() {
    formprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    formprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("formprobe"))
        .stdout(predicate::str::contains("--headless"))
        .stdout(predicate::str::contains("--no-pause"))
        .stdout(predicate::str::contains("--chromium-path"));
}

#[test]
fn test_invalid_color_rejected() {
    formprobe()
        .args(["--color", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

#[test]
fn test_unknown_flag_rejected() {
    formprobe().arg("--frobnicate").assert().failure();
}

#[test]
fn test_missing_browser_is_fatal() {
    formprobe()
        .args([
            "--chromium-path",
            "/nonexistent/formprobe/chromium",
            "--headless",
            "--no-pause",
            "--color",
            "never",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to launch browser"));
}
