// crates/api-probe-cli/tests/config_command.rs
// ============================================================================
// Module: CLI Config Command Tests
// Description: Integration tests for config utilities and misuse exits.
// Purpose: Ensure config errors fail closed with exit code 1.
// Dependencies: api-probe-cli binary
// ============================================================================
//! ## Overview
//! Round-trips the example config through `config validate` and checks that
//! broken or missing configuration exits 1 with the error on stderr.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn api_probe(args: &[&str]) -> Command {
    let mut command = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_api-probe")));
    command
        .args(args)
        .env_remove("API_PROBE_CONFIG")
        .env_remove("API_PROBE_PROFILE")
        .env_remove("API_PROBE_SELF_TEST")
        .env_remove("API_PROBE_COGNITO_USERNAME")
        .env_remove("API_PROBE_COGNITO_PASSWORD")
        .env_remove("API_PROBE_BASE_URL");
    command
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn example_config_validates() {
    let dir = TempDir::new().unwrap();
    let example = api_probe(&["config", "example"]).output().unwrap();
    assert!(example.status.success());
    let path = dir.path().join("api-probe.toml");
    fs::write(&path, &example.stdout).unwrap();

    let output =
        api_probe(&["config", "validate", "--config", path.to_str().unwrap()]).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "config ok");
}

#[test]
fn config_path_can_come_from_environment() {
    let dir = TempDir::new().unwrap();
    let example = api_probe(&["config", "example"]).output().unwrap();
    let path = dir.path().join("probe.toml");
    fs::write(&path, &example.stdout).unwrap();

    let output = api_probe(&["config", "validate", "--profile", "staging"])
        .env("API_PROBE_CONFIG", &path)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn invalid_config_exits_one_with_message() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("api-probe.toml");
    let example = api_probe(&["config", "example"]).output().unwrap();
    let text = String::from_utf8(example.stdout).unwrap();
    fs::write(&path, text.replace("https://api.example.com/dev", "ftp://api.example.com")).unwrap();

    let output =
        api_probe(&["config", "validate", "--config", path.to_str().unwrap()]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("base_url must be an http(s) url"));
}

#[test]
fn missing_config_fails_run_before_any_network_call() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let output = api_probe(&["run", "--config", path.to_str().unwrap()]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config io error"));
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_self_test_exits_one() {
    let output = api_probe(&[]).env("API_PROBE_SELF_TEST", "deploy").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be auth or env"));
}

#[test]
fn version_flag_prints_version() {
    let output = api_probe(&["--version"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("api-probe {}", env!("CARGO_PKG_VERSION")));
}
