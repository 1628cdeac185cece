// crates/api-probe-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and entry point helpers.
// Purpose: Pin the command surface and fail-closed input handling.
// Dependencies: api-probe-cli main helpers
// ============================================================================

//! ## Overview
//! Covers self-test selection, trigger event reading, and the argument
//! shapes accepted with and without a subcommand.

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

use clap::Parser;
use serde_json::json;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::MAX_EVENT_BYTES;
use super::SelfTest;
use super::read_event;
use super::resolve_self_test;

// ============================================================================
// SECTION: Self-Test Selection
// ============================================================================

#[test]
fn self_test_selector_accepts_known_names() {
    assert_eq!(resolve_self_test(None).unwrap(), None);
    assert_eq!(resolve_self_test(Some("  ")).unwrap(), None);
    assert_eq!(resolve_self_test(Some("auth")).unwrap(), Some(SelfTest::Auth));
    assert_eq!(resolve_self_test(Some("ENV")).unwrap(), Some(SelfTest::Env));
}

#[test]
fn self_test_selector_rejects_unknown_names() {
    let err = resolve_self_test(Some("deploy")).unwrap_err();
    assert!(err.to_string().contains("API_PROBE_SELF_TEST"));
    assert!(err.to_string().contains("deploy"));
}

// ============================================================================
// SECTION: Trigger Events
// ============================================================================

#[test]
fn event_file_is_parsed_as_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("event.json");
    fs::write(&path, r#"{"source":"aws.events"}"#).unwrap();
    assert_eq!(read_event(&path).unwrap(), json!({ "source": "aws.events" }));
}

#[test]
fn event_file_must_be_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("event.json");
    fs::write(&path, "not json").unwrap();
    assert!(read_event(&path).unwrap_err().to_string().contains("is not json"));
}

#[test]
fn oversized_event_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("event.json");
    let size = usize::try_from(MAX_EVENT_BYTES).unwrap() + 1;
    fs::write(&path, vec![b' '; size]).unwrap();
    assert!(read_event(&path).unwrap_err().to_string().contains("exceeds size limit"));
}

#[test]
fn missing_event_file_is_an_error() {
    let err = read_event(&PathBuf::from("/nonexistent/event.json")).unwrap_err();
    assert!(err.to_string().starts_with("event /nonexistent/event.json"));
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn bare_invocation_accepts_run_flags() {
    let cli = Cli::try_parse_from(["api-probe", "--config", "probe.toml", "--strict-exit"]).unwrap();
    assert!(cli.command.is_none());
    assert!(cli.run.strict_exit);
    assert_eq!(cli.run.target.config, Some(PathBuf::from("probe.toml")));
}

#[test]
fn run_subcommand_accepts_profile_and_event() {
    let cli = Cli::try_parse_from([
        "api-probe",
        "run",
        "--profile",
        "staging",
        "--event",
        "event.json",
    ])
    .unwrap();
    let Some(Commands::Run(command)) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(command.target.profile.as_deref(), Some("staging"));
    assert_eq!(command.event, Some(PathBuf::from("event.json")));
    assert!(!command.strict_exit);
}

#[test]
fn run_flags_conflict_with_other_subcommands() {
    assert!(Cli::try_parse_from(["api-probe", "--strict-exit", "auth"]).is_err());
}

#[test]
fn config_subcommands_parse() {
    let cli = Cli::try_parse_from(["api-probe", "config", "example"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommand::Example
        })
    ));
    let cli = Cli::try_parse_from(["api-probe", "config", "validate", "--config", "a.toml"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommand::Validate(_)
        })
    ));
}
