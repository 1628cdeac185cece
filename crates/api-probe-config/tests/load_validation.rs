//! Config load validation tests for api-probe-config.
// crates/api-probe-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use api_probe_config::ConfigError;
use api_probe_config::ProbeConfig;
use api_probe_config::config_toml_example;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<ProbeConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(ProbeConfig::load(Some(path), None), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(ProbeConfig::load(Some(path), None), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let path = Path::new("/nonexistent/api-probe.toml");
    assert_invalid(ProbeConfig::load(Some(path), None), "config io error")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(ProbeConfig::load(Some(file.path()), None), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(ProbeConfig::load(Some(file.path()), None), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_invalid_toml() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"base_url = ").map_err(|err| err.to_string())?;
    assert_invalid(ProbeConfig::load(Some(file.path()), None), "config parse error")?;
    Ok(())
}

#[test]
fn load_accepts_example_config() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(config_toml_example().as_bytes()).map_err(|err| err.to_string())?;
    let config =
        ProbeConfig::load(Some(file.path()), Some("staging")).map_err(|err| err.to_string())?;
    if config.collection.path != "postman/app-staging.postman_collection.json" {
        return Err(format!("profile collection path not applied: {}", config.collection.path));
    }
    if config.profile.as_deref() != Some("staging") {
        return Err("profile name not recorded".to_string());
    }
    Ok(())
}
