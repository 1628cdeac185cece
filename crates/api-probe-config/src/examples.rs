// crates/api-probe-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the `config example` command.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for api-probe configuration. The output parses and
//! validates as-is.

/// Returns a canonical example `api-probe.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"# Base URL of the API under test; exported to the collection as {{BaseURL}}.
base_url = "https://api.example.com/dev"

[log]
level = "info"          # error|warn|info|http|verbose|debug|silly
format = "text"         # text|json
service = "newman"
# file = "api-probe.log"

[cognito]
user_pool_id = "us-west-2_AbCdEf123"
client_id = "1example23456789"
username = "probe@example.com"
# Prefer API_PROBE_COGNITO_PASSWORD over storing the password here.
password = "change-me"
# region = "us-west-2"
# endpoint = "https://cognito-idp.us-west-2.amazonaws.com/"
# new_password = "answer-to-reset-challenge"
timeout_ms = 10000

[collection]
path = "postman/app-dev.postman_collection.json"
runner = "newman"       # newman|native
# timeout_ms = 300000

[collection.newman]
command = "newman"
args = []

[collection.native]
request_timeout_ms = 10000

[environment]
name = "newman_env"
scope = "environment"
exporter_version = "Postman/7.26.0"

[profiles.staging]
base_url = "https://api.example.com/staging"

[profiles.staging.collection]
path = "postman/app-staging.postman_collection.json"
"#,
    )
}
