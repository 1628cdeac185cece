// crates/api-probe-core/src/core/environment.rs
// ============================================================================
// Module: Environment Document
// Description: Postman-compatible environment export consumed by collection runners.
// Purpose: Carry the base URL and bearer token into a collection run.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! An [`EnvironmentDocument`] serializes to the same JSON shape Postman uses
//! when exporting an environment, so the file can be handed to `newman` as-is
//! or imported into the Postman app for debugging.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::core::credentials::REDACTED;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Variable holding the API base URL.
pub const BASE_URL_KEY: &str = "BaseURL";
/// Variable holding the bearer access token.
pub const BEARER_TOKEN_KEY: &str = "COGNITO_JWT";
/// Default environment name.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "newman_env";
/// Default Postman variable scope.
pub const DEFAULT_VARIABLE_SCOPE: &str = "environment";
/// Default exporter tag written into `_postman_exported_using`.
pub const DEFAULT_EXPORTER_VERSION: &str = "Postman/7.26.0";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Static, non-secret settings stamped onto every environment document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSettings {
    /// Environment name.
    pub name: String,
    /// Postman variable scope.
    pub scope: String,
    /// Exporter tag.
    pub exporter_version: String,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENVIRONMENT_NAME.to_string(),
            scope: DEFAULT_VARIABLE_SCOPE.to_string(),
            exporter_version: DEFAULT_EXPORTER_VERSION.to_string(),
        }
    }
}

/// A single environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
    /// Whether the runner should resolve this variable.
    pub enabled: bool,
}

impl EnvironmentVariable {
    /// Creates an enabled variable.
    #[must_use]
    pub fn enabled(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            enabled: true,
        }
    }
}

/// Postman environment export.
///
/// # Invariants
/// - `id` is unique per build and never reused across runs.
/// - `values` preserves insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDocument {
    /// Unique document identifier.
    pub id: Uuid,
    /// Environment name.
    pub name: String,
    /// Ordered variables.
    pub values: Vec<EnvironmentVariable>,
    /// Postman variable scope.
    #[serde(rename = "_postman_variable_scope")]
    pub scope: String,
    /// RFC 3339 export timestamp.
    #[serde(rename = "_postman_exported_at")]
    pub exported_at: String,
    /// Exporter tag.
    #[serde(rename = "_postman_exported_using")]
    pub exporter_version: String,
}

impl EnvironmentDocument {
    /// Returns the value of the first enabled variable named `key`.
    #[must_use]
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|variable| variable.enabled && variable.key == key)
            .map(|variable| variable.value.as_str())
    }

    /// Returns a copy safe for logging, with the bearer token replaced.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for variable in &mut copy.values {
            if variable.key == BEARER_TOKEN_KEY {
                variable.value = REDACTED.to_string();
            }
        }
        copy
    }
}
