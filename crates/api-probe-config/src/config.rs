// crates/api-probe-config/src/config.rs
// ============================================================================
// Module: api-probe Configuration
// Description: Configuration loading and validation for api-probe.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: api-probe-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! A named profile may be deep-merged over the root tables before the model
//! is deserialized, and a small set of secrets may be supplied through the
//! process environment. Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use api_probe_core::EnvironmentSettings;
use api_probe_core::LogFormat;
use api_probe_core::LogLevel;
use api_probe_core::OrchestratorConfig;
use api_probe_core::REDACTED;
use api_probe_core::ReporterOptions;
use api_probe_core::UserPoolCredentials;
use serde::Deserialize;
use thiserror::Error;
use toml::Table;
use toml::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "api-probe.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "API_PROBE_CONFIG";
/// Environment variable used to select a profile.
pub const PROFILE_ENV_VAR: &str = "API_PROBE_PROFILE";
/// Environment variable overriding `cognito.username`.
pub const USERNAME_ENV_VAR: &str = "API_PROBE_COGNITO_USERNAME";
/// Environment variable overriding `cognito.password`.
pub const PASSWORD_ENV_VAR: &str = "API_PROBE_COGNITO_PASSWORD";
/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV_VAR: &str = "API_PROBE_BASE_URL";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Top-level key holding named profiles.
const PROFILES_KEY: &str = "profiles";
/// Default service label on log records.
const DEFAULT_LOG_SERVICE: &str = "newman";
/// Default identity request timeout in milliseconds.
const DEFAULT_COGNITO_TIMEOUT_MS: u64 = 10_000;
/// Default per-request timeout for the native runner in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Default newman executable.
const DEFAULT_NEWMAN_COMMAND: &str = "newman";

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// api-probe configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Base URL of the API under test.
    pub base_url: String,
    /// Log output settings.
    #[serde(default)]
    pub log: LogConfig,
    /// User pool sign-in settings.
    pub cognito: CognitoConfig,
    /// Collection and runner settings.
    pub collection: CollectionConfig,
    /// Environment document settings.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Profile merged into this config, if any (not deserialized).
    #[serde(skip)]
    pub profile: Option<String>,
}

impl ProbeConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The profile defaults to `API_PROBE_PROFILE` when `profile` is `None`.
    /// Environment overrides are applied before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>, profile: Option<&str>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let profile = profile
            .map(str::to_string)
            .or_else(|| env::var(PROFILE_ENV_VAR).ok().filter(|name| !name.trim().is_empty()));
        let mut config = Self::parse(content, profile.as_deref())?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML text, merging `profile` over the root tables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is not TOML, the profile is
    /// unknown, or the merged document does not match the model.
    pub fn parse(content: &str, profile: Option<&str>) -> Result<Self, ConfigError> {
        let mut root: Table =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let profiles = root.remove(PROFILES_KEY);
        if let Some(name) = profile {
            let overlay = select_profile(profiles, name)?;
            merge_tables(&mut root, overlay);
        }
        let mut config = Value::Table(root)
            .try_into::<Self>()
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.profile = profile.map(str::to_string);
        Ok(config)
    }

    /// Applies environment overrides; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = lookup(BASE_URL_ENV_VAR) {
            self.base_url = value;
        }
        if let Some(value) = lookup(USERNAME_ENV_VAR) {
            self.cognito.username = value;
        }
        if let Some(value) = lookup(PASSWORD_ENV_VAR) {
            self.cognito.password = value;
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("base_url", &self.base_url)?;
        require_http_url("base_url", &self.base_url)?;
        self.log.validate()?;
        self.cognito.validate()?;
        self.collection.validate()?;
        self.environment.validate()
    }

    /// Returns the orchestrator settings for this config.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            collection_path: PathBuf::from(self.collection.path.trim()),
            reporter: ReporterOptions::default(),
            timeout: self.collection.timeout_ms.map(Duration::from_millis),
        }
    }
}

// ============================================================================
// SECTION: Log Config
// ============================================================================

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Most verbose level emitted.
    pub level: LogLevel,
    /// Line format.
    pub format: LogFormat,
    /// Service label on every record.
    pub service: String,
    /// Optional file receiving a copy of every line.
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            service: DEFAULT_LOG_SERVICE.to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    /// Validates log settings.
    fn validate(&self) -> Result<(), ConfigError> {
        require("log.service", &self.service)?;
        if let Some(file) = &self.file {
            validate_path_string("log.file", file)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Cognito Config
// ============================================================================

/// User pool sign-in settings.
#[derive(Clone, Deserialize)]
pub struct CognitoConfig {
    /// User pool identifier (`<region>_<id>`).
    pub user_pool_id: String,
    /// App client identifier.
    pub client_id: String,
    /// Username to sign in with.
    pub username: String,
    /// Password for `username`.
    pub password: String,
    /// Region override; derived from `user_pool_id` when absent.
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Replacement password used to answer a reset challenge.
    #[serde(default)]
    pub new_password: Option<String>,
    /// Identity request timeout in milliseconds.
    #[serde(default = "default_cognito_timeout_ms")]
    pub timeout_ms: u64,
}

impl fmt::Debug for CognitoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CognitoConfig")
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("new_password", &self.new_password.as_ref().map(|_| REDACTED))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl CognitoConfig {
    /// Returns the sign-in inputs for the credential provider.
    #[must_use]
    pub fn credentials(&self) -> UserPoolCredentials {
        UserPoolCredentials {
            user_pool_id: self.user_pool_id.trim().to_string(),
            client_id: self.client_id.trim().to_string(),
            username: self.username.clone(),
            password: self.password.clone(),
            new_password: self.new_password.clone().filter(|value| !value.is_empty()),
        }
    }

    /// Returns the configured region, or the prefix of `user_pool_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no region can be determined.
    pub fn resolved_region(&self) -> Result<String, ConfigError> {
        if let Some(region) = self.region.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            return Ok(region.to_string());
        }
        match self.user_pool_id.trim().split_once('_') {
            Some((region, id)) if !region.is_empty() && !id.is_empty() => Ok(region.to_string()),
            _ => Err(ConfigError::Invalid(
                "cognito.region must be set when user_pool_id has no region prefix".to_string(),
            )),
        }
    }

    /// Returns the identity request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates sign-in settings.
    fn validate(&self) -> Result<(), ConfigError> {
        require("cognito.user_pool_id", &self.user_pool_id)?;
        require("cognito.client_id", &self.client_id)?;
        require("cognito.username", &self.username)?;
        require("cognito.password", &self.password)?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "cognito.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            require_http_url("cognito.endpoint", endpoint)?;
        }
        self.resolved_region().map(|_| ())
    }
}

// ============================================================================
// SECTION: Collection Config
// ============================================================================

/// Collection runner selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    /// The newman command-line runner.
    #[default]
    Newman,
    /// The built-in HTTP runner.
    Native,
}

/// Collection and runner settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    /// Path to the Postman collection file.
    pub path: String,
    /// Runner used to execute the collection.
    #[serde(default)]
    pub runner: RunnerKind,
    /// Upper bound on the whole run in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// newman runner settings.
    #[serde(default)]
    pub newman: NewmanConfig,
    /// Native runner settings.
    #[serde(default)]
    pub native: NativeConfig,
}

impl CollectionConfig {
    /// Validates collection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("collection.path", &self.path)?;
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "collection.timeout_ms must be greater than zero".to_string(),
            ));
        }
        require("collection.newman.command", &self.newman.command)?;
        if self.native.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "collection.native.request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// newman runner settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewmanConfig {
    /// Executable to invoke.
    pub command: String,
    /// Extra arguments appended after the generated ones.
    pub args: Vec<String>,
}

impl Default for NewmanConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_NEWMAN_COMMAND.to_string(),
            args: Vec::new(),
        }
    }
}

/// Native runner settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl NativeConfig {
    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ============================================================================
// SECTION: Environment Config
// ============================================================================

/// Environment document settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Environment name.
    pub name: String,
    /// Postman variable scope.
    pub scope: String,
    /// Exporter tag.
    pub exporter_version: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        let settings = EnvironmentSettings::default();
        Self {
            name: settings.name,
            scope: settings.scope,
            exporter_version: settings.exporter_version,
        }
    }
}

impl EnvironmentConfig {
    /// Returns the document settings for the environment builder.
    #[must_use]
    pub fn settings(&self) -> EnvironmentSettings {
        EnvironmentSettings {
            name: self.name.clone(),
            scope: self.scope.clone(),
            exporter_version: self.exporter_version.clone(),
        }
    }

    /// Validates document settings.
    fn validate(&self) -> Result<(), ConfigError> {
        require("environment.name", &self.name)?;
        require("environment.scope", &self.scope)?;
        require("environment.exporter_version", &self.exporter_version)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default identity request timeout.
const fn default_cognito_timeout_ms() -> u64 {
    DEFAULT_COGNITO_TIMEOUT_MS
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Requires a non-blank string.
fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

/// Requires an `http` or `https` URL.
fn require_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let lowered = value.trim().to_ascii_lowercase();
    let rest = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .ok_or_else(|| ConfigError::Invalid(format!("{field} must be an http(s) url")))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    Ok(())
}

/// Extracts the named profile table.
fn select_profile(profiles: Option<Value>, name: &str) -> Result<Table, ConfigError> {
    let profiles = match profiles {
        None => Table::new(),
        Some(Value::Table(table)) => table,
        Some(_) => return Err(ConfigError::Invalid("profiles must be a table".to_string())),
    };
    match profiles.get(name) {
        Some(Value::Table(table)) => Ok(table.clone()),
        Some(_) => Err(ConfigError::Invalid(format!("profile {name} must be a table"))),
        None => Err(ConfigError::Invalid(format!("unknown profile: {name}"))),
    }
}

/// Deep-merges `overlay` into `base`; nested tables merge, other values replace.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
