// crates/api-probe-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: In-memory identity providers, scripted runners, and builders.
// Purpose: Exercise the run pipeline without network access or child processes.
// Dependencies: api-probe-core, base64, tempfile
// ============================================================================

//! ## Overview
//! Fakes for the two external collaborators plus helpers that assemble a
//! full pipeline around them.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use api_probe_core::AuthOutcome;
use api_probe_core::AuthTokens;
use api_probe_core::AuthenticationError;
use api_probe_core::CollectionRunError;
use api_probe_core::CollectionRunner;
use api_probe_core::CredentialProvider;
use api_probe_core::EnvironmentBuilder;
use api_probe_core::EnvironmentDocument;
use api_probe_core::EnvironmentSettings;
use api_probe_core::IdentityProvider;
use api_probe_core::LogLevel;
use api_probe_core::Logger;
use api_probe_core::OrchestratorConfig;
use api_probe_core::ReporterOptions;
use api_probe_core::RunObserver;
use api_probe_core::RunOrchestrator;
use api_probe_core::RunRequest;
use api_probe_core::RunSummary;
use api_probe_core::UserPoolCredentials;
use api_probe_core::logging::MemoryLogSink;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use serde_json::json;
use tempfile::NamedTempFile;

// ============================================================================
// SECTION: Tokens
// ============================================================================

/// Builds an unsigned compact JWT with the given payload.
pub fn jwt(payload: &Value) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","kid":"test"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes())
    )
}

/// Returns a complete token set for `sub`.
pub fn tokens(sub: &str) -> AuthTokens {
    AuthTokens {
        access_token: jwt(&json!({ "sub": sub, "token_use": "access" })),
        id_token: jwt(&json!({ "sub": sub, "token_use": "id", "email": "probe@example.com" })),
        refresh_token: "refresh-token".to_string(),
    }
}

/// Returns sample user-pool credentials.
pub fn credentials(new_password: Option<&str>) -> UserPoolCredentials {
    UserPoolCredentials {
        user_pool_id: "us-west-2_Example".to_string(),
        client_id: "client-id".to_string(),
        username: "probe@example.com".to_string(),
        password: "hunter2".to_string(),
        new_password: new_password.map(str::to_string),
    }
}

// ============================================================================
// SECTION: Identity Provider Fake
// ============================================================================

/// Identity provider that replays scripted outcomes.
pub struct FakeIdentity {
    /// Outcome of `initiate_auth`.
    initiate: Result<AuthOutcome, AuthenticationError>,
    /// Outcome of `respond_new_password`.
    respond: Result<AuthOutcome, AuthenticationError>,
    /// Number of `initiate_auth` calls.
    pub initiate_calls: AtomicUsize,
    /// Passwords submitted to `respond_new_password`.
    pub responses: Mutex<Vec<String>>,
}

impl FakeIdentity {
    /// Always signs in successfully.
    pub fn succeeding() -> Self {
        Self::scripted(Ok(AuthOutcome::Authenticated(tokens("user-1"))), Err(unexpected()))
    }

    /// Always rejects the password.
    pub fn rejecting() -> Self {
        Self::scripted(
            Err(AuthenticationError::Rejected {
                kind: "NotAuthorizedException".to_string(),
                message: "Incorrect username or password.".to_string(),
            }),
            Err(unexpected()),
        )
    }

    /// Demands a new password, then accepts the challenge answer.
    pub fn demanding_new_password() -> Self {
        Self::scripted(
            Ok(AuthOutcome::NewPasswordRequired {
                session: "session-1".to_string(),
            }),
            Ok(AuthOutcome::Authenticated(tokens("user-2"))),
        )
    }

    /// Builds a fake from explicit outcomes.
    pub fn scripted(
        initiate: Result<AuthOutcome, AuthenticationError>,
        respond: Result<AuthOutcome, AuthenticationError>,
    ) -> Self {
        Self {
            initiate,
            respond,
            initiate_calls: AtomicUsize::new(0),
            responses: Mutex::new(Vec::new()),
        }
    }
}

/// Error returned by fake paths that a test does not expect to reach.
fn unexpected() -> AuthenticationError {
    AuthenticationError::Protocol("unexpected call".to_string())
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn initiate_auth(
        &self,
        _credentials: &UserPoolCredentials,
    ) -> Result<AuthOutcome, AuthenticationError> {
        self.initiate_calls.fetch_add(1, Ordering::SeqCst);
        self.initiate.clone()
    }

    async fn respond_new_password(
        &self,
        _credentials: &UserPoolCredentials,
        _session: &str,
        new_password: &str,
    ) -> Result<AuthOutcome, AuthenticationError> {
        self.responses.lock().unwrap().push(new_password.to_string());
        self.respond.clone()
    }
}

// ============================================================================
// SECTION: Runner Fake
// ============================================================================

/// Behaviour of a [`ScriptedRunner`].
#[derive(Clone)]
pub enum Script {
    /// Emit start then done with the given error and summary.
    Complete(Option<CollectionRunError>, Value),
    /// Emit done twice, the first with the given summary.
    CompleteTwice(Value),
    /// Emit start, then drop the observer.
    Abandon,
    /// Emit start and never finish.
    Hang,
    /// Refuse to start.
    RefuseToStart,
}

/// Runner that follows a script on a spawned task.
pub struct ScriptedRunner {
    /// Script to follow.
    script: Script,
    /// Requests received.
    pub requests: Mutex<Vec<RunRequest>>,
}

impl ScriptedRunner {
    /// Creates a runner for `script`.
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns the environments passed to `start`.
    pub fn environments(&self) -> Vec<EnvironmentDocument> {
        self.requests.lock().unwrap().iter().map(|request| request.environment.clone()).collect()
    }
}

impl CollectionRunner for ScriptedRunner {
    fn start(
        &self,
        request: RunRequest,
        observer: Arc<dyn RunObserver>,
    ) -> Result<(), CollectionRunError> {
        if matches!(self.script, Script::RefuseToStart) {
            return Err(CollectionRunError::Spawn("newman not found".to_string()));
        }
        self.requests.lock().unwrap().push(request);
        let script = self.script.clone();
        tokio::spawn(async move {
            observer.on_start();
            match script {
                Script::Complete(error, report) => {
                    observer.on_done(error, RunSummary::from_value(report));
                }
                Script::CompleteTwice(report) => {
                    observer.on_done(None, RunSummary::from_value(report));
                    observer.on_done(
                        Some(CollectionRunError::Runner("late".to_string())),
                        RunSummary::empty(),
                    );
                }
                Script::Abandon => drop(observer),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3_600)).await;
                    drop(observer);
                }
                Script::RefuseToStart => {}
            }
        });
        Ok(())
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Newman-shaped report with the given counters and failures.
pub fn report(requests: u64, assertions: u64, failed_assertions: u64) -> Value {
    let failures: Vec<Value> = (0..failed_assertions)
        .map(|index| {
            json!({
                "source": { "name": format!("request {index}") },
                "error": { "name": "AssertionError", "message": "expected 200 but got 404" }
            })
        })
        .collect();
    json!({
        "run": {
            "stats": {
                "requests": { "total": requests, "failed": 0 },
                "assertions": { "total": assertions, "failed": failed_assertions }
            },
            "failures": failures,
            "error": null
        }
    })
}

// ============================================================================
// SECTION: Pipeline Assembly
// ============================================================================

/// Writes a minimal collection file.
pub fn collection_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let body = json!({
        "info": { "name": "app-dev", "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json" },
        "item": [
            { "name": "ping", "request": { "method": "GET", "url": "{{BaseURL}}/ping" } }
        ]
    });
    file.write_all(body.to_string().as_bytes()).unwrap();
    file
}

/// Returns a logger capturing every level, and its sink.
pub fn memory_logger() -> (Logger, Arc<MemoryLogSink>) {
    let sink = Arc::new(MemoryLogSink::new());
    (Logger::new(LogLevel::Silly, "newman", sink.clone()), sink)
}

/// Builds an environment builder over `identity`.
pub fn environment_builder(
    identity: Arc<FakeIdentity>,
    new_password: Option<&str>,
    logger: &Logger,
) -> EnvironmentBuilder {
    let provider = CredentialProvider::new(identity, credentials(new_password), logger.clone());
    EnvironmentBuilder::new(
        "https://api.example.com/dev".to_string(),
        EnvironmentSettings::default(),
        provider,
        logger.clone(),
    )
}

/// Builds an orchestrator over the given fakes.
pub fn orchestrator(
    identity: Arc<FakeIdentity>,
    runner: Arc<ScriptedRunner>,
    collection_path: PathBuf,
    timeout: Option<Duration>,
    logger: &Logger,
) -> RunOrchestrator {
    RunOrchestrator::new(
        environment_builder(identity, None, logger),
        runner,
        OrchestratorConfig {
            collection_path,
            reporter: ReporterOptions::default(),
            timeout,
        },
        logger.clone(),
    )
}
