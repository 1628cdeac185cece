// crates/api-probe-runners/src/native.rs
// ============================================================================
// Module: Native Runner
// Description: Collection runner that sends the collection's requests itself.
// Purpose: Run collections without a newman installation.
// Dependencies: api-probe-core, reqwest, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`NativeRunner`] resolves `{{variables}}` from the environment document,
//! sends every request in collection order, and applies one implicit
//! assertion per response: the status code is below 400. Transport failures
//! count as failed requests. Pre-request and test scripts are not executed;
//! their presence is logged at debug level. The summary follows newman's JSON
//! report shape so the same verdict logic applies to both runners.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use api_probe_core::CollectionRunError;
use api_probe_core::CollectionRunner;
use api_probe_core::EnvironmentDocument;
use api_probe_core::LogLevel;
use api_probe_core::Logger;
use api_probe_core::RunObserver;
use api_probe_core::RunRequest;
use api_probe_core::RunSummary;
use api_probe_core::now_rfc3339;
use reqwest::Client;
use reqwest::Method;
use reqwest::Response;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Handle;

use crate::postman::PostmanItem;
use crate::postman::flatten_items;
use crate::postman::substitute_variables;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default user agent.
const DEFAULT_USER_AGENT: &str = concat!("api-probe/", env!("CARGO_PKG_VERSION"));
/// Status codes at or above this value fail the implicit assertion.
const FAILING_STATUS: u16 = 400;
/// Name of the implicit assertion.
const STATUS_ASSERTION: &str = "status code is below 400";
/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 10;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the native runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRunnerConfig {
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for NativeRunnerConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs collections over HTTP without newman.
pub struct NativeRunner {
    /// HTTP client shared by all runs.
    client: Client,
    /// Run logger.
    logger: Logger,
}

impl NativeRunner {
    /// Creates a native runner.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionRunError::Spawn`] when the HTTP client cannot be created.
    pub fn new(config: &NativeRunnerConfig, logger: Logger) -> Result<Self, CollectionRunError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|_| CollectionRunError::Spawn("http client build failed".to_string()))?;
        Ok(Self {
            client,
            logger,
        })
    }
}

impl CollectionRunner for NativeRunner {
    fn start(
        &self,
        request: RunRequest,
        observer: Arc<dyn RunObserver>,
    ) -> Result<(), CollectionRunError> {
        let runtime = Handle::try_current()
            .map_err(|_| CollectionRunError::Spawn("no async runtime available".to_string()))?;
        let items = flatten_items(&request.collection.document)
            .map_err(|err| CollectionRunError::Load(err.to_string()))?;
        let run = NativeRun {
            client: self.client.clone(),
            logger: self.logger.clone(),
            collection: request.collection.name.clone(),
            variables: variables(&request.environment),
        };
        runtime.spawn(async move {
            observer.on_start();
            let summary = run.execute(&items).await;
            observer.on_done(None, summary);
        });
        Ok(())
    }
}

/// Enabled environment variables by name; later duplicates win.
fn variables(environment: &EnvironmentDocument) -> BTreeMap<String, String> {
    environment
        .values
        .iter()
        .filter(|variable| variable.enabled)
        .map(|variable| (variable.key.clone(), variable.value.clone()))
        .collect()
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Result of sending one request.
enum Exchange {
    /// A response arrived.
    Response {
        /// HTTP status code.
        code: u16,
        /// Round-trip time in milliseconds.
        elapsed_ms: u64,
    },
    /// The request could not be completed.
    Failed(String),
}

/// Reads and discards a response body.
async fn drain(response: &mut Response) -> Result<(), reqwest::Error> {
    while response.chunk().await?.is_some() {}
    Ok(())
}

/// State for one native run.
struct NativeRun {
    /// HTTP client.
    client: Client,
    /// Run logger.
    logger: Logger,
    /// Collection name, for the report.
    collection: String,
    /// Substitution variables.
    variables: BTreeMap<String, String>,
}

impl NativeRun {
    /// Sends every item and returns a newman-shaped summary.
    async fn execute(&self, items: &[PostmanItem]) -> RunSummary {
        let started = now_rfc3339();
        let mut requests_failed = 0_u64;
        let mut assertions_total = 0_u64;
        let mut assertions_failed = 0_u64;
        let mut items_failed = 0_u64;
        let mut executions = Vec::with_capacity(items.len());
        let mut failures = Vec::new();

        for item in items {
            if !item.scripts.is_empty() {
                self.logger.log(
                    LogLevel::Debug,
                    "scripts not executed",
                    Some(json!({ "item": item.name, "scripts": item.scripts })),
                );
            }
            if let Some(mode) = &item.unsupported_body {
                self.logger.log(
                    LogLevel::Debug,
                    "request body not sent",
                    Some(json!({ "item": item.name, "mode": mode })),
                );
            }
            if let Some(kind) = &item.unsupported_auth {
                self.logger.log(
                    LogLevel::Debug,
                    "auth not applied",
                    Some(json!({ "item": item.name, "type": kind })),
                );
            }
            match self.send(item).await {
                Exchange::Response {
                    code,
                    elapsed_ms,
                } => {
                    assertions_total += 1;
                    let passed = code < FAILING_STATUS;
                    let mut assertion = json!({ "assertion": STATUS_ASSERTION, "skipped": false });
                    if !passed {
                        assertions_failed += 1;
                        items_failed += 1;
                        let message = format!("expected status below {FAILING_STATUS} but got {code}");
                        assertion["error"] = json!({ "name": "AssertionError", "message": message });
                        failures.push(failure(&item.name, "AssertionError", &message));
                    }
                    executions.push(json!({
                        "item": { "name": item.name },
                        "request": { "method": item.method, "url": item.url },
                        "response": { "code": code, "responseTime": elapsed_ms },
                        "assertions": [assertion],
                    }));
                }
                Exchange::Failed(message) => {
                    requests_failed += 1;
                    items_failed += 1;
                    failures.push(failure(&item.name, "RequestError", &message));
                    executions.push(json!({
                        "item": { "name": item.name },
                        "request": { "method": item.method, "url": item.url },
                        "requestError": { "message": message },
                    }));
                }
            }
        }

        let total = items.len();
        RunSummary::from_value(json!({
            "collection": { "info": { "name": self.collection } },
            "run": {
                "stats": {
                    "iterations": { "total": 1, "pending": 0, "failed": 0 },
                    "items": { "total": total, "pending": 0, "failed": items_failed },
                    "requests": { "total": total, "pending": 0, "failed": requests_failed },
                    "assertions": { "total": assertions_total, "pending": 0, "failed": assertions_failed },
                },
                "executions": executions,
                "failures": failures,
                "error": Value::Null,
                "timings": { "started": started, "completed": now_rfc3339() },
            },
        }))
    }

    /// Sends one request.
    async fn send(&self, item: &PostmanItem) -> Exchange {
        let Ok(method) = Method::from_bytes(item.method.as_bytes()) else {
            return Exchange::Failed(format!("invalid http method {}", item.method));
        };
        let url = substitute_variables(&item.url, &self.variables);
        let mut builder = self.client.request(method, url);
        for (key, value) in &item.headers {
            builder = builder.header(
                substitute_variables(key, &self.variables),
                substitute_variables(value, &self.variables),
            );
        }
        if let Some(body) = &item.body {
            builder = builder.body(substitute_variables(body, &self.variables));
        }
        let started = Instant::now();
        let exchange = match builder.send().await {
            Ok(mut response) => {
                let code = response.status().as_u16();
                // Bodies are discarded chunk by chunk; a broken body fails the request.
                match drain(&mut response).await {
                    Ok(()) => Exchange::Response {
                        code,
                        elapsed_ms: u64::try_from(started.elapsed().as_millis())
                            .unwrap_or(u64::MAX),
                    },
                    Err(err) => Exchange::Failed(format!("response body: {err}")),
                }
            }
            Err(err) => Exchange::Failed(err.to_string()),
        };
        let outcome = match &exchange {
            Exchange::Response {
                code,
                ..
            } => json!(code),
            Exchange::Failed(message) => json!(message),
        };
        self.logger.log(
            LogLevel::Http,
            &format!("{} {}", item.method, item.url),
            Some(json!({ "item": item.name, "outcome": outcome })),
        );
        exchange
    }
}

/// Builds a newman-shaped failure entry.
fn failure(source: &str, name: &str, message: &str) -> Value {
    json!({
        "source": { "name": source },
        "error": { "name": name, "message": message },
    })
}
