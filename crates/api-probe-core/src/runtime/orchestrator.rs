// crates/api-probe-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Run Orchestrator
// Description: Sequences environment assembly and the collection run.
// Purpose: Resolve one run into a status payload through a single completion signal.
// Dependencies: crate::{core, interfaces, logging, runtime::environment}, tokio
// ============================================================================

//! ## Overview
//! [`RunOrchestrator::run`] builds the environment, loads the collection,
//! starts the runner, and then waits on a oneshot channel. The channel is
//! owned by a [`CompletionObserver`]: its `done` handler decides pass/fail,
//! logs the outcome, and settles the channel exactly once. Whatever it
//! settles with is what `run` returns.
//!
//! Invariants:
//! - The runner is never started without an environment document.
//! - A second `done` event is logged and ignored.
//! - A runner that drops its observer without `done` yields
//!   [`CollectionRunError::Abandoned`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::core::Collection;
use crate::core::RunSummary;
use crate::core::StatusPayload;
use crate::interfaces::CollectionRunError;
use crate::interfaces::CollectionRunner;
use crate::interfaces::ReporterOptions;
use crate::interfaces::RunObserver;
use crate::interfaces::RunRequest;
use crate::logging::Logger;
use crate::runtime::environment::EnvironmentBuildError;
use crate::runtime::environment::EnvironmentBuilder;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Path to the collection file.
    pub collection_path: PathBuf,
    /// Reporter options passed to the runner.
    pub reporter: ReporterOptions,
    /// Upper bound on the collection run, if any.
    pub timeout: Option<Duration>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a run ended without a runner verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The environment document could not be built.
    #[error("environment build failed: {0}")]
    Environment(#[from] EnvironmentBuildError),
    /// The collection could not be run to completion.
    #[error(transparent)]
    Collection(#[from] CollectionRunError),
}

// ============================================================================
// SECTION: Completion Observer
// ============================================================================

/// Run observer that settles a oneshot channel on `done`.
pub struct CompletionObserver {
    /// Pending completion sender; `None` once settled.
    sender: Mutex<Option<oneshot::Sender<StatusPayload>>>,
    /// Run logger.
    logger: Logger,
}

impl CompletionObserver {
    /// Creates an observer and the receiver it will settle.
    #[must_use]
    pub fn new(logger: Logger) -> (Self, oneshot::Receiver<StatusPayload>) {
        let (sender, receiver) = oneshot::channel();
        let observer = Self {
            sender: Mutex::new(Some(sender)),
            logger,
        };
        (observer, receiver)
    }

    /// Logs the verdict and returns the payload for it.
    fn verdict(&self, error: Option<&CollectionRunError>, summary: &RunSummary) -> StatusPayload {
        let failed = error.is_some() || summary.has_error();
        if failed {
            let detail = error
                .map(ToString::to_string)
                .or_else(|| summary.error.clone())
                .unwrap_or_else(|| format!("{} failure(s) reported", summary.failures.len().max(1)));
            self.logger.error_with(
                &format!("error: {detail}"),
                json!({
                    "stats": summary.stats,
                    "failures": summary.failures,
                }),
            );
        } else {
            self.logger.info("collection run completed.");
            self.logger.info_with("summary", json!({ "summary": summary }));
        }
        StatusPayload::from_summary(failed, summary)
    }
}

impl RunObserver for CompletionObserver {
    fn on_start(&self) {
        self.logger.info("running a collection...");
    }

    fn on_done(&self, error: Option<CollectionRunError>, summary: RunSummary) {
        let sender = self.sender.lock().ok().and_then(|mut pending| pending.take());
        let Some(sender) = sender else {
            self.logger.warn("duplicate done event ignored");
            return;
        };
        let payload = self.verdict(error.as_ref(), &summary);
        let _ = sender.send(payload);
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Runs one collection against a freshly built environment.
pub struct RunOrchestrator {
    /// Environment source.
    environment: EnvironmentBuilder,
    /// Collection runner.
    runner: Arc<dyn CollectionRunner>,
    /// Orchestrator settings.
    config: OrchestratorConfig,
    /// Run logger.
    logger: Logger,
}

impl RunOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        environment: EnvironmentBuilder,
        runner: Arc<dyn CollectionRunner>,
        config: OrchestratorConfig,
        logger: Logger,
    ) -> Self {
        Self {
            environment,
            runner,
            config,
            logger,
        }
    }

    /// Executes the run and returns the runner verdict.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when the environment cannot be built or the runner
    /// cannot start, times out, or never reports completion. Failed assertions
    /// are not errors; they produce a 500 payload.
    pub async fn run(&self) -> Result<StatusPayload, RunError> {
        let environment = self.environment.build().await?;
        self.logger.info_with("environment", json!({ "environment": environment.redacted() }));

        let path = &self.config.collection_path;
        self.logger.info_with("collection", json!({ "collection": path.display().to_string() }));
        let collection = Collection::load(path)
            .map_err(|err| self.fail(CollectionRunError::Load(err.to_string())))?;

        let request = RunRequest {
            collection,
            environment,
            reporter: self.config.reporter.clone(),
        };
        let (observer, completion) = CompletionObserver::new(self.logger.clone());
        self.logger.info("start collection run");
        self.runner.start(request, Arc::new(observer)).map_err(|err| self.fail(err))?;

        let settled = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, completion)
                .await
                .map_err(|_| self.fail(CollectionRunError::Timeout(millis(limit))))?,
            None => completion.await,
        };
        settled.map_err(|_| self.fail(CollectionRunError::Abandoned))
    }

    /// Logs a collection error and wraps it.
    fn fail(&self, err: CollectionRunError) -> RunError {
        self.logger.error(&err.to_string());
        RunError::Collection(err)
    }
}

/// Converts a duration to whole milliseconds, saturating.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
