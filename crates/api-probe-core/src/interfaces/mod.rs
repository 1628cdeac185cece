// crates/api-probe-core/src/interfaces/mod.rs
// ============================================================================
// Module: api-probe Interfaces
// Description: Contracts for identity providers and collection runners.
// Purpose: Keep the run pipeline independent of Cognito and newman specifics.
// Dependencies: async-trait, crate::core, thiserror
// ============================================================================

//! ## Overview
//! The pipeline talks to two external collaborators. An
//! [`IdentityProvider`] exchanges user-pool credentials for tokens; a
//! [`CollectionRunner`] executes a collection and reports through a
//! [`RunObserver`]. Implementations live in `api-probe-providers` and
//! `api-probe-runners`; tests substitute in-memory fakes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Collection;
use crate::core::EnvironmentDocument;
use crate::core::REDACTED;
use crate::core::RunSummary;
use crate::core::UserPoolCredentials;

// ============================================================================
// SECTION: Identity Provider
// ============================================================================

/// Raw tokens returned by a completed sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTokens {
    /// Access token.
    pub access_token: String,
    /// Identity token.
    pub id_token: String,
    /// Refresh token.
    pub refresh_token: String,
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &REDACTED)
            .field("id_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .finish()
    }
}

/// Outcome of a sign-in attempt that reached the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Sign-in completed.
    Authenticated(AuthTokens),
    /// The pool requires the user to choose a new password before tokens are issued.
    NewPasswordRequired {
        /// Challenge session handle to answer with.
        session: String,
    },
}

/// Authentication errors.
///
/// # Invariants
/// - Messages never include passwords or tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// The identity service rejected the request.
    #[error("{kind}: {message}")]
    Rejected {
        /// Service error type (for example `NotAuthorizedException`).
        kind: String,
        /// Service error message.
        message: String,
    },
    /// The pool demands a password reset and no replacement is configured.
    #[error("new password required for user")]
    NewPasswordRequired,
    /// The identity service could not be reached.
    #[error("identity transport error: {0}")]
    Transport(String),
    /// The identity service answered with an unexpected payload.
    #[error("identity protocol error: {0}")]
    Protocol(String),
    /// A returned token could not be decoded.
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// The provider is misconfigured.
    #[error("identity config error: {0}")]
    Config(String),
}

/// Identity service able to sign a user-pool user in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Submits username and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the service rejects the credentials
    /// or cannot be reached.
    async fn initiate_auth(
        &self,
        credentials: &UserPoolCredentials,
    ) -> Result<AuthOutcome, AuthenticationError>;

    /// Answers a new-password challenge.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the service rejects the answer.
    async fn respond_new_password(
        &self,
        credentials: &UserPoolCredentials,
        session: &str,
        new_password: &str,
    ) -> Result<AuthOutcome, AuthenticationError>;
}

// ============================================================================
// SECTION: Collection Runner
// ============================================================================

/// Reporter options passed through to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterOptions {
    /// Reporter name.
    pub reporter: String,
    /// Whether colored output is enabled.
    pub color: bool,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            reporter: "cli".to_string(),
            color: false,
        }
    }
}

/// Everything a runner needs to execute one collection.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Collection to execute.
    pub collection: Collection,
    /// Environment to resolve variables from.
    pub environment: EnvironmentDocument,
    /// Reporter options.
    pub reporter: ReporterOptions,
}

/// Collection run errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionRunError {
    /// The collection could not be loaded.
    #[error("collection load failed: {0}")]
    Load(String),
    /// The runner could not be started.
    #[error("collection runner failed to start: {0}")]
    Spawn(String),
    /// The runner failed while executing.
    #[error("collection runner error: {0}")]
    Runner(String),
    /// The runner report could not be read.
    #[error("collection report error: {0}")]
    Report(String),
    /// The run exceeded its time budget.
    #[error("collection run timed out after {0} ms")]
    Timeout(u64),
    /// The runner finished without emitting a `done` event.
    #[error("collection runner exited without completing")]
    Abandoned,
}

/// Lifecycle observer for a collection run.
pub trait RunObserver: Send + Sync {
    /// Called once when the run starts.
    fn on_start(&self);

    /// Called once when the run ends, with the run error (if any) and the summary.
    fn on_done(&self, error: Option<CollectionRunError>, summary: RunSummary);
}

/// Executes collections.
///
/// # Invariants
/// - After a successful `start`, the observer receives `on_start` then exactly
///   one `on_done`, unless the runner task itself is dropped.
pub trait CollectionRunner: Send + Sync {
    /// Starts a run in the background and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionRunError`] when the run cannot be started; no
    /// observer callbacks are made in that case.
    fn start(
        &self,
        request: RunRequest,
        observer: Arc<dyn RunObserver>,
    ) -> Result<(), CollectionRunError>;
}
