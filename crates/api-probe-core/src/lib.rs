// crates/api-probe-core/src/lib.rs
// ============================================================================
// Module: api-probe Core Library
// Description: Public API surface for the api-probe core.
// Purpose: Expose run types, collaborator interfaces, logging, and the run pipeline.
// Dependencies: crate::{core, interfaces, logging, runtime}
// ============================================================================

//! ## Overview
//! api-probe authenticates against a Cognito user pool, assembles a Postman
//! environment document, and hands it to a collection runner. This crate owns
//! the backend-agnostic parts of that pipeline: the data model, the
//! interfaces implemented by identity providers and collection runners, the
//! structured logger, and the orchestration runtime.
//!
//! Invariants:
//! - Every pipeline stage returns a typed [`Result`]; no stage swallows an
//!   upstream failure.
//! - A collection run settles its completion signal exactly once.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod logging;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::AuthOutcome;
pub use interfaces::AuthTokens;
pub use interfaces::AuthenticationError;
pub use interfaces::CollectionRunError;
pub use interfaces::CollectionRunner;
pub use interfaces::IdentityProvider;
pub use interfaces::ReporterOptions;
pub use interfaces::RunObserver;
pub use interfaces::RunRequest;
pub use logging::LogFormat;
pub use logging::LogLevel;
pub use logging::LogRecord;
pub use logging::LogSink;
pub use logging::Logger;
pub use runtime::CredentialProvider;
pub use runtime::EnvironmentBuildError;
pub use runtime::EnvironmentBuilder;
pub use runtime::OrchestratorConfig;
pub use runtime::RunError;
pub use runtime::RunOrchestrator;
pub use runtime::handle_trigger;
