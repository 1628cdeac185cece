// crates/api-probe-core/src/runtime/mod.rs
// ============================================================================
// Module: api-probe Runtime
// Description: Credential, environment, orchestration, and trigger stages.
// Purpose: Wire the collaborators into one sequential probe run.
// Dependencies: crate::{core, interfaces, logging}, tokio
// ============================================================================

//! ## Overview
//! The runtime is a four-stage pipeline, leaf first: [`CredentialProvider`]
//! signs in, [`EnvironmentBuilder`] turns the tokens into an environment
//! document, [`RunOrchestrator`] runs the collection and waits for its
//! completion signal, and [`handle_trigger`] turns the outcome into a status
//! payload for the invoking trigger.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credentials;
pub mod entry;
pub mod environment;
pub mod orchestrator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credentials::CredentialProvider;
pub use entry::handle_trigger;
pub use environment::EnvironmentBuildError;
pub use environment::EnvironmentBuilder;
pub use orchestrator::CompletionObserver;
pub use orchestrator::OrchestratorConfig;
pub use orchestrator::RunError;
pub use orchestrator::RunOrchestrator;
