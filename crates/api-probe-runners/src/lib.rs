// crates/api-probe-runners/src/lib.rs
// ============================================================================
// Module: api-probe Runners
// Description: Collection runners for the api-probe run pipeline.
// Purpose: Execute Postman collections and report newman-shaped summaries.
// Dependencies: api-probe-core, reqwest, serde, tempfile, thiserror, tokio
// ============================================================================

//! ## Overview
//! Implementations of the core [`api_probe_core::CollectionRunner`] trait:
//! [`NewmanRunner`] drives the newman command-line tool as a child process,
//! and [`NativeRunner`] sends the collection's requests itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod native;
pub mod newman;
pub mod postman;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use native::NativeRunner;
pub use native::NativeRunnerConfig;
pub use newman::NewmanRunner;
pub use newman::NewmanRunnerConfig;
pub use postman::PostmanItem;
pub use postman::PostmanParseError;
pub use postman::flatten_items;
pub use postman::substitute_variables;
