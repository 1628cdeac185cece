// crates/api-probe-config/src/lib.rs
// ============================================================================
// Module: api-probe Config Library
// Description: Configuration model, validation, and example generation.
// Purpose: Single source of truth for api-probe.toml semantics.
// Dependencies: api-probe-core, serde, toml
// ============================================================================

//! ## Overview
//! `api-probe-config` loads `api-probe.toml`, applies the selected profile and
//! environment overrides, and validates the result fail-closed. The
//! validated model converts into the inputs of the core run pipeline.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
