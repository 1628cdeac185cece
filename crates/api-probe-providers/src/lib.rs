// crates/api-probe-providers/src/lib.rs
// ============================================================================
// Module: api-probe Providers
// Description: Identity providers for the api-probe run pipeline.
// Purpose: Sign users in against hosted identity services.
// Dependencies: api-probe-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Implementations of the core [`api_probe_core::IdentityProvider`] trait.
//! The Cognito provider speaks the user pool JSON API directly.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cognito;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cognito::CognitoIdentityProvider;
pub use cognito::CognitoProviderConfig;
pub use cognito::regional_endpoint;
