// crates/api-probe-core/src/core/mod.rs
// ============================================================================
// Module: api-probe Core Types
// Description: Credential, environment, collection, and run-result structures.
// Purpose: Provide stable, serializable types shared by every pipeline stage.
// Dependencies: serde, serde_json, uuid
// ============================================================================

//! ## Overview
//! Core types describe the values that flow through a single probe run: the
//! credential bundle returned by the identity provider, the Postman
//! environment document, the collection definition, and the run summary with
//! its status payload. None of them outlive one invocation.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod collection;
pub mod credentials;
pub mod environment;
pub mod summary;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::now_rfc3339;
pub use collection::Collection;
pub use collection::CollectionLoadError;
pub use collection::MAX_COLLECTION_BYTES;
pub use credentials::ClaimsError;
pub use credentials::CredentialBundle;
pub use credentials::REDACTED;
pub use credentials::TokenClaims;
pub use credentials::UserPoolCredentials;
pub use credentials::decode_jwt_payload;
pub use environment::BASE_URL_KEY;
pub use environment::BEARER_TOKEN_KEY;
pub use environment::EnvironmentDocument;
pub use environment::EnvironmentSettings;
pub use environment::EnvironmentVariable;
pub use summary::RunFailure;
pub use summary::RunStats;
pub use summary::RunSummary;
pub use summary::STATUS_FAILURE;
pub use summary::STATUS_SUCCESS;
pub use summary::StatusPayload;
