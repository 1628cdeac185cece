// crates/api-probe-core/src/core/credentials.rs
// ============================================================================
// Module: Credentials
// Description: User-pool sign-in inputs and the signed-token bundle.
// Purpose: Carry identity material between the provider and the environment builder.
// Dependencies: base64, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`UserPoolCredentials`] are the static sign-in inputs read from
//! configuration. [`CredentialBundle`] is what a successful sign-in yields:
//! the access, identity, and refresh tokens plus the decoded claims of the
//! access and identity tokens. Token signatures are not verified here; the
//! API under test is the party that validates them.
//!
//! Neither type prints raw secrets through `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder printed in place of secret values.
pub const REDACTED: &str = "<redacted>";

// ============================================================================
// SECTION: Sign-In Inputs
// ============================================================================

/// Sign-in inputs for a Cognito user pool.
///
/// # Invariants
/// - `new_password` is only used to answer a `NEW_PASSWORD_REQUIRED` challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPoolCredentials {
    /// User pool identifier (`<region>_<id>`).
    pub user_pool_id: String,
    /// App client identifier.
    pub client_id: String,
    /// Username to sign in with.
    pub username: String,
    /// Password for `username`.
    pub password: String,
    /// Replacement password used when the pool demands a reset.
    pub new_password: Option<String>,
}

impl fmt::Debug for UserPoolCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPoolCredentials")
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("new_password", &self.new_password.as_ref().map(|_| REDACTED))
            .finish()
    }
}

// ============================================================================
// SECTION: Credential Bundle
// ============================================================================

/// Decoded JWT payloads for the access and identity tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TokenClaims {
    /// Access token claims.
    pub access: Map<String, Value>,
    /// Identity token claims.
    pub id: Map<String, Value>,
}

/// Tokens and claims produced by one successful sign-in.
///
/// # Invariants
/// - Created once per run and never persisted.
/// - `claims` always matches the payloads of `access_token` and `id_token`.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    /// Access token, used as the bearer token for the API under test.
    pub access_token: String,
    /// Identity token.
    pub id_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Decoded token claims.
    pub claims: TokenClaims,
}

impl CredentialBundle {
    /// Builds a bundle from raw tokens, decoding the access and identity claims.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError`] when a token is empty or its payload cannot be decoded.
    pub fn from_tokens(
        access_token: String,
        id_token: String,
        refresh_token: String,
    ) -> Result<Self, ClaimsError> {
        if refresh_token.trim().is_empty() {
            return Err(ClaimsError::Missing("refresh"));
        }
        let access = decode_named(&access_token, "access")?;
        let id = decode_named(&id_token, "id")?;
        Ok(Self {
            access_token,
            id_token,
            refresh_token,
            claims: TokenClaims {
                access,
                id,
            },
        })
    }

    /// Returns a JSON view of the bundle with every token replaced by a placeholder.
    #[must_use]
    pub fn redacted_json(&self) -> Value {
        serde_json::json!({
            "accessToken": REDACTED,
            "idToken": REDACTED,
            "refreshToken": REDACTED,
            "claims": {
                "access": self.claims.access,
                "id": self.claims.id,
            },
        })
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_token", &REDACTED)
            .field("id_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .field("claims", &self.claims)
            .finish()
    }
}

// ============================================================================
// SECTION: Claims Decoding
// ============================================================================

/// JWT claim decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    /// A required token was empty.
    #[error("{0} token is missing")]
    Missing(&'static str),
    /// The token is not a three-segment JWT.
    #[error("{0} token is not a jwt")]
    Malformed(&'static str),
    /// The payload segment is not base64url.
    #[error("{0} token payload is not base64url")]
    Encoding(&'static str),
    /// The payload is not a JSON object.
    #[error("{0} token payload is not a json object")]
    Payload(&'static str),
}

/// Decodes the payload segment of a compact JWT into a JSON object.
///
/// # Errors
///
/// Returns [`ClaimsError`] when the token is malformed or the payload is not a JSON object.
pub fn decode_jwt_payload(token: &str) -> Result<Map<String, Value>, ClaimsError> {
    decode_named(token, "jwt")
}

/// Decodes a token payload, labelling errors with `label`.
fn decode_named(token: &str, label: &'static str) -> Result<Map<String, Value>, ClaimsError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ClaimsError::Missing(label));
    }
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(ClaimsError::Malformed(label));
    };
    // Some issuers pad their segments even though RFC 7515 forbids it.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| ClaimsError::Encoding(label))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ClaimsError::Payload(label)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
