// crates/api-probe-providers/src/cognito.rs
// ============================================================================
// Module: Cognito Identity Provider
// Description: User pool sign-in over the Cognito JSON 1.1 API.
// Purpose: Exchange a username and password for user pool tokens.
// Dependencies: api-probe-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`CognitoIdentityProvider`] issues `InitiateAuth` with the
//! `USER_PASSWORD_AUTH` flow and, when asked, answers a
//! `NEW_PASSWORD_REQUIRED` challenge with `RespondToAuthChallenge`.
//! Service errors are surfaced with their exception name and message;
//! responses are size limited and must be JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use api_probe_core::AuthOutcome;
use api_probe_core::AuthTokens;
use api_probe_core::AuthenticationError;
use api_probe_core::IdentityProvider;
use api_probe_core::LogLevel;
use api_probe_core::Logger;
use api_probe_core::UserPoolCredentials;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `X-Amz-Target` for the sign-in call.
pub const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
/// `X-Amz-Target` for the challenge answer.
pub const RESPOND_TO_AUTH_CHALLENGE_TARGET: &str =
    "AWSCognitoIdentityProviderService.RespondToAuthChallenge";
/// Request body media type for the JSON 1.1 protocol.
const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
/// Target header name.
const AMZ_TARGET_HEADER: &str = "X-Amz-Target";
/// Username/password flow.
const USER_PASSWORD_AUTH: &str = "USER_PASSWORD_AUTH";
/// Challenge name for a forced password reset.
const NEW_PASSWORD_REQUIRED: &str = "NEW_PASSWORD_REQUIRED";
/// Maximum accepted response size in bytes.
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Default user agent.
const DEFAULT_USER_AGENT: &str = concat!("api-probe/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the Cognito provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoProviderConfig {
    /// Service endpoint URL.
    pub endpoint: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl CognitoProviderConfig {
    /// Returns a config targeting the public endpoint for `region`.
    #[must_use]
    pub fn for_region(region: &str, timeout: Duration) -> Self {
        Self {
            endpoint: regional_endpoint(region),
            timeout,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Returns the public user pool endpoint for `region`.
#[must_use]
pub fn regional_endpoint(region: &str) -> String {
    format!("https://cognito-idp.{}.amazonaws.com/", region.trim())
}

// ============================================================================
// SECTION: Provider Implementation
// ============================================================================

/// Identity provider backed by a Cognito user pool.
pub struct CognitoIdentityProvider {
    /// Provider configuration.
    config: CognitoProviderConfig,
    /// HTTP client used for outbound requests.
    client: Client,
    /// Run logger.
    logger: Logger,
}

impl CognitoIdentityProvider {
    /// Creates a new Cognito provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::Config`] when the HTTP client cannot be created.
    pub fn new(config: CognitoProviderConfig, logger: Logger) -> Result<Self, AuthenticationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| AuthenticationError::Config("http client build failed".to_string()))?;
        Ok(Self {
            config,
            client,
            logger,
        })
    }

    /// Posts one JSON 1.1 call and returns the parsed response body.
    async fn call(&self, target: &str, body: &Value) -> Result<Value, AuthenticationError> {
        self.logger.log(
            LogLevel::Http,
            "identity request",
            Some(json!({ "target": target, "endpoint": self.config.endpoint })),
        );
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(AMZ_TARGET_HEADER, target)
            .header(CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| AuthenticationError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = read_response_limited(response, MAX_RESPONSE_BYTES).await?;
        let parsed = serde_json::from_slice::<Value>(&bytes);
        if !status.is_success() {
            return Err(parsed
                .ok()
                .and_then(|body| service_error(&body))
                .unwrap_or_else(|| {
                    AuthenticationError::Protocol(format!("identity service returned {status}"))
                }));
        }
        parsed.map_err(|_| AuthenticationError::Protocol("identity response is not json".to_string()))
    }
}

/// Reads a response body, failing once it exceeds `max_bytes`.
///
/// An advertised `Content-Length` over the limit is rejected before any of
/// the body is read; otherwise chunks are accumulated until the limit is
/// crossed.
async fn read_response_limited(
    mut response: Response,
    max_bytes: usize,
) -> Result<Vec<u8>, AuthenticationError> {
    let oversized =
        || AuthenticationError::Protocol("identity response exceeds size limit".to_string());
    let expected_len = response.content_length();
    if expected_len.is_some_and(|expected| u64::try_from(max_bytes).is_ok_and(|max| expected > max)) {
        return Err(oversized());
    }
    let mut buf = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|err| AuthenticationError::Transport(err.to_string()))?
    {
        if buf.len() + chunk.len() > max_bytes {
            return Err(oversized());
        }
        buf.extend_from_slice(&chunk);
    }
    let received = u64::try_from(buf.len()).unwrap_or(u64::MAX);
    if expected_len.is_some_and(|expected| received < expected) {
        return Err(AuthenticationError::Transport("identity response truncated".to_string()));
    }
    Ok(buf)
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn initiate_auth(
        &self,
        credentials: &UserPoolCredentials,
    ) -> Result<AuthOutcome, AuthenticationError> {
        let body = json!({
            "AuthFlow": USER_PASSWORD_AUTH,
            "ClientId": credentials.client_id,
            "AuthParameters": {
                "USERNAME": credentials.username,
                "PASSWORD": credentials.password,
            },
        });
        let response = self.call(INITIATE_AUTH_TARGET, &body).await?;
        parse_outcome(&response)
    }

    async fn respond_new_password(
        &self,
        credentials: &UserPoolCredentials,
        session: &str,
        new_password: &str,
    ) -> Result<AuthOutcome, AuthenticationError> {
        let body = json!({
            "ChallengeName": NEW_PASSWORD_REQUIRED,
            "ClientId": credentials.client_id,
            "Session": session,
            "ChallengeResponses": {
                "USERNAME": credentials.username,
                "NEW_PASSWORD": new_password,
            },
        });
        let response = self.call(RESPOND_TO_AUTH_CHALLENGE_TARGET, &body).await?;
        parse_outcome(&response)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a sign-in response to an outcome.
fn parse_outcome(body: &Value) -> Result<AuthOutcome, AuthenticationError> {
    if let Some(result) = body.get("AuthenticationResult") {
        let required = |field: &str| {
            result
                .get(field)
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    AuthenticationError::Protocol(format!("AuthenticationResult missing {field}"))
                })
        };
        return Ok(AuthOutcome::Authenticated(AuthTokens {
            access_token: required("AccessToken")?,
            id_token: required("IdToken")?,
            refresh_token: result
                .get("RefreshToken")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }));
    }
    match body.get("ChallengeName").and_then(Value::as_str) {
        Some(NEW_PASSWORD_REQUIRED) => {
            let session = body
                .get("Session")
                .and_then(Value::as_str)
                .filter(|session| !session.is_empty())
                .ok_or_else(|| {
                    AuthenticationError::Protocol("challenge response missing Session".to_string())
                })?;
            Ok(AuthOutcome::NewPasswordRequired {
                session: session.to_string(),
            })
        }
        Some(other) => Err(AuthenticationError::Protocol(format!("unsupported challenge: {other}"))),
        None => Err(AuthenticationError::Protocol(
            "identity response carries neither tokens nor a challenge".to_string(),
        )),
    }
}

/// Extracts a service exception from an error body.
fn service_error(body: &Value) -> Option<AuthenticationError> {
    let kind = body.get("__type").and_then(Value::as_str)?;
    let kind = kind.rsplit('#').next().unwrap_or(kind);
    let message = body
        .get("message")
        .or_else(|| body.get("Message"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(AuthenticationError::Rejected {
        kind: kind.to_string(),
        message: message.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
