// crates/api-probe-core/src/runtime/credentials.rs
// ============================================================================
// Module: Credential Provider
// Description: Sign-in policy on top of an identity provider.
// Purpose: Turn a sign-in outcome into a credential bundle or a typed error.
// Dependencies: crate::{core, interfaces, logging}
// ============================================================================

//! ## Overview
//! [`CredentialProvider`] performs one sign-in per call. A password-reset
//! challenge is a distinct outcome: it is answered only when a replacement
//! password is configured and otherwise fails the run. Failures are logged
//! here, where they are detected, and returned to the caller. There is no
//! retry and no token cache.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::CredentialBundle;
use crate::core::UserPoolCredentials;
use crate::interfaces::AuthOutcome;
use crate::interfaces::AuthTokens;
use crate::interfaces::AuthenticationError;
use crate::interfaces::IdentityProvider;
use crate::logging::Logger;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Obtains a fresh [`CredentialBundle`] for the configured user.
pub struct CredentialProvider {
    /// Identity service client.
    identity: Arc<dyn IdentityProvider>,
    /// Sign-in inputs.
    credentials: UserPoolCredentials,
    /// Run logger.
    logger: Logger,
}

impl CredentialProvider {
    /// Creates a credential provider.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        credentials: UserPoolCredentials,
        logger: Logger,
    ) -> Self {
        Self {
            identity,
            credentials,
            logger,
        }
    }

    /// Signs in and returns the resulting bundle.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when sign-in fails, a password reset is
    /// demanded without a configured replacement, or a token cannot be decoded.
    pub async fn obtain(&self) -> Result<CredentialBundle, AuthenticationError> {
        let result = self.sign_in().await;
        if let Err(err) = &result {
            self.logger.error(&err.to_string());
        }
        result
    }

    /// Runs the sign-in exchange without logging failures.
    async fn sign_in(&self) -> Result<CredentialBundle, AuthenticationError> {
        self.logger.debug("authenticating user pool user");
        match self.identity.initiate_auth(&self.credentials).await? {
            AuthOutcome::Authenticated(tokens) => into_bundle(tokens),
            AuthOutcome::NewPasswordRequired {
                session,
            } => {
                let Some(new_password) = self.credentials.new_password.as_deref() else {
                    return Err(AuthenticationError::NewPasswordRequired);
                };
                self.logger.warn("new password required; answering challenge");
                match self
                    .identity
                    .respond_new_password(&self.credentials, &session, new_password)
                    .await?
                {
                    AuthOutcome::Authenticated(tokens) => into_bundle(tokens),
                    AuthOutcome::NewPasswordRequired {
                        ..
                    } => Err(AuthenticationError::NewPasswordRequired),
                }
            }
        }
    }
}

/// Decodes token claims into a bundle.
fn into_bundle(tokens: AuthTokens) -> Result<CredentialBundle, AuthenticationError> {
    CredentialBundle::from_tokens(tokens.access_token, tokens.id_token, tokens.refresh_token)
        .map_err(|err| AuthenticationError::InvalidToken(err.to_string()))
}
