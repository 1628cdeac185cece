// crates/api-probe-core/src/runtime/environment.rs
// ============================================================================
// Module: Environment Builder
// Description: Assembles the environment document for a collection run.
// Purpose: Combine static settings with a freshly obtained bearer token.
// Dependencies: crate::{core, interfaces, logging, runtime::credentials}, uuid
// ============================================================================

//! ## Overview
//! Each [`EnvironmentBuilder::build`] call signs in once and produces a
//! document with exactly two enabled variables, `BaseURL` then
//! `COGNITO_JWT`, under a new random identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use uuid::Uuid;

use crate::core::BASE_URL_KEY;
use crate::core::BEARER_TOKEN_KEY;
use crate::core::EnvironmentDocument;
use crate::core::EnvironmentSettings;
use crate::core::EnvironmentVariable;
use crate::core::now_rfc3339;
use crate::interfaces::AuthenticationError;
use crate::logging::Logger;
use crate::runtime::credentials::CredentialProvider;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Environment assembly errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentBuildError {
    /// No credential bundle could be obtained.
    #[error("credentials unavailable: {0}")]
    Credentials(#[from] AuthenticationError),
    /// The bundle lacks a required token.
    #[error("credential bundle missing {0} token")]
    MissingToken(&'static str),
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds [`EnvironmentDocument`]s.
pub struct EnvironmentBuilder {
    /// API base URL.
    base_url: String,
    /// Static document settings.
    settings: EnvironmentSettings,
    /// Source of bearer tokens.
    credentials: CredentialProvider,
    /// Run logger.
    logger: Logger,
}

impl EnvironmentBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(
        base_url: String,
        settings: EnvironmentSettings,
        credentials: CredentialProvider,
        logger: Logger,
    ) -> Self {
        Self {
            base_url,
            settings,
            credentials,
            logger,
        }
    }

    /// Signs in and assembles a new document.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentBuildError`] when no usable access token is obtained.
    pub async fn build(&self) -> Result<EnvironmentDocument, EnvironmentBuildError> {
        // `obtain` has already logged any sign-in failure.
        let bundle = self.credentials.obtain().await?;
        if bundle.access_token.trim().is_empty() {
            let err = EnvironmentBuildError::MissingToken("access");
            self.logger.error(&err.to_string());
            return Err(err);
        }
        Ok(EnvironmentDocument {
            id: Uuid::new_v4(),
            name: self.settings.name.clone(),
            values: vec![
                EnvironmentVariable::enabled(BASE_URL_KEY, &self.base_url),
                EnvironmentVariable::enabled(BEARER_TOKEN_KEY, &bundle.access_token),
            ],
            scope: self.settings.scope.clone(),
            exported_at: now_rfc3339(),
            exporter_version: self.settings.exporter_version.clone(),
        })
    }
}
