//! Access token brokering.
//!
//! The broker is the only component that touches the credential vault and the
//! provider's token endpoint together. It deliberately refreshes on every
//! resolution instead of reusing a stored access token until expiry: one
//! extra round trip per check, zero clock-skew bugs, and the stored access
//! secret is only a best-effort convenience for debugging.

use crate::error::TokenError;
use chrono::{Duration, Utc};
use pollcal_common::services::{CalendarProvider, ProviderError};
use pollcal_db::CredentialRepository;
use std::sync::Arc;
use tracing::{debug, warn};

/// OAuth error codes that mean the refresh credential itself is dead and the
/// user must reconnect, as opposed to a transient provider problem.
const CREDENTIAL_REJECTION_CODES: &[&str] = &[
    "invalid_grant",
    "invalid_client",
    "unauthorized_client",
    "access_denied",
];

/// Whether a token-endpoint error code indicates an unusable refresh
/// credential rather than a transient failure.
pub fn is_credential_rejection(code: &str) -> bool {
    CREDENTIAL_REJECTION_CODES.contains(&code)
}

/// Exchanges the vaulted refresh secret for a short-lived access token.
pub struct AccessTokenBroker {
    credentials: Arc<dyn CredentialRepository>,
    provider: Arc<dyn CalendarProvider>,
    provider_name: String,
}

impl AccessTokenBroker {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        provider: Arc<dyn CalendarProvider>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            provider,
            provider_name: provider_name.into(),
        }
    }

    /// Acquire an access token for the user.
    ///
    /// Returns `Ok(None)` when the user has no usable credential (never
    /// connected, disconnected, or an undecryptable vault blob). A fresh
    /// grant is persisted back into the vault alongside the unchanged
    /// refresh secret before it is returned.
    pub async fn access_token(&self, user_id: &str) -> Result<Option<String>, TokenError> {
        let Some(refresh_secret) = self
            .credentials
            .refresh_secret(user_id, &self.provider_name)
            .await?
        else {
            debug!("No stored calendar credential for user: {}", user_id);
            return Ok(None);
        };

        match self.provider.refresh_access_token(&refresh_secret).await {
            Ok(grant) => {
                let expiry = grant
                    .expires_in
                    .map(|secs| Utc::now() + Duration::seconds(secs));
                self.credentials
                    .store(
                        user_id,
                        &self.provider_name,
                        &refresh_secret,
                        Some(&grant.access_token),
                        expiry,
                    )
                    .await?;
                Ok(Some(grant.access_token))
            }
            Err(ProviderError::TokenRejected { code, description }) => {
                warn!(
                    "Token endpoint rejected refresh for user {} ({}): {}",
                    user_id, code, description
                );
                Err(TokenError::Provider { code, description })
            }
            Err(ProviderError::Status { status, message }) => Err(TokenError::Provider {
                code: format!("http_{}", status),
                description: message,
            }),
            Err(ProviderError::Malformed(message)) => Err(TokenError::Provider {
                code: "malformed_response".to_string(),
                description: message,
            }),
            Err(ProviderError::Transport(message)) => Err(TokenError::RequestFailed(message)),
        }
    }
}
