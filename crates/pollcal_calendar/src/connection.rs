//! Calendar account lifecycle: connect, inspect, select, disconnect.
//!
//! Everything here changes or reads durable state around the credential
//! vault; the actual availability math lives in [`crate::logic`].

use crate::auth::AccessTokenBroker;
use crate::error::TokenError;
use pollcal_common::error::external_service_error;
use pollcal_common::models::CalendarSelection;
use pollcal_common::services::{CalendarProvider, RemoteCalendar};
use pollcal_common::PollcalError;
use pollcal_db::{
    AvailabilityCacheRepository, CredentialRepository, SelectionRepository,
};
use std::sync::Arc;
use tracing::info;

/// Manages a user's connection to their remote calendar account.
pub struct CalendarConnection {
    credentials: Arc<dyn CredentialRepository>,
    selections: Arc<dyn SelectionRepository>,
    cache: Arc<dyn AvailabilityCacheRepository>,
    provider: Arc<dyn CalendarProvider>,
    broker: AccessTokenBroker,
    provider_name: String,
}

impl CalendarConnection {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        selections: Arc<dyn SelectionRepository>,
        cache: Arc<dyn AvailabilityCacheRepository>,
        provider: Arc<dyn CalendarProvider>,
        provider_name: impl Into<String>,
    ) -> Self {
        let provider_name = provider_name.into();
        let broker = AccessTokenBroker::new(
            Arc::clone(&credentials),
            Arc::clone(&provider),
            provider_name.clone(),
        );
        Self {
            credentials,
            selections,
            cache,
            provider,
            broker,
            provider_name,
        }
    }

    /// Persist the refresh secret obtained from the OAuth authorization flow.
    ///
    /// `expires_in` is the access token lifetime in seconds, when the
    /// authorization response included an access token.
    pub async fn store_authorization(
        &self,
        user_id: &str,
        refresh_secret: &str,
        access_secret: Option<&str>,
        expires_in: Option<i64>,
    ) -> Result<(), PollcalError> {
        let expiry = expires_in.map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs));
        self.credentials
            .store(user_id, &self.provider_name, refresh_secret, access_secret, expiry)
            .await?;
        info!("Stored calendar authorization for user: {}", user_id);
        Ok(())
    }

    /// Whether the user has a stored credential for this provider.
    ///
    /// This only checks row existence, not whether the credential still
    /// works; a dead refresh token shows up as `token_refresh_failed` on the
    /// next availability check.
    pub async fn is_connected(&self, user_id: &str) -> Result<bool, PollcalError> {
        Ok(self
            .credentials
            .has_credential(user_id, &self.provider_name)
            .await?)
    }

    /// Remove the credential and everything derived from it: calendar
    /// selections and cached availability answers.
    pub async fn disconnect(&self, user_id: &str) -> Result<(), PollcalError> {
        let removed = self
            .credentials
            .delete(user_id, &self.provider_name)
            .await?;
        self.selections.delete_for_user(user_id).await?;
        self.cache.invalidate_for_user(user_id).await?;
        if removed {
            info!("Disconnected calendar account for user: {}", user_id);
        }
        Ok(())
    }

    /// List the calendars on the connected remote account, for the selection
    /// UI. Returns `Ok(None)` when no account is connected.
    pub async fn list_remote_calendars(
        &self,
        user_id: &str,
    ) -> Result<Option<Vec<RemoteCalendar>>, PollcalError> {
        let access_token = match self.broker.access_token(user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(TokenError::Storage(e)) => return Err(e.into()),
            Err(e) => return Err(external_service_error(&self.provider_name, e)),
        };

        let calendars = self
            .provider
            .list_calendars(&access_token)
            .await
            .map_err(|e| external_service_error(&self.provider_name, e))?;
        Ok(Some(calendars))
    }

    /// Replace the user's calendar selections and drop cached answers, which
    /// were computed against the old calendar set.
    pub async fn save_selections(
        &self,
        user_id: &str,
        selections: &[CalendarSelection],
    ) -> Result<(), PollcalError> {
        self.selections.save_selections(user_id, selections).await?;
        self.cache.invalidate_for_user(user_id).await?;
        Ok(())
    }
}
