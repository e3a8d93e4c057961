//! HTTP client for the remote calendar provider.
//!
//! Implements [`CalendarProvider`] over the provider's REST surface: the
//! OAuth token endpoint plus `/calendars`, `/freebusy` and
//! `/calendars/{id}/events`. Response bodies are validated at the
//! deserialization boundary; a 2xx with an unexpected shape becomes
//! [`ProviderError::Malformed`], never a panic or a silent default.

use chrono::{DateTime, SecondsFormat, Utc};
use pollcal_common::http::{create_client, HTTP_CLIENT};
use pollcal_common::services::{
    BoxFuture, CalendarProvider, CreatedEvent, EventInput, FreeBusySchedule, ProviderError,
    RemoteCalendar, TokenGrant,
};
use pollcal_common::PollcalError;
use pollcal_config::models::ProviderConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on how much of an error body is carried into error messages.
const ERROR_BODY_LIMIT: usize = 256;

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn truncate_body(body: &str) -> String {
    let mut end = body.len().min(ERROR_BODY_LIMIT);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.to_string())
}

#[derive(Deserialize)]
struct TokenResponseBody {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct CalendarListBody {
    #[serde(default)]
    calendars: Vec<RemoteCalendar>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequestBody<'a> {
    time_min: String,
    time_max: String,
    calendar_ids: &'a [String],
}

#[derive(Serialize)]
struct AttendeeBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertEventBody<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    start: String,
    end: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<AttendeeBody<'a>>,
}

#[derive(Deserialize)]
struct InsertEventResponseBody {
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Reqwest-backed [`CalendarProvider`] implementation.
pub struct HttpCalendarProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpCalendarProvider {
    /// Build a provider client from configuration. A configured timeout gets
    /// a dedicated client; otherwise the shared one is reused.
    pub fn from_config(config: ProviderConfig) -> Result<Self, PollcalError> {
        let client = match config.timeout_secs {
            Some(secs) => create_client(secs, true)?,
            None => HTTP_CLIENT.clone(),
        };
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    async fn status_error(response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ProviderError::Status {
            status,
            message: truncate_body(&body),
        }
    }
}

impl CalendarProvider for HttpCalendarProvider {
    fn refresh_access_token(&self, refresh_token: &str) -> BoxFuture<'_, TokenGrant, ProviderError> {
        let refresh_token = refresh_token.to_string();

        Box::pin(async move {
            debug!("Refreshing access token via {}", self.config.token_url);

            let form = [
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ];

            let response = self
                .client
                .post(&self.config.token_url)
                .form(&form)
                .send()
                .await
                .map_err(transport)?;

            if response.status().is_success() {
                let body: TokenResponseBody = response
                    .json()
                    .await
                    .map_err(|e| ProviderError::Malformed(e.to_string()))?;
                return Ok(TokenGrant {
                    access_token: body.access_token,
                    expires_in: body.expires_in,
                });
            }

            // Token endpoints report refusals as a JSON error body; anything
            // that doesn't parse as one is treated as a plain status failure.
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            match serde_json::from_str::<TokenErrorBody>(&text) {
                Ok(body) => Err(ProviderError::TokenRejected {
                    code: body.error,
                    description: body.error_description.unwrap_or_default(),
                }),
                Err(_) => Err(ProviderError::Status {
                    status,
                    message: truncate_body(&text),
                }),
            }
        })
    }

    fn list_calendars(&self, access_token: &str) -> BoxFuture<'_, Vec<RemoteCalendar>, ProviderError> {
        let access_token = access_token.to_string();

        Box::pin(async move {
            let response = self
                .client
                .get(self.api_url("/calendars"))
                .bearer_auth(&access_token)
                .send()
                .await
                .map_err(transport)?;

            if !response.status().is_success() {
                return Err(Self::status_error(response).await);
            }

            let body: CalendarListBody = response
                .json()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string()))?;
            Ok(body.calendars)
        })
    }

    fn query_free_busy(
        &self,
        access_token: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        calendar_ids: &[String],
    ) -> BoxFuture<'_, FreeBusySchedule, ProviderError> {
        let access_token = access_token.to_string();
        let calendar_ids = calendar_ids.to_vec();

        Box::pin(async move {
            debug!(
                "Querying freebusy for {} calendars between {} and {}",
                calendar_ids.len(),
                rfc3339(start),
                rfc3339(end)
            );

            let body = FreeBusyRequestBody {
                time_min: rfc3339(start),
                time_max: rfc3339(end),
                calendar_ids: &calendar_ids,
            };

            let response = self
                .client
                .post(self.api_url("/freebusy"))
                .bearer_auth(&access_token)
                .json(&body)
                .send()
                .await
                .map_err(transport)?;

            if !response.status().is_success() {
                return Err(Self::status_error(response).await);
            }

            response
                .json::<FreeBusySchedule>()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string()))
        })
    }

    fn insert_event(
        &self,
        access_token: &str,
        event: EventInput,
    ) -> BoxFuture<'_, CreatedEvent, ProviderError> {
        let access_token = access_token.to_string();

        Box::pin(async move {
            let body = InsertEventBody {
                summary: &event.title,
                description: event.description.as_deref(),
                location: event.location.as_deref(),
                start: rfc3339(event.start),
                end: rfc3339(event.end),
                attendees: event
                    .attendee_emails
                    .iter()
                    .map(|email| AttendeeBody { email })
                    .collect(),
            };

            let response = self
                .client
                .post(self.api_url(&format!("/calendars/{}/events", event.calendar_id)))
                .bearer_auth(&access_token)
                .json(&body)
                .send()
                .await
                .map_err(transport)?;

            if !response.status().is_success() {
                return Err(Self::status_error(response).await);
            }

            let body: InsertEventResponseBody = response
                .json()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string()))?;
            Ok(CreatedEvent {
                event_id: body.id,
                status: body.status.unwrap_or_else(|| "confirmed".to_string()),
            })
        })
    }
}
