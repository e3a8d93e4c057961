//! Service abstractions for the external calendar provider.
//!
//! The engine consumes exactly one remote calendar provider through the
//! [`CalendarProvider`] trait, which keeps the orchestration logic decoupled
//! from the HTTP implementation and testable with scripted doubles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Errors surfaced by a calendar provider implementation.
///
/// The variants deliberately preserve the raw HTTP status and remote error
/// code: classification into the engine's error taxonomy happens in the
/// resolver, not here.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The request never produced a response (connect error, timeout).
    #[error("provider request failed: {0}")]
    Transport(String),

    /// Non-2xx response from a calendar API endpoint.
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The token endpoint rejected the refresh grant with a machine-readable
    /// OAuth error code (e.g. `invalid_grant`).
    #[error("token endpoint rejected grant ({code}): {description}")]
    TokenRejected { code: String, description: String },

    /// A 2xx response whose body did not match the expected shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// A short-lived access credential returned by the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime of the access token in seconds, when the provider reports one.
    pub expires_in: Option<i64>,
}

/// A calendar available on the user's remote account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCalendar {
    pub id: String,
    pub name: String,
}

/// A half-open time interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Busy and tentative intervals for one calendar in a freebusy response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarSchedule {
    #[serde(default)]
    pub busy: Vec<Interval>,
    #[serde(default)]
    pub tentative: Vec<Interval>,
}

/// The provider's answer to one batched freebusy query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreeBusySchedule {
    /// Keyed by remote calendar id.
    #[serde(default)]
    pub calendars: HashMap<String, CalendarSchedule>,
}

/// Fields for a single calendar event insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    pub calendar_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Invitations are only sent when non-empty.
    pub attendee_emails: Vec<String>,
}

/// Result of a calendar event insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEvent {
    /// The remote event identifier.
    pub event_id: Option<String>,
    pub status: String,
}

/// The three remote operations this engine uses, plus the token refresh that
/// authorizes them.
pub trait CalendarProvider: Send + Sync {
    /// Exchange a refresh credential for a short-lived access credential.
    fn refresh_access_token(&self, refresh_token: &str) -> BoxFuture<'_, TokenGrant, ProviderError>;

    /// List the calendars on the connected account.
    fn list_calendars(&self, access_token: &str) -> BoxFuture<'_, Vec<RemoteCalendar>, ProviderError>;

    /// One batched freebusy query over a time range and a set of calendars.
    fn query_free_busy(
        &self,
        access_token: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        calendar_ids: &[String],
    ) -> BoxFuture<'_, FreeBusySchedule, ProviderError>;

    /// Insert a single event into the given calendar.
    fn insert_event(
        &self,
        access_token: &str,
        event: EventInput,
    ) -> BoxFuture<'_, CreatedEvent, ProviderError>;
}
