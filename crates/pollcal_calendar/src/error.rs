//! Error taxonomy of the availability engine.
//!
//! [`ErrorCode`] is the closed set of machine-readable reasons a check or
//! event insert can fail; the poll-view layer switches on these codes to
//! render user-facing messages, so new failure modes must map onto an
//! existing code rather than invent ad-hoc strings.

use pollcal_common::PollcalError;
use pollcal_db::DbError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable reason for a failed or degraded availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No calendar account is connected for the user.
    NotConnected,
    /// The account is connected but no calendars are selected for checks.
    NoCalendars,
    /// Either the local per-poll quota or the provider's limit (HTTP 429).
    RateLimited,
    /// The refresh credential was rejected; the user must reconnect.
    TokenRefreshFailed,
    /// The provider denied access to the requested data (HTTP 403).
    InsufficientPermissions,
    /// Any other provider-side failure, including malformed responses.
    ApiError,
    /// The request never reached the token endpoint.
    RequestFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotConnected => "not_connected",
            ErrorCode::NoCalendars => "no_calendars",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::TokenRefreshFailed => "token_refresh_failed",
            ErrorCode::InsufficientPermissions => "insufficient_permissions",
            ErrorCode::ApiError => "api_error",
            ErrorCode::RequestFailed => "request_failed",
        }
    }

    /// Classify a non-2xx freebusy or event-insert response.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::TokenRefreshFailed,
            403 => ErrorCode::InsufficientPermissions,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::ApiError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified engine failure: one code from the closed taxonomy plus a
/// human-readable description for logs and debugging.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {description}")]
pub struct EngineError {
    pub code: ErrorCode,
    pub description: String,
}

impl EngineError {
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn not_connected() -> Self {
        Self::new(
            ErrorCode::NotConnected,
            "No calendar account is connected",
        )
    }

    pub fn no_calendars() -> Self {
        Self::new(
            ErrorCode::NoCalendars,
            "No calendars are selected for availability checks",
        )
    }

    pub fn rate_limited() -> Self {
        Self::new(
            ErrorCode::RateLimited,
            "Availability check limit reached, try again shortly",
        )
    }
}

impl From<EngineError> for PollcalError {
    fn from(err: EngineError) -> Self {
        match err.code {
            ErrorCode::RateLimited => PollcalError::RateLimitError(err.description),
            ErrorCode::NotConnected | ErrorCode::TokenRefreshFailed => {
                PollcalError::AuthError(err.to_string())
            }
            _ => PollcalError::ExternalServiceError {
                service_name: "calendar".to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Failure of an access-token acquisition attempt.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The token endpoint answered but refused the grant.
    #[error("token endpoint rejected refresh ({code}): {description}")]
    Provider { code: String, description: String },

    /// The token endpoint was never reached.
    #[error("could not reach token endpoint: {0}")]
    RequestFailed(String),

    /// The credential vault failed; unlike the variants above this is an
    /// infrastructure error, not a degraded-result condition.
    #[error(transparent)]
    Storage(#[from] DbError),
}
