use std::fmt;
use thiserror::Error;

/// The base error type shared across all pollcal crates.
///
/// Domain-specific error enums (storage, provider, engine) convert into this
/// via `From` impls in their own crates, so callers outside the engine only
/// ever deal with one error surface.
#[derive(Error, Debug)]
pub enum PollcalError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to rate limiting
    #[error("Rate limited: {0}")]
    RateLimitError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
///
/// The poll-view layer consuming this engine maps errors onto responses; this
/// keeps that mapping in one place.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for PollcalError {
    fn status_code(&self) -> u16 {
        match self {
            PollcalError::HttpError(_) => 500,
            PollcalError::ParseError(_) => 400,
            PollcalError::ConfigError(_) => 500,
            PollcalError::AuthError(_) => 401,
            PollcalError::DatabaseError(_) => 500,
            PollcalError::ExternalServiceError { .. } => 502,
            PollcalError::NotFoundError(_) => 404,
            PollcalError::TimeoutError(_) => 504,
            PollcalError::RateLimitError(_) => 429,
            PollcalError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, PollcalError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, PollcalError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, PollcalError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| PollcalError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, PollcalError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| PollcalError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for PollcalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PollcalError::TimeoutError(err.to_string())
        } else {
            PollcalError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PollcalError {
    fn from(err: serde_json::Error) -> Self {
        PollcalError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for PollcalError {
    fn from(err: std::io::Error) -> Self {
        PollcalError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> PollcalError {
    PollcalError::ConfigError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> PollcalError {
    PollcalError::NotFoundError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> PollcalError {
    PollcalError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> PollcalError {
    PollcalError::InternalError(message.to_string())
}
