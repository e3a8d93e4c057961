//! Calendar availability engine for the pollcal meeting-poll application.
//!
//! Given a poll's candidate time slots, the engine answers "is this user
//! busy?" per slot by combining an encrypted OAuth credential vault, a
//! per-user calendar selection store, a TTL-bound availability cache, a
//! sliding-window rate limiter and one batched freebusy query against the
//! remote provider. It also creates the final calendar event once a poll is
//! scheduled, and manages the connect/disconnect lifecycle of the calendar
//! account.
//!
//! Availability checks degrade instead of failing: provider trouble is
//! reported as a machine-readable [`error::EngineError`] alongside whatever
//! answers the cache could still provide, and only storage failures surface
//! as hard errors.

pub mod auth;
pub mod connection;
pub mod error;
pub mod logic;
pub mod service;

#[cfg(test)]
mod logic_proptest;
#[cfg(test)]
mod logic_test;

pub use auth::AccessTokenBroker;
pub use connection::CalendarConnection;
pub use error::{EngineError, ErrorCode, TokenError};
pub use logic::{AvailabilityOutcome, EventCreator, FreebusyResolver, Slot};
pub use service::HttpCalendarProvider;
