//! Sliding-window rate limiter interface.

use crate::error::DbError;
use pollcal_common::services::BoxFuture;

/// Length of the sliding window in seconds.
pub const RATE_WINDOW_SECS: i64 = 60;

/// Sliding-window request throttle shared by all remote-check paths.
///
/// Keys are arbitrary strings, e.g. `calendar_check:{user}:{poll}`; entries
/// self-expire and are not tied to any other entity's lifecycle.
pub trait RateLimiterRepository: Send + Sync {
    /// Create the rate-window table if it doesn't already exist.
    fn init_schema(&self) -> BoxFuture<'_, (), DbError>;

    /// Purge events for `key` older than the window, count the remainder,
    /// and if the count is below `max_per_window` record one more event and
    /// allow. Deny without recording otherwise.
    ///
    /// The purge-count-insert sequence must be atomic per key: two
    /// concurrent checks may not both pass a count that exceeds the limit.
    fn check(&self, key: &str, max_per_window: u32) -> BoxFuture<'_, bool, DbError>;
}
