//! Availability cache interface.
//!
//! Maps (user, slot) to a busy boolean with a cached-at timestamp. Staleness
//! is judged lazily at read time against the caller-supplied TTL; no sweeper
//! runs in the background. Expired rows are simply overwritten on the next
//! successful resolution.

use crate::error::DbError;
use pollcal_common::services::BoxFuture;

/// TTL-bound store for resolved busy/free answers.
pub trait AvailabilityCacheRepository: Send + Sync {
    /// Create the cache table if it doesn't already exist.
    fn init_schema(&self) -> BoxFuture<'_, (), DbError>;

    /// Return the cached busy flag for (user, slot) if it was written less
    /// than `ttl_secs` ago; anything older is a miss.
    fn get(&self, user_id: &str, slot_id: &str, ttl_secs: i64) -> BoxFuture<'_, Option<bool>, DbError>;

    /// Write-through upsert: created or overwritten on every successful
    /// remote resolution, refreshing `cached_at`.
    fn set(
        &self,
        user_id: &str,
        poll_id: &str,
        slot_id: &str,
        busy: bool,
    ) -> BoxFuture<'_, (), DbError>;

    /// Drop every cached answer for the user (disconnect or selection change).
    fn invalidate_for_user(&self, user_id: &str) -> BoxFuture<'_, u64, DbError>;
}
