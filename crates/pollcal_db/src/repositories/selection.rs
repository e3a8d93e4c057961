//! Calendar selection store interface.

use crate::error::DbError;
use pollcal_common::models::CalendarSelection;
use pollcal_common::services::BoxFuture;

/// Repository for the per-user set of chosen remote calendars.
pub trait SelectionRepository: Send + Sync {
    /// Create the selections table if it doesn't already exist.
    fn init_schema(&self) -> BoxFuture<'_, (), DbError>;

    /// Ids of the calendars the user selected for availability checks, in
    /// insertion order.
    fn selected_ids(&self, user_id: &str) -> BoxFuture<'_, Vec<String>, DbError>;

    /// The user's tentative-as-busy policy, read off the first selection row.
    /// Defaults to `true` when the user has no rows.
    fn tentative_as_busy(&self, user_id: &str) -> BoxFuture<'_, bool, DbError>;

    /// Upsert every entry. The tentative-as-busy flag is a user-level setting,
    /// so the same value is written to every row touched.
    fn save_selections(
        &self,
        user_id: &str,
        selections: &[CalendarSelection],
    ) -> BoxFuture<'_, (), DbError>;

    /// Remove all of the user's selection rows (used on disconnect).
    fn delete_for_user(&self, user_id: &str) -> BoxFuture<'_, u64, DbError>;
}
