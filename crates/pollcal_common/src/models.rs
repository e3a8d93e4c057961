//! Shared data structures used across the engine crates.

use serde::{Deserialize, Serialize};

/// One remote calendar a user has chosen (or not) for availability checks.
///
/// The `tentative_as_busy` policy is effectively a per-user setting; it is
/// duplicated on every row for storage simplicity, and reads take it from
/// the first row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSelection {
    /// Remote calendar id as reported by the provider.
    pub calendar_id: String,
    /// Display name shown in the selection UI.
    pub name: String,
    /// Whether this calendar participates in availability checks.
    pub selected: bool,
    /// Whether "tentative" events count as busy.
    pub tentative_as_busy: bool,
}
