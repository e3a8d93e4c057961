//! Storage for the pollcal availability engine.
//!
//! This crate provides a database-agnostic client over SQLx (SQLite by
//! default, PostgreSQL and MySQL behind feature flags) plus the four
//! keyed stores the engine needs: the encrypted credential vault, per-user
//! calendar selections, the TTL-bound availability cache, and the sliding
//! window rate limiter.
//!
//! Every store is exposed as a trait with boxed-future methods so the engine
//! can hold `Arc<dyn Trait>` handles and tests can substitute in-memory
//! doubles per component.

pub mod client;
pub mod error;
pub mod repositories;

// Register the SQLite driver when the crate is loaded
#[cfg(feature = "sqlite")]
mod sqlite_driver {
    // This import ensures the SQLite driver is linked and registered
    #[allow(unused_imports)]
    use sqlx::sqlite::SqlitePoolOptions as _;
}

// Re-export the client and error for ease of use
pub use client::DbClient;
pub use error::DbError;

// Re-export the repository traits and SQL implementations for ease of use
pub use repositories::{
    AvailabilityCacheRepository, CredentialRepository, RateLimiterRepository,
    SelectionRepository, SqlAvailabilityCacheRepository, SqlCredentialRepository,
    SqlRateLimiterRepository, SqlSelectionRepository, RATE_WINDOW_SECS,
};
