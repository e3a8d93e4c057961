//! Repositories for the pollcal availability engine.
//!
//! Each store is a trait (boxed-future methods, so `Arc<dyn Trait>` handles
//! work) plus a SQL implementation over [`crate::DbClient`].

pub mod cache;
pub mod cache_sql;
pub mod credential;
pub mod credential_sql;
pub mod rate_limit;
pub mod rate_limit_sql;
pub mod selection;
pub mod selection_sql;

pub use cache::AvailabilityCacheRepository;
pub use cache_sql::SqlAvailabilityCacheRepository;
pub use credential::CredentialRepository;
pub use credential_sql::SqlCredentialRepository;
pub use rate_limit::{RateLimiterRepository, RATE_WINDOW_SECS};
pub use rate_limit_sql::SqlRateLimiterRepository;
pub use selection::SelectionRepository;
pub use selection_sql::SqlSelectionRepository;
