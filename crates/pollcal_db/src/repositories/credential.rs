//! Credential vault interface.
//!
//! Stores one OAuth credential per (user, provider). Secrets are sealed with
//! AES-256-GCM before they reach the database; a blob that fails to open is
//! reported as "no credential", never as an error, so a corrupted credential
//! is operationally indistinguishable from a user who never connected.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use pollcal_common::services::BoxFuture;

/// Repository for encrypted per-user OAuth credentials.
pub trait CredentialRepository: Send + Sync {
    /// Create the credentials table if it doesn't already exist.
    fn init_schema(&self) -> BoxFuture<'_, (), DbError>;

    /// Upsert the credential for (user, provider).
    ///
    /// A second call replaces the prior secrets and bumps `updated_at`.
    /// Concurrent token refreshes may race; last-write-wins is correct since
    /// both writers hold valid credentials.
    fn store(
        &self,
        user_id: &str,
        provider: &str,
        refresh_secret: &str,
        access_secret: Option<&str>,
        access_expiry: Option<DateTime<Utc>>,
    ) -> BoxFuture<'_, (), DbError>;

    /// Decrypt and return the refresh secret, or `None` when the user has no
    /// usable credential (absent row or undecryptable blob).
    fn refresh_secret(&self, user_id: &str, provider: &str) -> BoxFuture<'_, Option<String>, DbError>;

    /// Whether a credential row exists for (user, provider).
    fn has_credential(&self, user_id: &str, provider: &str) -> BoxFuture<'_, bool, DbError>;

    /// Delete the credential. Returns whether a row was removed.
    fn delete(&self, user_id: &str, provider: &str) -> BoxFuture<'_, bool, DbError>;
}
