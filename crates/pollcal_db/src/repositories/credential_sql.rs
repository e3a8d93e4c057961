//! SQL implementation of the credential vault.

use crate::error::DbError;
use crate::repositories::credential::CredentialRepository;
use crate::DbClient;
use chrono::{DateTime, Utc};
use pollcal_common::services::BoxFuture;
use pollcal_config::EncryptionKey;
use sqlx::Row;
use tracing::{debug, error, warn};

/// SQL credential vault sealing secrets with the supplied key.
#[derive(Debug, Clone)]
pub struct SqlCredentialRepository {
    db_client: DbClient,
    key: EncryptionKey,
}

impl SqlCredentialRepository {
    pub fn new(db_client: DbClient, key: EncryptionKey) -> Self {
        Self { db_client, key }
    }
}

impl CredentialRepository for SqlCredentialRepository {
    fn init_schema(&self) -> BoxFuture<'_, (), DbError> {
        Box::pin(async move {
            debug!("Initializing calendar credential schema");

            let query = r#"
                CREATE TABLE IF NOT EXISTS calendar_credentials (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    provider TEXT NOT NULL,
                    refresh_secret TEXT NOT NULL,
                    access_secret TEXT,
                    access_expiry INTEGER,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    UNIQUE(user_id, provider)
                )
            "#;

            self.db_client.execute(query).await?;
            Ok(())
        })
    }

    fn store(
        &self,
        user_id: &str,
        provider: &str,
        refresh_secret: &str,
        access_secret: Option<&str>,
        access_expiry: Option<DateTime<Utc>>,
    ) -> BoxFuture<'_, (), DbError> {
        let user_id = user_id.to_string();
        let provider = provider.to_string();
        let refresh_secret = refresh_secret.to_string();
        let access_secret = access_secret.map(|s| s.to_string());

        Box::pin(async move {
            debug!("Storing calendar credential for user: {}", user_id);

            let sealed_refresh = self
                .key
                .seal(&refresh_secret)
                .map_err(|e| DbError::EncryptionError(e.to_string()))?;
            let sealed_access = match access_secret.as_deref() {
                Some(secret) => Some(
                    self.key
                        .seal(secret)
                        .map_err(|e| DbError::EncryptionError(e.to_string()))?,
                ),
                None => None,
            };
            let expiry_ts = access_expiry.map(|dt| dt.timestamp());
            let now = Utc::now().timestamp();

            let existing = sqlx::query(
                "SELECT id FROM calendar_credentials WHERE user_id = $1 AND provider = $2",
            )
            .bind(&user_id)
            .bind(&provider)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            if existing.is_some() {
                let query = r#"
                    UPDATE calendar_credentials
                    SET refresh_secret = $1, access_secret = $2, access_expiry = $3, updated_at = $4
                    WHERE user_id = $5 AND provider = $6
                "#;

                sqlx::query(query)
                    .bind(&sealed_refresh)
                    .bind(&sealed_access)
                    .bind(expiry_ts)
                    .bind(now)
                    .bind(&user_id)
                    .bind(&provider)
                    .execute(self.db_client.pool())
                    .await
                    .map_err(|e| {
                        error!("Failed to update calendar credential: {}", e);
                        DbError::QueryError(e.to_string())
                    })?;
            } else {
                let query = r#"
                    INSERT INTO calendar_credentials
                        (user_id, provider, refresh_secret, access_secret, access_expiry, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#;

                sqlx::query(query)
                    .bind(&user_id)
                    .bind(&provider)
                    .bind(&sealed_refresh)
                    .bind(&sealed_access)
                    .bind(expiry_ts)
                    .bind(now)
                    .bind(now)
                    .execute(self.db_client.pool())
                    .await
                    .map_err(|e| {
                        error!("Failed to insert calendar credential: {}", e);
                        DbError::QueryError(e.to_string())
                    })?;
            }

            Ok(())
        })
    }

    fn refresh_secret(
        &self,
        user_id: &str,
        provider: &str,
    ) -> BoxFuture<'_, Option<String>, DbError> {
        let user_id = user_id.to_string();
        let provider = provider.to_string();

        Box::pin(async move {
            let row = sqlx::query(
                "SELECT refresh_secret FROM calendar_credentials WHERE user_id = $1 AND provider = $2",
            )
            .bind(&user_id)
            .bind(&provider)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            let Some(row) = row else {
                return Ok(None);
            };
            let sealed: String = row
                .try_get("refresh_secret")
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            match self.key.open(&sealed) {
                Ok(secret) => Ok(Some(secret)),
                Err(e) => {
                    // Treated the same as never connected.
                    warn!(
                        "Stored refresh secret for user {} failed to decrypt: {}",
                        user_id, e
                    );
                    Ok(None)
                }
            }
        })
    }

    fn has_credential(&self, user_id: &str, provider: &str) -> BoxFuture<'_, bool, DbError> {
        let user_id = user_id.to_string();
        let provider = provider.to_string();

        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id FROM calendar_credentials WHERE user_id = $1 AND provider = $2",
            )
            .bind(&user_id)
            .bind(&provider)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            Ok(row.is_some())
        })
    }

    fn delete(&self, user_id: &str, provider: &str) -> BoxFuture<'_, bool, DbError> {
        let user_id = user_id.to_string();
        let provider = provider.to_string();

        Box::pin(async move {
            debug!("Deleting calendar credential for user: {}", user_id);

            let result = sqlx::query(
                "DELETE FROM calendar_credentials WHERE user_id = $1 AND provider = $2",
            )
            .bind(&user_id)
            .bind(&provider)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            Ok(result.rows_affected() > 0)
        })
    }
}
