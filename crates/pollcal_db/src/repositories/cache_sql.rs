//! SQL implementation of the availability cache.

use crate::error::DbError;
use crate::repositories::cache::AvailabilityCacheRepository;
use crate::DbClient;
use chrono::Utc;
use pollcal_common::services::BoxFuture;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the availability cache.
#[derive(Debug, Clone)]
pub struct SqlAvailabilityCacheRepository {
    db_client: DbClient,
}

impl SqlAvailabilityCacheRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl AvailabilityCacheRepository for SqlAvailabilityCacheRepository {
    fn init_schema(&self) -> BoxFuture<'_, (), DbError> {
        Box::pin(async move {
            debug!("Initializing availability cache schema");

            let query = r#"
                CREATE TABLE IF NOT EXISTS availability_cache (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    poll_id TEXT NOT NULL,
                    slot_id TEXT NOT NULL,
                    busy INTEGER NOT NULL,
                    cached_at INTEGER NOT NULL,
                    UNIQUE(user_id, slot_id)
                )
            "#;

            self.db_client.execute(query).await?;
            Ok(())
        })
    }

    fn get(
        &self,
        user_id: &str,
        slot_id: &str,
        ttl_secs: i64,
    ) -> BoxFuture<'_, Option<bool>, DbError> {
        let user_id = user_id.to_string();
        let slot_id = slot_id.to_string();

        Box::pin(async move {
            let row = sqlx::query(
                "SELECT busy, cached_at FROM availability_cache WHERE user_id = $1 AND slot_id = $2",
            )
            .bind(&user_id)
            .bind(&slot_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            let Some(row) = row else {
                return Ok(None);
            };

            let cached_at: i64 = row
                .try_get("cached_at")
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            // Staleness is judged lazily: an expired row is a miss and gets
            // overwritten by the next write-through.
            if Utc::now().timestamp() - cached_at >= ttl_secs {
                return Ok(None);
            }

            let busy: i64 = row
                .try_get("busy")
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            Ok(Some(busy != 0))
        })
    }

    fn set(
        &self,
        user_id: &str,
        poll_id: &str,
        slot_id: &str,
        busy: bool,
    ) -> BoxFuture<'_, (), DbError> {
        let user_id = user_id.to_string();
        let poll_id = poll_id.to_string();
        let slot_id = slot_id.to_string();

        Box::pin(async move {
            let now = Utc::now().timestamp();

            let existing = sqlx::query(
                "SELECT id FROM availability_cache WHERE user_id = $1 AND slot_id = $2",
            )
            .bind(&user_id)
            .bind(&slot_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            if existing.is_some() {
                let query = r#"
                    UPDATE availability_cache
                    SET poll_id = $1, busy = $2, cached_at = $3
                    WHERE user_id = $4 AND slot_id = $5
                "#;

                sqlx::query(query)
                    .bind(&poll_id)
                    .bind(busy as i64)
                    .bind(now)
                    .bind(&user_id)
                    .bind(&slot_id)
                    .execute(self.db_client.pool())
                    .await
                    .map_err(|e| {
                        error!("Failed to refresh availability cache entry: {}", e);
                        DbError::QueryError(e.to_string())
                    })?;
            } else {
                let query = r#"
                    INSERT INTO availability_cache (user_id, poll_id, slot_id, busy, cached_at)
                    VALUES ($1, $2, $3, $4, $5)
                "#;

                sqlx::query(query)
                    .bind(&user_id)
                    .bind(&poll_id)
                    .bind(&slot_id)
                    .bind(busy as i64)
                    .bind(now)
                    .execute(self.db_client.pool())
                    .await
                    .map_err(|e| {
                        error!("Failed to insert availability cache entry: {}", e);
                        DbError::QueryError(e.to_string())
                    })?;
            }

            Ok(())
        })
    }

    fn invalidate_for_user(&self, user_id: &str) -> BoxFuture<'_, u64, DbError> {
        let user_id = user_id.to_string();

        Box::pin(async move {
            debug!("Invalidating availability cache for user: {}", user_id);

            let result = sqlx::query("DELETE FROM availability_cache WHERE user_id = $1")
                .bind(&user_id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            Ok(result.rows_affected())
        })
    }
}
