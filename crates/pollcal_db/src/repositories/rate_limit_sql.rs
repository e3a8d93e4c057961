//! SQL implementation of the sliding-window rate limiter.

use crate::error::DbError;
use crate::repositories::rate_limit::{RateLimiterRepository, RATE_WINDOW_SECS};
use crate::DbClient;
use chrono::Utc;
use pollcal_common::services::BoxFuture;
use sqlx::Row;
use tracing::debug;

/// SQL implementation of the sliding-window rate limiter.
///
/// The purge, count and insert run inside one transaction so concurrent
/// checks on the same key serialize at the database.
#[derive(Debug, Clone)]
pub struct SqlRateLimiterRepository {
    db_client: DbClient,
}

impl SqlRateLimiterRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl RateLimiterRepository for SqlRateLimiterRepository {
    fn init_schema(&self) -> BoxFuture<'_, (), DbError> {
        Box::pin(async move {
            debug!("Initializing rate window schema");

            self.db_client
                .execute(
                    r#"
                    CREATE TABLE IF NOT EXISTS rate_windows (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        window_key TEXT NOT NULL,
                        event_at INTEGER NOT NULL
                    )
                "#,
                )
                .await?;

            self.db_client
                .execute(
                    "CREATE INDEX IF NOT EXISTS idx_rate_windows_key ON rate_windows (window_key, event_at)",
                )
                .await?;

            Ok(())
        })
    }

    fn check(&self, key: &str, max_per_window: u32) -> BoxFuture<'_, bool, DbError> {
        let key = key.to_string();

        Box::pin(async move {
            let now = Utc::now().timestamp();
            let cutoff = now - RATE_WINDOW_SECS;

            let mut tx = self.db_client.begin().await?;

            sqlx::query("DELETE FROM rate_windows WHERE window_key = $1 AND event_at <= $2")
                .bind(&key)
                .bind(cutoff)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            let row = sqlx::query("SELECT COUNT(*) AS n FROM rate_windows WHERE window_key = $1")
                .bind(&key)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            let count: i64 = row
                .try_get("n")
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            let allowed = count < i64::from(max_per_window);
            if allowed {
                sqlx::query("INSERT INTO rate_windows (window_key, event_at) VALUES ($1, $2)")
                    .bind(&key)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| DbError::QueryError(e.to_string()))?;
            } else {
                debug!("Rate limit hit for key: {}", key);
            }

            tx.commit()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;

            Ok(allowed)
        })
    }
}
