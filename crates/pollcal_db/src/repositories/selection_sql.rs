//! SQL implementation of the calendar selection store.

use crate::error::DbError;
use crate::repositories::selection::SelectionRepository;
use crate::DbClient;
use chrono::Utc;
use pollcal_common::models::CalendarSelection;
use pollcal_common::services::BoxFuture;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the calendar selection store.
#[derive(Debug, Clone)]
pub struct SqlSelectionRepository {
    db_client: DbClient,
}

impl SqlSelectionRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl SelectionRepository for SqlSelectionRepository {
    fn init_schema(&self) -> BoxFuture<'_, (), DbError> {
        Box::pin(async move {
            debug!("Initializing calendar selection schema");

            let query = r#"
                CREATE TABLE IF NOT EXISTS calendar_selections (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    calendar_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    selected INTEGER NOT NULL,
                    tentative_as_busy INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    UNIQUE(user_id, calendar_id)
                )
            "#;

            self.db_client.execute(query).await?;
            Ok(())
        })
    }

    fn selected_ids(&self, user_id: &str) -> BoxFuture<'_, Vec<String>, DbError> {
        let user_id = user_id.to_string();

        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT calendar_id FROM calendar_selections WHERE user_id = $1 AND selected = 1 ORDER BY id",
            )
            .bind(&user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            rows.into_iter()
                .map(|row| {
                    row.try_get::<String, _>("calendar_id")
                        .map_err(|e| DbError::QueryError(e.to_string()))
                })
                .collect()
        })
    }

    fn tentative_as_busy(&self, user_id: &str) -> BoxFuture<'_, bool, DbError> {
        let user_id = user_id.to_string();

        Box::pin(async move {
            let row = sqlx::query(
                "SELECT tentative_as_busy FROM calendar_selections WHERE user_id = $1 ORDER BY id LIMIT 1",
            )
            .bind(&user_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            match row {
                Some(row) => {
                    let flag: i64 = row
                        .try_get("tentative_as_busy")
                        .map_err(|e| DbError::QueryError(e.to_string()))?;
                    Ok(flag != 0)
                }
                // Unset means tentative counts as busy.
                None => Ok(true),
            }
        })
    }

    fn save_selections(
        &self,
        user_id: &str,
        selections: &[CalendarSelection],
    ) -> BoxFuture<'_, (), DbError> {
        let user_id = user_id.to_string();
        let selections = selections.to_vec();

        Box::pin(async move {
            debug!(
                "Saving {} calendar selections for user: {}",
                selections.len(),
                user_id
            );

            // The policy flag is user-level: the value from the incoming rows
            // is written to every row touched.
            let tentative_as_busy = selections
                .first()
                .map(|s| s.tentative_as_busy)
                .unwrap_or(true);
            let now = Utc::now().timestamp();

            for selection in &selections {
                let existing = sqlx::query(
                    "SELECT id FROM calendar_selections WHERE user_id = $1 AND calendar_id = $2",
                )
                .bind(&user_id)
                .bind(&selection.calendar_id)
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;

                if existing.is_some() {
                    let query = r#"
                        UPDATE calendar_selections
                        SET name = $1, selected = $2, tentative_as_busy = $3, updated_at = $4
                        WHERE user_id = $5 AND calendar_id = $6
                    "#;

                    sqlx::query(query)
                        .bind(&selection.name)
                        .bind(selection.selected as i64)
                        .bind(tentative_as_busy as i64)
                        .bind(now)
                        .bind(&user_id)
                        .bind(&selection.calendar_id)
                        .execute(self.db_client.pool())
                        .await
                        .map_err(|e| {
                            error!("Failed to update calendar selection: {}", e);
                            DbError::QueryError(e.to_string())
                        })?;
                } else {
                    let query = r#"
                        INSERT INTO calendar_selections
                            (user_id, calendar_id, name, selected, tentative_as_busy, updated_at)
                        VALUES ($1, $2, $3, $4, $5, $6)
                    "#;

                    sqlx::query(query)
                        .bind(&user_id)
                        .bind(&selection.calendar_id)
                        .bind(&selection.name)
                        .bind(selection.selected as i64)
                        .bind(tentative_as_busy as i64)
                        .bind(now)
                        .execute(self.db_client.pool())
                        .await
                        .map_err(|e| {
                            error!("Failed to insert calendar selection: {}", e);
                            DbError::QueryError(e.to_string())
                        })?;
                }
            }

            Ok(())
        })
    }

    fn delete_for_user(&self, user_id: &str) -> BoxFuture<'_, u64, DbError> {
        let user_id = user_id.to_string();

        Box::pin(async move {
            debug!("Deleting calendar selections for user: {}", user_id);

            let result = sqlx::query("DELETE FROM calendar_selections WHERE user_id = $1")
                .bind(&user_id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            Ok(result.rows_affected())
        })
    }
}
