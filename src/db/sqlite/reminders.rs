use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ReminderRepo,
    },
    models::DeletionReminder,
};

pub struct SqliteReminderRepo {
    pool: SqlitePool,
}

impl SqliteReminderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRepo for SqliteReminderRepo {
    async fn record(&self, account_id: Uuid, days_before: u32) -> DbResult<DeletionReminder> {
        let id = Uuid::new_v4();
        let sent_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO deletion_reminders (id, account_id, days_before, sent_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(account_id.to_string())
        .bind(days_before as i64)
        .bind(sent_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict(format!(
                    "Reminder for account {} at {} days already recorded",
                    account_id, days_before
                ))
            }
            _ => DbError::from(e),
        })?;

        Ok(DeletionReminder {
            id,
            account_id,
            days_before: days_before as i64,
            sent_at,
        })
    }

    async fn exists(&self, account_id: Uuid, days_before: u32) -> DbResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present FROM deletion_reminders
            WHERE account_id = ? AND days_before = ?
            "#,
        )
        .bind(account_id.to_string())
        .bind(days_before as i64)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn list_for_account(&self, account_id: Uuid) -> DbResult<Vec<DeletionReminder>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, days_before, sent_at
            FROM deletion_reminders
            WHERE account_id = ?
            ORDER BY days_before DESC
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DeletionReminder {
                    id: parse_uuid(&row.get::<String, _>("id"))?,
                    account_id: parse_uuid(&row.get::<String, _>("account_id"))?,
                    days_before: row.get("days_before"),
                    sent_at: row.get("sent_at"),
                })
            })
            .collect()
    }
}
