use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{AccountDeletionResult, AccountRepo, CreateAccount},
    },
    models::{Account, DeletionCandidate, ReminderCandidate, Subscription, SubscriptionStatus},
};

pub struct SqliteAccountRepo {
    pool: SqlitePool,
}

impl SqliteAccountRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepo for SqliteAccountRepo {
    async fn create(&self, input: CreateAccount) -> DbResult<Account> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, name, timezone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.email)
        .bind(&input.name)
        .bind(&input.timezone)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::Conflict(
                format!("Account with email '{}' already exists", input.email),
            ),
            _ => DbError::from(e),
        })?;

        if let Some(sub) = &input.subscription {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (
                    id, account_id, status, cancel_at_period_end, canceled_at,
                    grace_period_ends_at, deletion_scheduled_at,
                    stripe_subscription_id, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(id.to_string())
            .bind(sub.status.as_str())
            .bind(sub.cancel_at_period_end)
            .bind(sub.canceled_at)
            .bind(sub.grace_period_ends_at)
            .bind(sub.deletion_scheduled_at)
            .bind(&sub.stripe_subscription_id)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Account {
            id,
            email: input.email,
            name: input.name,
            timezone: input.timezone,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, timezone, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Account {
                id: parse_uuid(&row.get::<String, _>("id"))?,
                email: row.get("email"),
                name: row.get("name"),
                timezone: row.get("timezone"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
        })
        .transpose()
    }

    async fn get_subscription(&self, account_id: Uuid) -> DbResult<Option<Subscription>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, status, cancel_at_period_end, canceled_at,
                   grace_period_ends_at, deletion_scheduled_at,
                   stripe_subscription_id, created_at, updated_at
            FROM subscriptions
            WHERE account_id = ?
            "#,
        )
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let status: String = row.get("status");
            let status = SubscriptionStatus::parse(&status).ok_or_else(|| {
                DbError::Internal(format!("Invalid subscription status in database: {}", status))
            })?;
            Ok(Subscription {
                id: parse_uuid(&row.get::<String, _>("id"))?,
                account_id: parse_uuid(&row.get::<String, _>("account_id"))?,
                status,
                cancel_at_period_end: row.get("cancel_at_period_end"),
                canceled_at: row.get("canceled_at"),
                grace_period_ends_at: row.get("grace_period_ends_at"),
                deletion_scheduled_at: row.get("deletion_scheduled_at"),
                stripe_subscription_id: row.get("stripe_subscription_id"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
        })
        .transpose()
    }

    async fn list_due_for_reminder(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        days_before: u32,
    ) -> DbResult<Vec<ReminderCandidate>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.email, a.name, a.timezone, s.deletion_scheduled_at
            FROM accounts a
            INNER JOIN subscriptions s ON s.account_id = a.id
            WHERE s.deletion_scheduled_at IS NOT NULL
              AND s.deletion_scheduled_at >= ?
              AND s.deletion_scheduled_at < ?
              AND NOT EXISTS (
                  SELECT 1 FROM deletion_reminders r
                  WHERE r.account_id = a.id AND r.days_before = ?
              )
            ORDER BY s.deletion_scheduled_at, a.id
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(days_before as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ReminderCandidate {
                    id: parse_uuid(&row.get::<String, _>("id"))?,
                    email: row.get("email"),
                    name: row.get("name"),
                    timezone: row.get("timezone"),
                    deletion_scheduled_at: row.get("deletion_scheduled_at"),
                })
            })
            .collect()
    }

    async fn list_due_for_deletion(&self, now: DateTime<Utc>) -> DbResult<Vec<DeletionCandidate>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, s.stripe_subscription_id, s.deletion_scheduled_at
            FROM accounts a
            INNER JOIN subscriptions s ON s.account_id = a.id
            WHERE s.deletion_scheduled_at IS NOT NULL
              AND s.deletion_scheduled_at <= ?
            ORDER BY s.deletion_scheduled_at, a.id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DeletionCandidate {
                    id: parse_uuid(&row.get::<String, _>("id"))?,
                    stripe_subscription_id: row.get("stripe_subscription_id"),
                    deletion_scheduled_at: row.get("deletion_scheduled_at"),
                })
            })
            .collect()
    }

    async fn delete_with_reminders(&self, account_id: Uuid) -> DbResult<AccountDeletionResult> {
        let account_id_str = account_id.to_string();
        let mut result = AccountDeletionResult::default();

        let mut tx = self.pool.begin().await?;

        let reminders = sqlx::query("DELETE FROM deletion_reminders WHERE account_id = ?")
            .bind(&account_id_str)
            .execute(&mut *tx)
            .await?;
        result.reminders_deleted = reminders.rows_affected();

        let subscription = sqlx::query("DELETE FROM subscriptions WHERE account_id = ?")
            .bind(&account_id_str)
            .execute(&mut *tx)
            .await?;
        result.subscription_deleted = subscription.rows_affected() > 0;

        let account = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(&account_id_str)
            .execute(&mut *tx)
            .await?;

        if account.rows_affected() == 0 {
            // Rolls back the ledger and subscription deletes on drop.
            return Err(DbError::NotFound);
        }
        result.account_deleted = true;

        tx.commit().await?;
        Ok(result)
    }
}
