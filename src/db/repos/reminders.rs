use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::error::DbResult, models::DeletionReminder};

#[async_trait]
pub trait ReminderRepo: Send + Sync {
    /// Record that the reminder for `(account_id, days_before)` was sent.
    ///
    /// Returns `DbError::Conflict` if an entry for the pair already exists.
    /// Callers treat that as "already sent elsewhere, skip", not as a
    /// failure.
    async fn record(&self, account_id: Uuid, days_before: u32) -> DbResult<DeletionReminder>;

    async fn exists(&self, account_id: Uuid, days_before: u32) -> DbResult<bool>;

    async fn list_for_account(&self, account_id: Uuid) -> DbResult<Vec<DeletionReminder>>;
}
