use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{Account, DeletionCandidate, ReminderCandidate, Subscription, SubscriptionStatus},
};

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn create(&self, input: CreateAccount) -> DbResult<Account>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Account>>;
    async fn get_subscription(&self, account_id: Uuid) -> DbResult<Option<Subscription>>;

    /// Accounts whose scheduled deletion falls in `[start, end)` and which
    /// have no ledger entry yet for `days_before`. The ledger check is only a
    /// pre-filter; the unique constraint on the ledger table is what finally
    /// guarantees single delivery.
    async fn list_due_for_reminder(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        days_before: u32,
    ) -> DbResult<Vec<ReminderCandidate>>;

    /// Accounts whose scheduled deletion is at or before `now` (inclusive).
    async fn list_due_for_deletion(&self, now: DateTime<Utc>) -> DbResult<Vec<DeletionCandidate>>;

    /// Permanently delete an account together with its subscription row and
    /// reminder ledger entries, as one transaction. Either everything is
    /// removed or nothing is.
    async fn delete_with_reminders(&self, account_id: Uuid) -> DbResult<AccountDeletionResult>;
}

/// Input for creating an account, optionally with an attached subscription.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub email: String,
    pub name: String,
    pub timezone: Option<String>,
    pub subscription: Option<CreateSubscription>,
}

/// Subscription state to attach at account creation.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub status: SubscriptionStatus,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub grace_period_ends_at: Option<DateTime<Utc>>,
    pub deletion_scheduled_at: Option<DateTime<Utc>>,
    pub stripe_subscription_id: Option<String>,
}

/// Result of a permanent account deletion.
#[derive(Debug, Clone, Default)]
pub struct AccountDeletionResult {
    /// Number of reminder ledger entries deleted.
    pub reminders_deleted: u64,
    /// Whether a subscription row was deleted.
    pub subscription_deleted: bool,
    /// Whether the account row was deleted.
    pub account_deleted: bool,
}
