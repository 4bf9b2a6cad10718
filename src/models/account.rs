use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// IANA timezone name used when formatting dates in outbound email.
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An account eligible for a reminder in one window bucket.
///
/// Joined row from `accounts` and `subscriptions`; `deletion_scheduled_at`
/// is nullable here to tolerate a stale read between the scan and the
/// dispatch (such a row is skipped, not an error).
#[derive(Debug, Clone)]
pub struct ReminderCandidate {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub timezone: Option<String>,
    pub deletion_scheduled_at: Option<DateTime<Utc>>,
}

/// An account whose grace period has fully elapsed.
#[derive(Debug, Clone)]
pub struct DeletionCandidate {
    pub id: Uuid,
    pub stripe_subscription_id: Option<String>,
    pub deletion_scheduled_at: DateTime<Utc>,
}
