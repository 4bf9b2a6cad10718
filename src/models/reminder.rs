use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry recording that one reminder window was delivered for one
/// account. At most one row per (account, window) pair ever exists; the
/// unique constraint on the table is what makes the reminder phase
/// idempotent across repeated runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionReminder {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Day offset before scheduled deletion; `0` is the final-day window.
    pub days_before: i64,
    pub sent_at: DateTime<Utc>,
}
