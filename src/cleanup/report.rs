use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate outcome of one cleanup run. Returned to the caller and logged,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub reminders_sent: u64,
    /// Reminders sent per window offset. Keys serialize as strings in JSON.
    pub reminder_breakdown: BTreeMap<u32, u64>,
    pub accounts_deleted: u64,
    pub stripe_subscriptions_cancelled: u64,
    pub errors: Vec<String>,
    pub dry_run: bool,
}

impl RunReport {
    pub fn new(run_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            run_at,
            duration_ms: 0,
            reminders_sent: 0,
            reminder_breakdown: BTreeMap::new(),
            accounts_deleted: 0,
            stripe_subscriptions_cancelled: 0,
            errors: Vec::new(),
            dry_run,
        }
    }

    pub fn record_reminder(&mut self, window: u32) {
        self.reminders_sent += 1;
        *self.reminder_breakdown.entry(window).or_default() += 1;
    }

    pub fn record_deletion(&mut self) {
        self.accounts_deleted += 1;
    }

    pub fn record_cancellation(&mut self) {
        self.stripe_subscriptions_cancelled += 1;
    }

    pub fn record_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
