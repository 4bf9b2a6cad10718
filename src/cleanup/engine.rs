use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};

use super::{RunReport, window_bounds};
use crate::{
    billing::{BillingClient, BillingError},
    config::CleanupConfig,
    db::{AccountRepo, DbError, ReminderRepo},
    email::{Mailer, OutboundEmail, templates},
    models::{DeletionCandidate, ReminderCandidate},
};

/// Runs one cleanup pass: the reminder phase across all configured windows,
/// then the deletion phase.
///
/// Failures never escape a candidate: every error is recorded in the run
/// report with the offending id and processing continues with the next
/// candidate. Cross-run idempotency comes entirely from the reminder ledger
/// and the persisted deletion schedule; the engine holds no state between
/// runs.
pub struct CleanupEngine {
    accounts: Arc<dyn AccountRepo>,
    reminders: Arc<dyn ReminderRepo>,
    mailer: Arc<dyn Mailer>,
    billing: Option<Arc<dyn BillingClient>>,
    config: CleanupConfig,
}

impl CleanupEngine {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        reminders: Arc<dyn ReminderRepo>,
        mailer: Arc<dyn Mailer>,
        billing: Option<Arc<dyn BillingClient>>,
        config: CleanupConfig,
    ) -> Self {
        Self {
            accounts,
            reminders,
            mailer,
            billing,
            config,
        }
    }

    pub async fn run(&self) -> RunReport {
        self.run_with_now(Utc::now()).await
    }

    /// Run one pass against an explicit notion of "now". Lets tests pin the
    /// clock; production callers go through [`run`](Self::run).
    #[tracing::instrument(skip_all, fields(dry_run = self.config.dry_run))]
    pub async fn run_with_now(&self, now: DateTime<Utc>) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::new(now, self.config.dry_run);

        self.reminder_phase(now, &mut report).await;
        self.deletion_phase(now, &mut report).await;

        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            reminders_sent = report.reminders_sent,
            accounts_deleted = report.accounts_deleted,
            subscriptions_cancelled = report.stripe_subscriptions_cancelled,
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "Cleanup run finished"
        );
        report
    }

    async fn reminder_phase(&self, now: DateTime<Utc>, report: &mut RunReport) {
        for &window in &self.config.reminder_windows {
            let bounds = window_bounds(now, window);
            let candidates = match self
                .accounts
                .list_due_for_reminder(bounds.start, bounds.end, window)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    // One window's scan failure must not abort the others.
                    tracing::error!(window, error = %e, "Reminder window scan failed");
                    report.record_error(format!(
                        "Failed to scan reminder window {}: {}",
                        window, e
                    ));
                    continue;
                }
            };

            tracing::debug!(window, candidates = candidates.len(), "Scanned reminder window");
            for candidate in candidates {
                self.send_reminder(&candidate, window, report).await;
            }
        }
    }

    async fn send_reminder(
        &self,
        candidate: &ReminderCandidate,
        window: u32,
        report: &mut RunReport,
    ) {
        // Stale reads are skipped silently, not counted as errors.
        let Some(deletion_scheduled_at) = candidate.deletion_scheduled_at else {
            tracing::debug!(account_id = %candidate.id, "Skipping reminder: no deletion scheduled");
            return;
        };
        if candidate.email.is_empty() {
            tracing::debug!(account_id = %candidate.id, "Skipping reminder: no email address");
            return;
        }

        let rendered = templates::render_deletion_reminder(&templates::ReminderEmailContext {
            name: &candidate.name,
            app_name: &self.config.app_name,
            days_before: window,
            deletion_scheduled_at,
            timezone: candidate.timezone.as_deref(),
            reactivation_url: &self.config.reactivation_url(),
            grace_period_days: self.config.grace_period_days,
        });

        if self.config.dry_run {
            tracing::info!(
                account_id = %candidate.id,
                window,
                "Dry run: would send deletion reminder"
            );
            report.record_reminder(window);
            return;
        }

        if let Err(e) = self
            .mailer
            .send(OutboundEmail {
                to: candidate.email.clone(),
                subject: rendered.subject,
                html: rendered.html,
                text: rendered.text,
            })
            .await
        {
            report.record_error(format!(
                "Failed to send reminder to user {}: {}",
                candidate.id, e
            ));
            return;
        }

        // Ledger write comes strictly after a confirmed send. A conflicting
        // write means a concurrent run already delivered this window; the
        // send above still happened, so it counts.
        match self.reminders.record(candidate.id, window).await {
            Ok(_) => {}
            Err(DbError::Conflict(_)) => {
                tracing::warn!(
                    account_id = %candidate.id,
                    window,
                    "Reminder ledger entry already recorded by a concurrent run"
                );
            }
            Err(e) => {
                report.record_error(format!(
                    "Failed to send reminder to user {}: {}",
                    candidate.id, e
                ));
                return;
            }
        }

        tracing::info!(account_id = %candidate.id, window, "Sent deletion reminder");
        report.record_reminder(window);
    }

    async fn deletion_phase(&self, now: DateTime<Utc>, report: &mut RunReport) {
        let candidates = match self.accounts.list_due_for_deletion(now).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(error = %e, "Deletion scan failed");
                report.record_error(format!("Failed to scan accounts due for deletion: {}", e));
                return;
            }
        };

        tracing::debug!(candidates = candidates.len(), "Scanned deletion candidates");
        for candidate in candidates {
            self.delete_account(&candidate, report).await;
        }
    }

    async fn delete_account(&self, candidate: &DeletionCandidate, report: &mut RunReport) {
        // Billing reconciliation failures are recorded but never block the
        // deletion itself: the grace period contract promises deletion at a
        // fixed time regardless of billing-system availability.
        if let Some(subscription_id) = &candidate.stripe_subscription_id {
            match self.reconcile_billing(subscription_id).await {
                Ok(true) => report.record_cancellation(),
                Ok(false) => {}
                Err(e) => {
                    report.record_error(format!(
                        "Failed to cancel subscription {} for user {}: {}",
                        subscription_id, candidate.id, e
                    ));
                }
            }
        }

        if self.config.dry_run {
            tracing::info!(account_id = %candidate.id, "Dry run: would delete account");
            report.record_deletion();
            return;
        }

        match self.accounts.delete_with_reminders(candidate.id).await {
            Ok(result) => {
                tracing::info!(
                    account_id = %candidate.id,
                    scheduled_for = %candidate.deletion_scheduled_at,
                    reminders_deleted = result.reminders_deleted,
                    "Permanently deleted account"
                );
                report.record_deletion();
            }
            Err(e) => {
                report.record_error(format!("Failed to delete user {}: {}", candidate.id, e));
            }
        }
    }

    /// Idempotently ensure the remote subscription is canceled. Returns
    /// whether a cancel was issued (or would have been, in dry run).
    async fn reconcile_billing(&self, subscription_id: &str) -> Result<bool, BillingError> {
        let billing = self.billing.as_ref().ok_or(BillingError::NotConfigured)?;

        let remote = billing.retrieve_subscription(subscription_id).await?;
        if remote.status.is_canceled() {
            tracing::debug!(subscription_id, "Remote subscription already canceled");
            return Ok(false);
        }

        if self.config.dry_run {
            tracing::info!(subscription_id, "Dry run: would cancel remote subscription");
            return Ok(true);
        }

        billing.cancel_subscription(subscription_id).await?;
        tracing::info!(subscription_id, "Canceled remote subscription");
        Ok(true)
    }
}
