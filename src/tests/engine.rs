//! Engine behavior tests: idempotent reminders, inclusive deletion scans,
//! billing reconciliation, and partial-failure handling.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::mocks::{FlakyAccountRepo, MockBilling, MockMailer};
use crate::{
    billing::RemoteSubscriptionStatus,
    cleanup::CleanupEngine,
    config::CleanupConfig,
    db::{
        AccountRepo, CreateAccount, ReminderRepo,
        sqlite::{SqliteAccountRepo, SqliteReminderRepo},
        tests::{create_test_pool, scheduled_subscription},
    },
    models::Account,
};

struct Harness {
    accounts: Arc<dyn AccountRepo>,
    reminders: Arc<dyn ReminderRepo>,
    mailer: Arc<MockMailer>,
    billing: Arc<MockBilling>,
}

impl Harness {
    async fn new() -> Self {
        let pool = create_test_pool().await;
        Self {
            accounts: Arc::new(SqliteAccountRepo::new(pool.clone())),
            reminders: Arc::new(SqliteReminderRepo::new(pool)),
            mailer: Arc::new(MockMailer::default()),
            billing: Arc::new(MockBilling::default()),
        }
    }

    fn engine(&self, windows: Vec<u32>) -> CleanupEngine {
        self.engine_with(CleanupConfig {
            reminder_windows: windows,
            ..Default::default()
        })
    }

    fn engine_with(&self, config: CleanupConfig) -> CleanupEngine {
        CleanupEngine::new(
            self.accounts.clone(),
            self.reminders.clone(),
            self.mailer.clone(),
            Some(self.billing.clone()),
            config,
        )
    }

    async fn seed(
        &self,
        email: &str,
        deletion_scheduled_at: Option<DateTime<Utc>>,
        subscription_id: Option<&str>,
    ) -> Account {
        self.accounts
            .create(CreateAccount {
                email: email.to_string(),
                name: "Test User".to_string(),
                timezone: None,
                subscription: Some(scheduled_subscription(
                    deletion_scheduled_at,
                    subscription_id,
                )),
            })
            .await
            .expect("seed account")
    }
}

#[tokio::test]
async fn test_reminder_sent_once_across_repeated_runs() {
    let h = Harness::new().await;
    let now = Utc::now();
    let account = h
        .seed("once@example.com", Some(now + Duration::hours(156)), None)
        .await; // 6.5 days out: inside the 7-day bucket only

    let engine = h.engine(vec![7, 3, 1, 0]);
    let report = engine.run_with_now(now).await;
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.reminder_breakdown.get(&7), Some(&1));
    assert!(report.errors.is_empty());

    // Invoking again while the account stays in the same bucket sends nothing.
    for _ in 0..3 {
        let report = engine.run_with_now(now).await;
        assert_eq!(report.reminders_sent, 0);
    }
    assert_eq!(h.mailer.sent_to("once@example.com"), 1);
    let ledger = h.reminders.list_for_account(account.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].days_before, 7);
}

#[tokio::test]
async fn test_final_day_covers_both_zero_and_one_windows() {
    let h = Harness::new().await;
    let now = Utc::now();
    h.seed("final@example.com", Some(now + Duration::hours(12)), None)
        .await;

    // The 1-day and 0-day buckets are both [now, now + 1d); an account in
    // its last day is eligible for each window once.
    let engine = h.engine(vec![7, 1, 0]);
    let report = engine.run_with_now(now).await;
    assert_eq!(report.reminders_sent, 2);
    assert_eq!(report.reminder_breakdown.get(&1), Some(&1));
    assert_eq!(report.reminder_breakdown.get(&0), Some(&1));

    let report = engine.run_with_now(now).await;
    assert_eq!(report.reminders_sent, 0);

    let subjects: Vec<String> = h
        .mailer
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.subject.clone())
        .collect();
    assert!(subjects.iter().any(|s| s.contains("less than 24 hours")));
    assert!(subjects.iter().any(|s| s.contains("1 day")));
}

#[tokio::test]
async fn test_account_without_schedule_is_never_touched() {
    let h = Harness::new().await;
    let now = Utc::now();
    let account = h.seed("idle@example.com", None, Some("sub_idle")).await;

    let report = h.engine(vec![7, 3, 1, 0]).run_with_now(now).await;
    assert_eq!(report.reminders_sent, 0);
    assert_eq!(report.accounts_deleted, 0);
    assert!(report.errors.is_empty());
    assert!(h.accounts.get_by_id(account.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_send_failure_does_not_abort_siblings() {
    let h = Harness::new().await;
    let now = Utc::now();
    let bad = h
        .seed("bad@example.com", Some(now + Duration::hours(150)), None)
        .await;
    let good = h
        .seed("good@example.com", Some(now + Duration::hours(155)), None)
        .await;
    h.mailer.fail_for("bad@example.com");

    let engine = h.engine(vec![7]);
    let report = engine.run_with_now(now).await;

    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(
        report.errors[0].starts_with(&format!("Failed to send reminder to user {}", bad.id))
    );
    assert_eq!(h.mailer.sent_to("good@example.com"), 1);
    // No ledger entry was written for the failed send, so the next run
    // retries it.
    assert!(h.reminders.list_for_account(bad.id).await.unwrap().is_empty());
    assert_eq!(h.reminders.list_for_account(good.id).await.unwrap().len(), 1);

    h.mailer.recover("bad@example.com");
    let report = engine.run_with_now(now).await;
    assert_eq!(report.reminders_sent, 1);
    assert!(report.errors.is_empty());
    assert_eq!(h.mailer.sent_to("bad@example.com"), 1);
}

#[tokio::test]
async fn test_window_scan_failure_does_not_abort_other_windows() {
    let h = Harness::new().await;
    let now = Utc::now();
    h.seed("scan@example.com", Some(now + Duration::hours(60)), None)
        .await; // inside the 3-day bucket

    let flaky = Arc::new(FlakyAccountRepo::new(h.accounts.clone()));
    *flaky.fail_scan_window.lock().unwrap() = Some(7);
    let engine = CleanupEngine::new(
        flaky,
        h.reminders.clone(),
        h.mailer.clone(),
        Some(h.billing.clone()),
        CleanupConfig {
            reminder_windows: vec![7, 3],
            ..Default::default()
        },
    );

    let report = engine.run_with_now(now).await;
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.reminder_breakdown.get(&3), Some(&1));
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("window 7"));
}

#[tokio::test]
async fn test_deletion_boundary_is_inclusive() {
    let h = Harness::new().await;
    let now = Utc::now();
    let due = h.seed("due@example.com", Some(now), None).await;
    let not_yet = h
        .seed("notyet@example.com", Some(now + Duration::minutes(1)), None)
        .await;

    let report = h.engine(vec![7]).run_with_now(now).await;
    assert_eq!(report.accounts_deleted, 1);
    assert!(h.accounts.get_by_id(due.id).await.unwrap().is_none());
    assert!(h.accounts.get_by_id(not_yet.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_billing_failure_never_blocks_deletion() {
    let h = Harness::new().await;
    let now = Utc::now();
    let account = h
        .seed(
            "billing-down@example.com",
            Some(now - Duration::hours(2)),
            Some("sub_down"),
        )
        .await;
    h.billing.fail_for("sub_down");

    let report = h.engine(vec![7]).run_with_now(now).await;

    assert_eq!(report.accounts_deleted, 1);
    assert_eq!(report.stripe_subscriptions_cancelled, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with(&format!(
        "Failed to cancel subscription sub_down for user {}",
        account.id
    )));
    assert!(h.accounts.get_by_id(account.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_already_canceled_subscription_is_not_canceled_again() {
    let h = Harness::new().await;
    let now = Utc::now();
    let account = h
        .seed(
            "canceled@example.com",
            Some(now - Duration::hours(2)),
            Some("sub_123"),
        )
        .await;
    h.billing
        .set_status("sub_123", RemoteSubscriptionStatus::Canceled);

    let report = h.engine(vec![7]).run_with_now(now).await;

    assert!(h.billing.cancel_calls.lock().unwrap().is_empty());
    assert_eq!(report.stripe_subscriptions_cancelled, 0);
    assert_eq!(report.accounts_deleted, 1);
    assert!(report.errors.is_empty());
    assert!(h.accounts.get_by_id(account.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_active_subscription_is_canceled_before_deletion() {
    let h = Harness::new().await;
    let now = Utc::now();
    h.seed(
        "active@example.com",
        Some(now - Duration::days(1)),
        Some("sub_active"),
    )
    .await;

    let report = h.engine(vec![7]).run_with_now(now).await;

    assert_eq!(
        h.billing.cancel_calls.lock().unwrap().as_slice(),
        ["sub_active"]
    );
    assert_eq!(report.stripe_subscriptions_cancelled, 1);
    assert_eq!(report.accounts_deleted, 1);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_missing_billing_client_is_a_candidate_error() {
    let h = Harness::new().await;
    let now = Utc::now();
    let account = h
        .seed(
            "no-billing@example.com",
            Some(now - Duration::hours(1)),
            Some("sub_orphan"),
        )
        .await;

    let engine = CleanupEngine::new(
        h.accounts.clone(),
        h.reminders.clone(),
        h.mailer.clone(),
        None,
        CleanupConfig::default(),
    );
    let report = engine.run_with_now(now).await;

    assert_eq!(report.accounts_deleted, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("sub_orphan"));
    assert!(h.accounts.get_by_id(account.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_failure_leaves_account_fully_intact() {
    let h = Harness::new().await;
    let now = Utc::now();
    let account = h
        .seed("stuck@example.com", Some(now - Duration::hours(1)), None)
        .await;
    h.reminders.record(account.id, 7).await.unwrap();

    let flaky = Arc::new(FlakyAccountRepo::new(h.accounts.clone()));
    *flaky.fail_delete.lock().unwrap() = true;
    let engine = CleanupEngine::new(
        flaky,
        h.reminders.clone(),
        h.mailer.clone(),
        Some(h.billing.clone()),
        CleanupConfig::default(),
    );

    let report = engine.run_with_now(now).await;
    assert_eq!(report.accounts_deleted, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(
        report.errors[0].starts_with(&format!("Failed to delete user {}", account.id))
    );
    // Account row and ledger entries both remain.
    assert!(h.accounts.get_by_id(account.id).await.unwrap().is_some());
    assert_eq!(h.reminders.list_for_account(account.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_failure_does_not_abort_siblings() {
    let h = Harness::new().await;
    let now = Utc::now();
    // Ordered by deletion_scheduled_at: the failing candidate comes first.
    let first = h
        .seed("first@example.com", Some(now - Duration::hours(3)), None)
        .await;
    let second = h
        .seed("second@example.com", Some(now - Duration::hours(1)), None)
        .await;

    let flaky = Arc::new(FlakyAccountRepo::new(h.accounts.clone()));
    *flaky.fail_delete.lock().unwrap() = true;
    let engine = CleanupEngine::new(
        flaky,
        h.reminders.clone(),
        h.mailer.clone(),
        Some(h.billing.clone()),
        CleanupConfig::default(),
    );
    let report = engine.run_with_now(now).await;
    // Both candidates were attempted despite the first failing.
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].contains(&first.id.to_string()));
    assert!(report.errors[1].contains(&second.id.to_string()));
}

#[tokio::test]
async fn test_dry_run_counts_without_side_effects() {
    let h = Harness::new().await;
    let now = Utc::now();
    let reminded = h
        .seed("remind@example.com", Some(now + Duration::hours(150)), None)
        .await;
    let doomed = h
        .seed(
            "doomed@example.com",
            Some(now - Duration::hours(1)),
            Some("sub_dry"),
        )
        .await;

    let engine = h.engine_with(CleanupConfig {
        reminder_windows: vec![7],
        dry_run: true,
        ..Default::default()
    });
    let report = engine.run_with_now(now).await;

    assert!(report.dry_run);
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.accounts_deleted, 1);
    assert_eq!(report.stripe_subscriptions_cancelled, 1);
    assert!(report.errors.is_empty());

    // Nothing actually happened.
    assert!(h.mailer.sent.lock().unwrap().is_empty());
    assert!(h.billing.cancel_calls.lock().unwrap().is_empty());
    assert!(h.reminders.list_for_account(reminded.id).await.unwrap().is_empty());
    assert!(h.accounts.get_by_id(doomed.id).await.unwrap().is_some());
}
