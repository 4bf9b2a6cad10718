//! Cleanup pipeline configuration.
//!
//! # Example
//!
//! ```toml
//! [cleanup]
//! reminder_windows = [7, 3, 1, 0]
//! grace_period_days = 30
//! trigger_secret = "${CLEANUP_TRIGGER_SECRET}"
//! app_base_url = "https://app.example.com"
//! app_name = "Example"
//! dry_run = false
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration for the account cleanup pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    /// Reminder windows as day offsets before scheduled deletion.
    /// `0` means "less than 24 hours remaining".
    /// Each window produces at most one notification per account, ever.
    #[serde(default = "default_reminder_windows")]
    pub reminder_windows: Vec<u32>,

    /// Length of the grace period in days.
    ///
    /// Display-only: scheduling is driven entirely by the persisted
    /// `deletion_scheduled_at` timestamp, this value only appears in
    /// reminder email copy.
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: u32,

    /// Shared secret that authorizes the HTTP cleanup trigger.
    /// If unset, the trigger endpoint fails closed with a 500.
    #[serde(default)]
    pub trigger_secret: Option<String>,

    /// Base URL of the user-facing app, used to build the reactivation link
    /// in reminder emails.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,

    /// Product/organization name shown in reminder emails.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// If true, log what would be sent and deleted without side effects.
    /// Counters in the run report still reflect the would-be actions.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            reminder_windows: default_reminder_windows(),
            grace_period_days: default_grace_period_days(),
            trigger_secret: None,
            app_base_url: default_app_base_url(),
            app_name: default_app_name(),
            dry_run: false,
        }
    }
}

fn default_reminder_windows() -> Vec<u32> {
    vec![7, 3, 1, 0]
}

fn default_grace_period_days() -> u32 {
    30
}

fn default_app_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_app_name() -> String {
    "Custodian".to_string()
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reminder_windows.is_empty() {
            return Err(ConfigError::Validation(
                "cleanup.reminder_windows cannot be empty".into(),
            ));
        }
        if url::Url::parse(&self.app_base_url).is_err() {
            return Err(ConfigError::Validation(format!(
                "cleanup.app_base_url is not a valid URL: {}",
                self.app_base_url
            )));
        }
        Ok(())
    }

    /// The reactivation link included in reminder emails.
    pub fn reactivation_url(&self) -> String {
        format!(
            "{}/settings/subscription",
            self.app_base_url.trim_end_matches('/')
        )
    }
}
