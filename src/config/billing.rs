use serde::{Deserialize, Serialize};

/// Billing provider configuration.
///
/// Only two operations are consumed: retrieve subscription and cancel
/// subscription. An unconfigured billing client is not fatal; candidates
/// with a linked subscription record a per-candidate error and are still
/// deleted on schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Base URL of the billing API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Secret key for the billing provider.
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            secret_key: None,
        }
    }
}

impl BillingConfig {
    pub fn is_configured(&self) -> bool {
        self.secret_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn default_api_url() -> String {
    "https://api.stripe.com".to_string()
}
