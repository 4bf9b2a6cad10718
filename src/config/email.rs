use serde::{Deserialize, Serialize};

/// Transactional email transport configuration.
///
/// The transport speaks the Resend-compatible JSON API. Leaving `api_key`
/// unset means the transport is unconfigured; the cleanup trigger then fails
/// closed before running either phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// Base URL of the email API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key for the email provider.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address, e.g. `"Custodian <no-reply@example.com>"`.
    #[serde(default = "default_from")]
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            from: default_from(),
        }
    }
}

impl EmailConfig {
    /// Whether the transport can actually deliver mail.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn default_api_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_from() -> String {
    "Custodian <no-reply@localhost>".to_string()
}
