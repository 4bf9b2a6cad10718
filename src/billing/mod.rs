//! Billing provider client.
//!
//! Only two provider operations are consumed: retrieve a subscription and
//! cancel it. Retrieval comes first so an already-canceled subscription is
//! never canceled twice.

mod stripe;

use async_trait::async_trait;
use serde::Deserialize;
pub use stripe::StripeClient;
use thiserror::Error;

/// Subscription state as reported by the billing provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSubscription {
    pub id: String,
    pub status: RemoteSubscriptionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteSubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Canceled,
    Paused,
    #[serde(other)]
    Unknown,
}

impl RemoteSubscriptionStatus {
    /// Whether the subscription is already in a terminal canceled state.
    pub fn is_canceled(&self) -> bool {
        matches!(
            self,
            RemoteSubscriptionStatus::Canceled | RemoteSubscriptionStatus::IncompleteExpired
        )
    }
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Billing provider not configured")]
    NotConfigured,

    #[error("Billing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Billing API error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait BillingClient: Send + Sync {
    async fn retrieve_subscription(&self, id: &str) -> Result<RemoteSubscription, BillingError>;
    async fn cancel_subscription(&self, id: &str) -> Result<RemoteSubscription, BillingError>;
}
