//! Stripe REST client.

use async_trait::async_trait;

use super::{BillingClient, BillingError, RemoteSubscription};
use crate::config::BillingConfig;

pub struct StripeClient {
    client: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl StripeClient {
    /// Build a client from configuration. Returns `None` if no secret key is
    /// configured.
    pub fn from_config(client: reqwest::Client, config: &BillingConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        Some(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone().unwrap_or_default(),
        })
    }

    async fn parse_subscription(
        response: reqwest::Response,
    ) -> Result<RemoteSubscription, BillingError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BillingClient for StripeClient {
    async fn retrieve_subscription(&self, id: &str) -> Result<RemoteSubscription, BillingError> {
        let url = format!("{}/v1/subscriptions/{}", self.api_url, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Self::parse_subscription(response).await
    }

    async fn cancel_subscription(&self, id: &str) -> Result<RemoteSubscription, BillingError> {
        let url = format!("{}/v1/subscriptions/{}", self.api_url, id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Self::parse_subscription(response).await
    }
}
