//! Resend-compatible HTTP transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmailError, Mailer, OutboundEmail, SentEmail};
use crate::config::EmailConfig;

pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    /// Build a transport from configuration. Returns `None` if no API key is
    /// configured.
    pub fn from_config(client: reqwest::Client, config: &EmailConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        Some(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            from: config.from.clone(),
        })
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<SentEmail, EmailError> {
        let url = format!("{}/emails", self.api_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from,
                to: [&email.to],
                subject: &email.subject,
                html: &email.html,
                text: &email.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SendResponse = response.json().await?;
        Ok(SentEmail { id: body.id })
    }
}
