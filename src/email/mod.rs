//! Transactional email transport.
//!
//! The engine only ever sends one kind of message (the deletion reminder),
//! but the transport is a plain `send` so tests can substitute a mock.

mod resend;
pub mod templates;

use async_trait::async_trait;
pub use resend::HttpMailer;
use thiserror::Error;

/// An email ready to hand to the transport. The sender address comes from
/// transport configuration.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email API error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<SentEmail, EmailError>;
}
