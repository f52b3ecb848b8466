//! The provider contract: the [`MailService`] trait and [`SendResult`].
//!
//! # Architecture: Why `async_trait`?
//!
//! This module uses `#[async_trait]` instead of native async traits because
//! the library supports dynamic dispatch via `Arc<dyn MailService>` (runtime
//! provider selection from environment variables, the global mailer). Native
//! async traits are not object-safe. The boxed-future allocation is noise
//! next to the network round trip every delivery performs.
//!
//! Users who want to avoid the boxing can call `send` directly on a concrete
//! provider type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::error::MailError;
use crate::message::MailMessage;

/// Outcome of a delivery attempt.
///
/// Carries an HTTP-style status class and an optional message: the provider
/// message id on success, an error description on failure.
/// `is_successful()` is the only signal callers should branch on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    status: u16,
    message: Option<String>,
}

impl SendResult {
    /// Result with an explicit status and optional message.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Successful delivery without a provider message id.
    pub fn ok() -> Self {
        Self {
            status: 200,
            message: None,
        }
    }

    /// Successful delivery with the provider's message id.
    pub fn ok_with_id(message_id: impl Into<String>) -> Self {
        Self {
            status: 200,
            message: Some(message_id.into()),
        }
    }

    /// Failed delivery.
    pub fn fail() -> Self {
        Self {
            status: 400,
            message: None,
        }
    }

    /// Failed delivery with an error description.
    pub fn fail_with_message(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: Some(message.into()),
        }
    }

    /// Status code indicating success or failure of the send.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Provider message id (on success) or error description (on failure).
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether the delivery was accepted (status in [200, 300)).
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Display for SendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} [{}]", self.status, message),
            None => write!(f, "{}", self.status),
        }
    }
}

/// Trait for mail delivery back-ends.
///
/// Each invocation is one linear pipeline: validate, render into the
/// provider's wire format, transmit, interpret the response. Providers hold
/// only fixed configuration (credentials, domain, default sender) and are
/// safe to share across callers; the message is consumed by exactly one
/// `send` call.
///
/// Caller mistakes — invalid addresses, missing required fields, forbidden
/// content — come back as `Err`. Transport problems come back as
/// `Ok(SendResult)` with `is_successful() == false`; check the result
/// instead of catching errors for delivery failures.
///
/// # Example
///
/// ```ignore
/// use courriel::{MailMessage, MailService};
/// use courriel::providers::SmtpMailer;
///
/// let mailer = SmtpMailer::new("smtp.example.com", 587)
///     .credentials("user", "pass")
///     .build();
///
/// let message = MailMessage::new()
///     .from("sender@example.com")?
///     .to("recipient@example.com")?
///     .subject("Hello")
///     .content("World");
///
/// let result = mailer.send(message).await?;
/// assert!(result.is_successful());
/// ```
#[async_trait]
pub trait MailService: Send + Sync {
    /// Deliver a message through this back-end.
    async fn send(&self, message: MailMessage) -> Result<SendResult, MailError>;

    /// Provider name (for logging/debugging).
    fn provider_name(&self) -> &'static str {
        "unknown"
    }

    /// Convenience: build and send a message in one call.
    async fn send_to(
        &self,
        from: Address,
        to: Address,
        subject: &str,
        text: Option<&str>,
        html: Option<&str>,
    ) -> Result<SendResult, MailError> {
        let mut message = MailMessage::new().from(from)?.to(to)?.subject(subject);
        if let Some(text) = text {
            message = message.content(text);
        }
        if let Some(html) = html {
            message = message.html(html);
        }
        self.send(message).await
    }
}
