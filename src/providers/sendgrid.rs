//! SendGrid API delivery (v3 mail send with API key).
//!
//! # Example
//!
//! ```rust,ignore
//! use courriel::providers::SendGridMailer;
//! use courriel::Address;
//!
//! let mailer = SendGridMailer::new(
//!     "SG.xxxxx",
//!     Address::with_name("No Reply", "noreply@example.com"),
//! )?;
//! ```
//!
//! The configured address is a *fallback* sender: it is applied through
//! [`MailMessage::default_from`](crate::MailMessage::default_from) and never
//! overrides an explicit `from` on the message.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use std::sync::OnceLock;

use crate::address::{self, Address};
use crate::error::MailError;
use crate::mailer::{MailService, SendResult};
use crate::message::{Mail, MailMessage, RecipientKind};

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3";

/// Content values that look like they embed a SendGrid API key are rejected
/// before any request is made.
static FORBIDDEN_CONTENT: OnceLock<Regex> = OnceLock::new();

fn forbidden_content() -> &'static Regex {
    FORBIDDEN_CONTENT.get_or_init(|| {
        Regex::new(r"SG\.[A-Za-z0-9_-]*\.[A-Za-z0-9_-]*").expect("forbidden content pattern")
    })
}

/// SendGrid API delivery back-end.
#[derive(Debug)]
pub struct SendGridMailer {
    api_key: String,
    default_from: Address,
    client: Client,
    base_url: String,
}

impl SendGridMailer {
    /// Create a new SendGrid mailer with the given API key and fallback
    /// sender.
    pub fn new(api_key: impl Into<String>, default_from: Address) -> Result<Self, MailError> {
        Self::with_client(api_key, default_from, Client::new())
    }

    /// Create with a custom reqwest client.
    pub fn with_client(
        api_key: impl Into<String>,
        default_from: Address,
        client: Client,
    ) -> Result<Self, MailError> {
        let api_key = api_key.into();
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(MailError::Configuration("Missing api key!".to_string()));
        }
        if !address::is_email(default_from.email.trim()) {
            return Err(MailError::Configuration(
                "Invalid default from email!".to_string(),
            ));
        }

        // log only the first characters of the key
        tracing::info!(
            key = %truncated(&api_key),
            "Initializing SendGrid mail service"
        );

        Ok(Self {
            api_key,
            default_from,
            client,
            base_url: SENDGRID_API_URL.to_string(),
        })
    }

    /// Set a custom base URL (for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request(&self, mail: &Mail) -> Result<SendGridRequest, MailError> {
        let content = match (mail.content(), mail.html()) {
            (Some(text), _) => SendGridContent {
                content_type: "text/plain".to_string(),
                value: text.to_string(),
            },
            (None, Some(html)) => SendGridContent {
                content_type: "text/html".to_string(),
                value: html.to_string(),
            },
            (None, None) => {
                return Err(MailError::MissingData("Missing email content!".to_string()))
            }
        };

        Ok(SendGridRequest {
            personalizations: vec![SendGridPersonalization {
                to: mail
                    .recipients(RecipientKind::To)
                    .iter()
                    .map(SendGridAddress::from_address)
                    .collect(),
                cc: optional_list(mail.recipients(RecipientKind::Cc)),
                bcc: optional_list(mail.recipients(RecipientKind::Bcc)),
                send_at: mail.send_at().map(|at| at.timestamp()),
            }],
            from: SendGridAddress::from_address(mail.from()),
            subject: mail.subject().to_string(),
            content: vec![content],
        })
    }
}

/// Reject content that looks like it carries a SendGrid API key.
fn verify_content(mail: &Mail) -> Result<(), MailError> {
    for value in [mail.content(), mail.html()].into_iter().flatten() {
        if forbidden_content().is_match(value) {
            return Err(MailError::InvalidArgument(
                "Found a forbidden pattern in the content of the email!".to_string(),
            ));
        }
    }
    Ok(())
}

fn optional_list(addresses: &[Address]) -> Option<Vec<SendGridAddress>> {
    if addresses.is_empty() {
        None
    } else {
        Some(addresses.iter().map(SendGridAddress::from_address).collect())
    }
}

fn truncated(key: &str) -> String {
    let prefix: String = key.chars().take(9).collect();
    format!("{}***", prefix)
}

#[async_trait]
impl MailService for SendGridMailer {
    async fn send(&self, message: MailMessage) -> Result<SendResult, MailError> {
        let message = message.default_from(self.default_from.clone())?;
        let mail = message.build()?;
        verify_content(&mail)?;
        let request = self.build_request(&mail)?;

        let url = format!("{}/mail/send", self.base_url);
        let body = serde_json::to_vec(&request)?;
        let response = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("User-Agent", format!("courriel/{}", crate::VERSION))
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Failed to send mail via SendGrid");
                return Ok(SendResult::fail_with_message(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        if matches!(status, 200 | 201 | 202) {
            // message id is reported in a response header
            let message_id = response
                .headers()
                .get("X-Message-Id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            Ok(match message_id {
                Some(id) => SendResult::ok_with_id(id),
                None => SendResult::ok(),
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "SendGrid rejected mail");
            Ok(SendResult::fail_with_message(body))
        }
    }

    fn provider_name(&self) -> &'static str {
        "sendgrid"
    }
}

// ============================================================================
// SendGrid API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<SendGridPersonalization>,
    from: SendGridAddress,
    subject: String,
    content: Vec<SendGridContent>,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization {
    to: Vec<SendGridAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<Vec<SendGridAddress>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc: Option<Vec<SendGridAddress>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    send_at: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SendGridAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl SendGridAddress {
    fn from_address(addr: &Address) -> Self {
        Self {
            email: addr.email.clone(),
            name: addr.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendGridContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}
