//! Mailgun API delivery.
//!
//! For reference: [Mailgun API docs](https://documentation.mailgun.com/en/latest/api-sending.html#sending)
//!
//! # Example
//!
//! ```rust,ignore
//! use courriel::providers::MailgunMailer;
//! use courriel::Address;
//!
//! let mailer = MailgunMailer::new(
//!     "your-api-key",
//!     "mg.yourdomain.com",
//!     Address::new("noreply@yourdomain.com"),
//! )?;
//! ```
//!
//! For EU domains, use `.base_url("https://api.eu.mailgun.net/v3")`.

use async_trait::async_trait;
use base64::Engine;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::address::{self, Address};
use crate::error::MailError;
use crate::mailer::{MailService, SendResult};
use crate::message::{MailMessage, RecipientKind};

const MAILGUN_BASE_URL: &str = "https://api.mailgun.net/v3";

/// Mailgun only honors delivery times up to 72 hours out; hints beyond the
/// window are not forwarded.
const DELIVERY_TIME_WINDOW_HOURS: i64 = 72;

/// Mailgun API delivery back-end.
#[derive(Debug)]
pub struct MailgunMailer {
    api_key: String,
    domain: String,
    default_from: Address,
    base_url: String,
    client: Client,
}

impl MailgunMailer {
    /// Create a new Mailgun mailer with the given API key, sending domain
    /// and fallback sender.
    pub fn new(
        api_key: impl Into<String>,
        domain: impl Into<String>,
        default_from: Address,
    ) -> Result<Self, MailError> {
        Self::with_client(api_key, domain, default_from, Client::new())
    }

    /// Create with a custom reqwest client.
    pub fn with_client(
        api_key: impl Into<String>,
        domain: impl Into<String>,
        default_from: Address,
        client: Client,
    ) -> Result<Self, MailError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(MailError::Configuration("Missing api key!".to_string()));
        }

        let domain = domain.into().trim().to_string();
        if domain.is_empty() {
            return Err(MailError::Configuration(
                "Missing mail domain name!".to_string(),
            ));
        }
        if !address::is_domain(&domain) {
            return Err(MailError::Configuration("Invalid domain name!".to_string()));
        }

        if !address::is_email(default_from.email.trim()) {
            return Err(MailError::Configuration(
                "Invalid default from email!".to_string(),
            ));
        }

        tracing::info!(domain = %domain, "Initializing Mailgun mail service");

        Ok(Self {
            api_key,
            domain,
            default_from,
            base_url: MAILGUN_BASE_URL.to_string(),
            client,
        })
    }

    /// Set a custom base URL (e.g., for EU: "https://api.eu.mailgun.net/v3").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn auth_header(&self) -> String {
        let credentials = format!("api:{}", self.api_key);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {}", encoded)
    }
}

#[async_trait]
impl MailService for MailgunMailer {
    async fn send(&self, message: MailMessage) -> Result<SendResult, MailError> {
        let message = message.default_from(self.default_from.clone())?;
        let mail = message.build()?;

        let Some(to) = mail.joined(RecipientKind::To) else {
            return Err(MailError::MissingData(
                "Missing to email address(es)!".to_string(),
            ));
        };

        let mut form: Vec<(&str, String)> = Vec::new();
        form.push(("from", mail.from().formatted()));
        form.push(("to", to));
        if let Some(cc) = mail.joined(RecipientKind::Cc) {
            form.push(("cc", cc));
        }
        if let Some(bcc) = mail.joined(RecipientKind::Bcc) {
            form.push(("bcc", bcc));
        }
        form.push(("subject", mail.subject().to_string()));
        if let Some(text) = mail.content() {
            form.push(("text", text.to_string()));
        }
        if let Some(html) = mail.html() {
            form.push(("html", html.to_string()));
        }
        if let Some(at) = mail.send_at() {
            if at < Utc::now() + Duration::hours(DELIVERY_TIME_WINDOW_HOURS) {
                // RFC-2822 date format, e.g. "Fri, 25 May 2020 23:10:10 -0000"
                form.push(("o:deliverytime", at.to_rfc2822()));
            }
        }

        let url = format!("{}/{}/messages", self.base_url, self.domain);
        let response = match self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("User-Agent", format!("courriel/{}", crate::VERSION))
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Failed to send mail via Mailgun");
                return Ok(SendResult::fail());
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "Mailgun rejected mail");
            return Ok(SendResult::fail());
        }

        // {"id": "<2018...@yourdomain.com>", "message": "Queued. Thank you."}
        match response.json::<MailgunResponse>().await {
            Ok(parsed) => Ok(SendResult::ok_with_id(parsed.id)),
            Err(e) => {
                // the mail was accepted; a malformed body only loses the id
                tracing::warn!(error = %e, "Failed to parse Mailgun send response");
                Ok(SendResult::ok())
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mailgun"
    }
}

// ============================================================================
// Mailgun API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: String,
    #[allow(dead_code)]
    message: String,
}
