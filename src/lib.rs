//! # Courriel
//!
//! Provider-neutral mail messages in Rust: build once, deliver over SMTP,
//! SendGrid or Mailgun.
//!
//! The core is [`MailMessage`], a fluent builder that accumulates
//! recipients, content, headers, attachments and exclusions, and validates
//! the whole into an immutable snapshot when a provider renders it. Every
//! back-end implements the same one-method [`MailService`] contract, so the
//! same message data can travel as a MIME tree, a JSON document or a
//! form-encoded body.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courriel::{MailMessage, MailService};
//! use courriel::providers::MailgunMailer;
//! use courriel::Address;
//!
//! let mailer = MailgunMailer::new("key", "mg.example.com", Address::new("noreply@example.com"))?;
//!
//! let message = MailMessage::new()
//!     .to(("Steve", "steve@example.com"))?
//!     .subject("Welcome!")
//!     .content("Hello")
//!     .html("<h1>Hello</h1>");
//!
//! let result = mailer.send(message).await?;
//! assert!(result.is_successful());
//! ```
//!
//! Delivery failures are values, not errors: `send` only returns `Err` for
//! caller bugs (invalid addresses, missing fields); a refused connection or
//! a non-success provider response comes back as a [`SendResult`] with
//! `is_successful() == false`.
//!
//! ## Environment configuration
//!
//! The global mailer can be configured from environment variables and used
//! through the module-level [`send`] function:
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `MAIL_PROVIDER` | `smtp`, `sendgrid`, or `mailgun` |
//! | `MAIL_FROM` | Default sender email |
//! | `MAIL_FROM_NAME` | Default sender name |
//! | `SMTP_HOST` | SMTP server host |
//! | `SMTP_PORT` | SMTP server port (default: 587) |
//! | `SMTP_USERNAME` | SMTP username |
//! | `SMTP_PASSWORD` | SMTP password |
//! | `SENDGRID_API_KEY` | SendGrid API key |
//! | `MAILGUN_API_KEY` | Mailgun API key |
//! | `MAILGUN_DOMAIN` | Mailgun sending domain |
//!
//! ## Feature Flags
//!
//! - `smtp` - SMTP provider via lettre (default)
//! - `sendgrid` - SendGrid API provider (default)
//! - `mailgun` - Mailgun API provider (default)

/// The version of the courriel crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod error;
mod mailer;
mod message;

#[cfg(feature = "smtp")]
pub mod mime;

pub mod providers;

use parking_lot::RwLock;
use std::env;
use std::sync::Arc;

// Re-exports
pub use address::{is_domain, is_email, Address, ToAddress};
pub use attachment::Attachment;
pub use error::MailError;
pub use mailer::{MailService, SendResult};
pub use message::{Mail, MailMessage, RecipientKind, Recipients};

// ============================================================================
// Global Mailer Configuration
// ============================================================================

/// Global mailer - swappable for testing
static MAILER: RwLock<Option<Arc<dyn MailService>>> = RwLock::new(None);

/// Get the default from address from the environment.
pub fn default_from() -> Option<Address> {
    let email = env::var("MAIL_FROM").ok()?;
    match env::var("MAIL_FROM_NAME").ok() {
        Some(name) => Some(Address::with_name(name, email)),
        None => Some(Address::new(email)),
    }
}

/// Create a mailer from environment variables.
///
/// Reads `MAIL_PROVIDER` to pick the back-end, then the provider-specific
/// variables listed in the crate docs. The HTTP API providers additionally
/// require `MAIL_FROM` for their fallback sender.
pub fn from_env() -> Result<Arc<dyn MailService>, MailError> {
    let provider = env::var("MAIL_PROVIDER")
        .map(|p| p.to_lowercase())
        .map_err(|_| MailError::Configuration("MAIL_PROVIDER not set".to_string()))?;

    match provider.as_str() {
        #[cfg(feature = "smtp")]
        "smtp" => {
            let host = env::var("SMTP_HOST")
                .map_err(|_| MailError::Configuration("SMTP_HOST not set".to_string()))?;
            let port: u16 = env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587);
            let username = env::var("SMTP_USERNAME").unwrap_or_default();
            let password = env::var("SMTP_PASSWORD").unwrap_or_default();

            let mailer = if username.is_empty() {
                providers::SmtpMailer::new(&host, port).build()
            } else {
                providers::SmtpMailer::new(&host, port)
                    .credentials(&username, &password)
                    .build()
            };
            Ok(Arc::new(mailer))
        }
        #[cfg(not(feature = "smtp"))]
        "smtp" => Err(MailError::Configuration(
            "MAIL_PROVIDER=smtp but 'smtp' feature is not enabled. \
            Add `features = [\"smtp\"]` to Cargo.toml"
                .to_string(),
        )),

        #[cfg(feature = "sendgrid")]
        "sendgrid" => {
            let key = env::var("SENDGRID_API_KEY")
                .map_err(|_| MailError::Configuration("SENDGRID_API_KEY not set".to_string()))?;
            let from = default_from()
                .ok_or_else(|| MailError::Configuration("MAIL_FROM not set".to_string()))?;
            Ok(Arc::new(providers::SendGridMailer::new(&key, from)?))
        }
        #[cfg(not(feature = "sendgrid"))]
        "sendgrid" => Err(MailError::Configuration(
            "MAIL_PROVIDER=sendgrid but 'sendgrid' feature is not enabled. \
            Add `features = [\"sendgrid\"]` to Cargo.toml"
                .to_string(),
        )),

        #[cfg(feature = "mailgun")]
        "mailgun" => {
            let key = env::var("MAILGUN_API_KEY")
                .map_err(|_| MailError::Configuration("MAILGUN_API_KEY not set".to_string()))?;
            let domain = env::var("MAILGUN_DOMAIN")
                .map_err(|_| MailError::Configuration("MAILGUN_DOMAIN not set".to_string()))?;
            let from = default_from()
                .ok_or_else(|| MailError::Configuration("MAIL_FROM not set".to_string()))?;
            let mut mailer = providers::MailgunMailer::new(&key, &domain, from)?;
            // Check for EU endpoint
            if let Ok(base_url) = env::var("MAILGUN_BASE_URL") {
                mailer = mailer.base_url(base_url);
            }
            Ok(Arc::new(mailer))
        }
        #[cfg(not(feature = "mailgun"))]
        "mailgun" => Err(MailError::Configuration(
            "MAIL_PROVIDER=mailgun but 'mailgun' feature is not enabled. \
            Add `features = [\"mailgun\"]` to Cargo.toml"
                .to_string(),
        )),

        _ => Err(MailError::Configuration(format!(
            "Unknown MAIL_PROVIDER: {}. Valid providers are: smtp, sendgrid, mailgun",
            provider
        ))),
    }
}

/// Get or initialize the global mailer.
fn get_mailer() -> Result<Arc<dyn MailService>, MailError> {
    // Fast path: already configured
    {
        let guard = MAILER.read();
        if let Some(ref mailer) = *guard {
            return Ok(Arc::clone(mailer));
        }
    }

    // Slow path: need to configure
    let mailer = from_env()?;
    let mut guard = MAILER.write();

    // Double-check after acquiring write lock
    if guard.is_none() {
        *guard = Some(Arc::clone(&mailer));
    }

    Ok(guard.as_ref().unwrap_or(&mailer).clone())
}

/// Initialize the global mailer from environment variables.
///
/// Call this at startup if you want configuration errors surfaced early
/// instead of on the first [`send`].
pub fn init() -> Result<(), MailError> {
    let _ = get_mailer()?;
    Ok(())
}

/// Send a message using the global mailer.
///
/// Auto-configures from environment variables on first call. The message
/// still goes through full validation; a default sender from `MAIL_FROM`
/// is applied without clobbering an explicit `from` on the message.
pub async fn send(message: MailMessage) -> Result<SendResult, MailError> {
    let mailer = get_mailer()?;
    let provider = mailer.provider_name();

    let mut message = message;
    if let Some(from) = default_from() {
        message = message.default_from(from)?;
    }

    let span = tracing::info_span!("courriel.send", provider = provider);
    let _guard = span.enter();

    tracing::debug!("Sending mail");

    let result = mailer.send(message).await;

    match &result {
        Ok(outcome) if outcome.is_successful() => {
            tracing::info!(result = %outcome, "Mail accepted")
        }
        Ok(outcome) => tracing::warn!(result = %outcome, "Mail delivery failed"),
        Err(e) => tracing::error!(error = %e, "Mail rejected before transmission"),
    }

    result
}

// ============================================================================
// Manual Configuration (for testing or custom setups)
// ============================================================================

/// Manually configure the global mailer.
///
/// Can be called multiple times - later calls replace the previous mailer.
///
/// ```rust,ignore
/// use courriel::{configure, providers::SmtpMailer};
///
/// configure(SmtpMailer::localhost());
/// ```
pub fn configure<M: MailService + 'static>(mailer: M) {
    let mut guard = MAILER.write();
    *guard = Some(Arc::new(mailer));
}

/// Configure with an Arc'd mailer.
pub fn configure_arc(mailer: Arc<dyn MailService>) {
    let mut guard = MAILER.write();
    *guard = Some(mailer);
}

/// Reset the global mailer (useful for tests).
///
/// After calling this, the next [`send`] will re-initialize from env vars.
pub fn reset() {
    let mut guard = MAILER.write();
    *guard = None;
}

/// Get a reference to the configured mailer (if initialized).
pub fn mailer() -> Option<Arc<dyn MailService>> {
    let guard = MAILER.read();
    guard.as_ref().cloned()
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Address;
    pub use crate::Attachment;
    pub use crate::Mail;
    pub use crate::MailError;
    pub use crate::MailMessage;
    pub use crate::MailService;
    pub use crate::RecipientKind;
    pub use crate::SendResult;
    pub use crate::ToAddress;
    pub use crate::{configure, default_from, from_env, send};
}
