//! Mail delivery back-ends.
//!
//! Each provider implements the [`MailService`](crate::MailService) trait.
//!
//! | Provider | Feature Flag | Description |
//! |----------|-------------|-------------|
//! | [`SmtpMailer`] | `smtp` | SMTP/MIME via lettre |
//! | [`SendGridMailer`] | `sendgrid` | SendGrid v3 JSON API |
//! | [`MailgunMailer`] | `mailgun` | Mailgun form-encoded API |

#[cfg(feature = "smtp")]
mod smtp;
#[cfg(feature = "smtp")]
pub use smtp::{SmtpBuilder, SmtpMailer, TlsMode};

#[cfg(feature = "sendgrid")]
mod sendgrid;
#[cfg(feature = "sendgrid")]
pub use sendgrid::SendGridMailer;

#[cfg(feature = "mailgun")]
mod mailgun;
#[cfg(feature = "mailgun")]
pub use mailgun::MailgunMailer;
