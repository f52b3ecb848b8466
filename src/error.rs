//! Error types for courriel.

use thiserror::Error;

/// Errors surfaced to callers of the builder and provider adapters.
///
/// Transport problems (timeouts, refused connections, non-success HTTP
/// statuses) are never raised as errors; adapters convert them into
/// [`SendResult::fail`](crate::SendResult::fail) values. An `Err` from
/// `send` always means the caller handed over bad input or the environment
/// is misconfigured.
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// Malformed or missing caller input: bad email syntax, blank required
    /// field, mismatched list lengths, forbidden content pattern.
    #[error("{0}")]
    InvalidArgument(String),

    /// A structurally required field is absent at build time: no recipients,
    /// no from, no subject, no content, all TO addresses excluded.
    #[error("{0}")]
    MissingData(String),

    /// The MIME library rejected otherwise well-formed input while the
    /// message was being assembled. Carries the underlying cause.
    #[error("Mail message build failed: {0}")]
    BuildFailed(String),

    /// Configuration error (missing env var, invalid value, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        Self::BuildFailed(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        Self::BuildFailed(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::address::AddressError> for MailError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::BuildFailed(err.to_string())
    }
}
