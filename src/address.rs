//! Email address type with optional display name, plus address/domain
//! validation helpers.

use crate::error::MailError;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Check whether a string is a syntactically valid email address.
///
/// Uses RFC 5321/5322 compliant validation.
pub fn is_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Check whether a string is a syntactically valid domain name.
///
/// Accepts dotted labels of letters, digits and inner hyphens with an
/// alphabetic top-level label. No IDN conversion is attempted here; run
/// the domain through [`Address::to_ascii`] first if it may contain
/// non-ASCII characters.
pub fn is_domain(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.len() > 253 || !value.contains('.') {
        return false;
    }

    let labels: Vec<&str> = value.split('.').collect();
    for label in &labels {
        if label.is_empty()
            || label.len() > 63
            || label.starts_with('-')
            || label.ends_with('-')
            || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return false;
        }
    }

    // top-level label must be alphabetic
    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

/// An email address with an optional display name.
///
/// # Examples
///
/// ```
/// use courriel::Address;
///
/// // From email string
/// let addr: Address = "user@example.com".into();
/// assert_eq!(addr.email, "user@example.com");
/// assert_eq!(addr.name, None);
///
/// // From tuple (name, email)
/// let addr: Address = ("Alice", "alice@example.com").into();
/// assert_eq!(addr.email, "alice@example.com");
/// assert_eq!(addr.name, Some("Alice".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name (e.g., "Alice Smith")
    pub name: Option<String>,
    /// Email address (e.g., "alice@example.com")
    pub email: String,
}

impl Address {
    /// Create a new address with just an email.
    ///
    /// No validation is performed here; the message builder validates
    /// addresses when they are added. For strict validation up front, use
    /// [`Address::parse`] instead.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new address with a name and email.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse and validate an email address.
    ///
    /// # Examples
    ///
    /// ```
    /// use courriel::Address;
    ///
    /// let addr = Address::parse("user@example.com").unwrap();
    /// assert_eq!(addr.email, "user@example.com");
    ///
    /// assert!(Address::parse("not-an-email").is_err());
    /// assert!(Address::parse("").is_err());
    /// ```
    pub fn parse(email: &str) -> Result<Self, MailError> {
        if !is_email(email) {
            return Err(MailError::InvalidArgument(format!(
                "Invalid email address: '{}'!",
                email
            )));
        }

        Ok(Self {
            name: None,
            email: email.to_string(),
        })
    }

    /// Parse and validate an email address with a display name.
    ///
    /// An empty name becomes `None`.
    pub fn parse_with_name(name: &str, email: &str) -> Result<Self, MailError> {
        let parsed = Self::parse(email)?;
        Ok(Self {
            name: if name.trim().is_empty() {
                None
            } else {
                Some(name.trim().to_string())
            },
            ..parsed
        })
    }

    /// Convert the domain part of the email address to ASCII (Punycode).
    ///
    /// Useful for international domain names (IDN) that contain non-ASCII
    /// characters. The local part (before @) is preserved as-is.
    ///
    /// # Examples
    ///
    /// ```
    /// use courriel::Address;
    ///
    /// let addr = Address::new("user@例え.jp");
    /// assert_eq!(addr.to_ascii().unwrap(), "user@xn--r8jz45g.jp");
    ///
    /// let addr = Address::new("user@example.com");
    /// assert_eq!(addr.to_ascii().unwrap(), "user@example.com");
    /// ```
    pub fn to_ascii(&self) -> Result<String, MailError> {
        let parts: Vec<&str> = self.email.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(MailError::InvalidArgument(format!(
                "'{}' is missing @ symbol",
                self.email
            )));
        }

        let local_part = parts[0];
        let domain = parts[1];

        let ascii_domain = idna::domain_to_ascii(domain).map_err(|e| {
            MailError::InvalidArgument(format!(
                "Failed to convert domain '{}' to ASCII: {:?}",
                domain, e
            ))
        })?;

        Ok(format!("{}@{}", local_part, ascii_domain))
    }

    /// The display name to use when a header requires one: the stored name
    /// when present and non-blank, the address itself otherwise.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }

    /// Format as `Name <email>`, or just `email` when there is no name or
    /// the name repeats the address (case-insensitive).
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) if name.is_empty() || name.eq_ignore_ascii_case(&self.email) => {
                self.email.clone()
            }
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

// From &str - just email
impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

// From String - just email
impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

// From tuple (name, email)
impl From<(&str, &str)> for Address {
    fn from((name, email): (&str, &str)) -> Self {
        Self::with_name(name, email)
    }
}

impl From<(String, String)> for Address {
    fn from((name, email): (String, String)) -> Self {
        Self::with_name(name, email)
    }
}

impl From<(&str, String)> for Address {
    fn from((name, email): (&str, String)) -> Self {
        Self::with_name(name, email)
    }
}

impl From<(String, &str)> for Address {
    fn from((name, email): (String, &str)) -> Self {
        Self::with_name(name, email)
    }
}

/// Trait for types that can be converted to an email address.
///
/// Implement this trait for your custom types to use them directly in the
/// message builder methods.
///
/// # Example
///
/// ```rust
/// use courriel::{Address, ToAddress};
///
/// struct User {
///     name: String,
///     email: String,
/// }
///
/// impl ToAddress for User {
///     fn to_address(&self) -> Address {
///         Address::with_name(&self.name, &self.email)
///     }
/// }
///
/// // Now you can use User directly:
/// // let message = MailMessage::new().to(&user)?;
/// ```
pub trait ToAddress {
    fn to_address(&self) -> Address;
}

// Blanket implementation for references to types that implement ToAddress
impl<T: ToAddress + ?Sized> ToAddress for &T {
    fn to_address(&self) -> Address {
        (*self).to_address()
    }
}

impl ToAddress for Address {
    fn to_address(&self) -> Address {
        self.clone()
    }
}

impl ToAddress for str {
    fn to_address(&self) -> Address {
        Address::new(self)
    }
}

impl ToAddress for String {
    fn to_address(&self) -> Address {
        Address::new(self)
    }
}

// Tuples are (name, email)
impl<N: AsRef<str>, E: AsRef<str>> ToAddress for (N, E) {
    fn to_address(&self) -> Address {
        Address::with_name(self.0.as_ref(), self.1.as_ref())
    }
}
