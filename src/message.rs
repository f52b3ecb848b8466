//! Mail message builder and its validated, immutable snapshot.
//!
//! [`MailMessage`] is a mutable fluent builder: recipients, content, headers,
//! attachments and exclusions accumulate through chained calls. A single
//! [`MailMessage::build`] call validates the whole and produces an immutable
//! [`Mail`] snapshot, which is what renderers and provider adapters consume.
//! Separating the two phases means nobody has to reason about partially-valid
//! intermediate states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::address::{self, Address, ToAddress};
use crate::attachment::Attachment;
use crate::error::MailError;

/// Recipient visibility class of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientKind {
    /// Primary recipients, visible to everyone.
    To,
    /// Carbon copy, visible to everyone.
    Cc,
    /// Blind carbon copy, hidden from other recipients.
    Bcc,
}

impl fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipientKind::To => write!(f, "to"),
            RecipientKind::Cc => write!(f, "cc"),
            RecipientKind::Bcc => write!(f, "bcc"),
        }
    }
}

/// Insertion-ordered mapping of email address to optional display name.
///
/// Addresses are unique; re-adding an address keeps its position and
/// overwrites the stored name (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients {
    entries: Vec<(String, Option<String>)>,
}

impl Recipients {
    fn insert(&mut self, email: String, name: Option<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|(e, _)| *e == email) {
            entry.1 = name;
        } else {
            self.entries.push((email, name));
        }
    }

    /// Whether the address is present.
    pub fn contains(&self, email: &str) -> bool {
        self.entries.iter().any(|(e, _)| e == email)
    }

    /// Display name stored for an address, if any.
    pub fn name(&self, email: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(e, _)| e == email)
            .and_then(|(_, n)| n.as_deref())
    }

    /// Number of stored addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no addresses are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(email, name)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(e, n)| (e.as_str(), n.as_deref()))
    }
}

fn trim_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Validate a caller-supplied email address for the given slot (`to`, `cc`,
/// `bcc`, `from`, `excluded`). Returns the trimmed address.
fn check_email_address(email: &str, slot: &str) -> Result<String, MailError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(MailError::InvalidArgument(format!(
            "Missing {} email address!",
            slot
        )));
    }
    if !address::is_email(trimmed) {
        return Err(MailError::InvalidArgument(format!(
            "Invalid {} email address: '{}'!",
            slot, email
        )));
    }
    Ok(trimmed.to_string())
}

/// Fluent builder for a mail message.
///
/// Fallible mutators validate their input and return
/// `Result<Self, MailError>` so chains compose with `?`; the content setters
/// (`subject`, `content`, `html`) silently ignore blank input instead.
///
/// ```
/// use courriel::MailMessage;
///
/// # fn main() -> Result<(), courriel::MailError> {
/// let mail = MailMessage::new()
///     .from("sender@example.com")?
///     .to(("Steve", "steve@example.com"))?
///     .subject("Hello")
///     .content("Plain text")
///     .html("<h1>Hello</h1>")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailMessage {
    to: Recipients,
    cc: Recipients,
    bcc: Recipients,
    from_email: Option<String>,
    from_name: Option<String>,
    subject: Option<String>,
    content: Option<String>,
    html: Option<String>,
    headers: HashMap<String, String>,
    excluded: Vec<String>,
    attachments: Vec<Attachment>,
    send_at: Option<DateTime<Utc>>,
}

impl MailMessage {
    /// Create a new empty mail message.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Sender
    // ------------------------------------------------------------------

    /// Set the sender. Last write wins.
    ///
    /// The email is validated, trimmed and lowercased; a blank display name
    /// clears any previously stored name.
    ///
    /// Accepts anything that implements [`ToAddress`]:
    /// - `"email@example.com"` - just email
    /// - `("Name", "email@example.com")` - name and email
    pub fn from(mut self, addr: impl ToAddress) -> Result<Self, MailError> {
        let addr = addr.to_address();
        let email = check_email_address(&addr.email, "from")?;
        self.from_email = Some(email.to_lowercase());
        self.from_name = addr.name.as_deref().and_then(trim_to_none);
        Ok(self)
    }

    /// Set the sender display name without touching the address.
    pub fn from_name(mut self, name: &str) -> Self {
        self.from_name = trim_to_none(name);
        self
    }

    /// Set the sender only if it would not clobber an explicit choice.
    ///
    /// Applies when no sender is set, or when the stored sender address
    /// equals the given one (case-insensitive) and no display name was
    /// stored. Otherwise a no-op. Provider adapters use this to inject a
    /// configured fallback sender.
    pub fn default_from(self, addr: impl ToAddress) -> Result<Self, MailError> {
        let fallback = addr.to_address();

        let current = self.from_email.as_deref().map(str::trim).unwrap_or("");
        if current.is_empty() {
            return self.from(fallback);
        }

        let candidate = fallback.email.trim();
        if !candidate.is_empty()
            && current.eq_ignore_ascii_case(candidate)
            && self.from_name.is_none()
        {
            return self.from(fallback);
        }

        Ok(self)
    }

    // ------------------------------------------------------------------
    // Recipients
    // ------------------------------------------------------------------

    /// Add a TO recipient. Accepts anything that implements [`ToAddress`].
    pub fn to(self, addr: impl ToAddress) -> Result<Self, MailError> {
        self.add(RecipientKind::To, addr)
    }

    /// Add several TO recipients.
    pub fn to_all<T: ToAddress>(
        self,
        addrs: impl IntoIterator<Item = T>,
    ) -> Result<Self, MailError> {
        self.add_all(RecipientKind::To, addrs)
    }

    /// Add TO recipients from parallel email and name lists.
    ///
    /// An empty names list is treated as emails-only; otherwise the lists
    /// must have the same length.
    pub fn to_paired(self, emails: &[&str], names: &[&str]) -> Result<Self, MailError> {
        self.add_paired(RecipientKind::To, emails, names)
    }

    /// Add a CC recipient. Accepts anything that implements [`ToAddress`].
    pub fn cc(self, addr: impl ToAddress) -> Result<Self, MailError> {
        self.add(RecipientKind::Cc, addr)
    }

    /// Add several CC recipients.
    pub fn cc_all<T: ToAddress>(
        self,
        addrs: impl IntoIterator<Item = T>,
    ) -> Result<Self, MailError> {
        self.add_all(RecipientKind::Cc, addrs)
    }

    /// Add CC recipients from parallel email and name lists.
    pub fn cc_paired(self, emails: &[&str], names: &[&str]) -> Result<Self, MailError> {
        self.add_paired(RecipientKind::Cc, emails, names)
    }

    /// Add a BCC recipient. Accepts anything that implements [`ToAddress`].
    pub fn bcc(self, addr: impl ToAddress) -> Result<Self, MailError> {
        self.add(RecipientKind::Bcc, addr)
    }

    /// Add several BCC recipients.
    pub fn bcc_all<T: ToAddress>(
        self,
        addrs: impl IntoIterator<Item = T>,
    ) -> Result<Self, MailError> {
        self.add_all(RecipientKind::Bcc, addrs)
    }

    /// Add BCC recipients from parallel email and name lists.
    pub fn bcc_paired(self, emails: &[&str], names: &[&str]) -> Result<Self, MailError> {
        self.add_paired(RecipientKind::Bcc, emails, names)
    }

    /// The single primitive behind every recipient overload: validates the
    /// address, lowercases and trims it, trims the name to `None` when
    /// blank, and upserts into the per-kind ordered map.
    fn add(mut self, kind: RecipientKind, addr: impl ToAddress) -> Result<Self, MailError> {
        let addr = addr.to_address();
        let email = check_email_address(&addr.email, &kind.to_string())?.to_lowercase();
        let name = addr.name.as_deref().and_then(trim_to_none);
        self.recipients_mut(kind).insert(email, name);
        Ok(self)
    }

    fn add_all<T: ToAddress>(
        mut self,
        kind: RecipientKind,
        addrs: impl IntoIterator<Item = T>,
    ) -> Result<Self, MailError> {
        for addr in addrs {
            self = self.add(kind, addr)?;
        }
        Ok(self)
    }

    fn add_paired(
        mut self,
        kind: RecipientKind,
        emails: &[&str],
        names: &[&str],
    ) -> Result<Self, MailError> {
        if emails.is_empty() {
            return Ok(self);
        }
        if names.is_empty() {
            return self.add_all(kind, emails.iter().copied());
        }
        if names.len() != emails.len() {
            return Err(MailError::InvalidArgument(
                "Names and emails list must have same number of items!".to_string(),
            ));
        }
        for (email, name) in emails.iter().zip(names.iter()) {
            self = self.add(kind, (*name, *email))?;
        }
        Ok(self)
    }

    fn recipients_mut(&mut self, kind: RecipientKind) -> &mut Recipients {
        match kind {
            RecipientKind::To => &mut self.to,
            RecipientKind::Cc => &mut self.cc,
            RecipientKind::Bcc => &mut self.bcc,
        }
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Set the subject. Blank input is ignored; otherwise the trimmed value
    /// overwrites any prior subject.
    pub fn subject(mut self, value: impl AsRef<str>) -> Self {
        if let Some(v) = trim_to_none(value.as_ref()) {
            self.subject = Some(v);
        }
        self
    }

    /// Set the plain text content. Blank input is ignored.
    pub fn content(mut self, value: impl AsRef<str>) -> Self {
        if let Some(v) = trim_to_none(value.as_ref()) {
            self.content = Some(v);
        }
        self
    }

    /// Set the HTML content. Blank input is ignored.
    pub fn html(mut self, value: impl AsRef<str>) -> Self {
        if let Some(v) = trim_to_none(value.as_ref()) {
            self.html = Some(v);
        }
        self
    }

    // ------------------------------------------------------------------
    // Headers, exclusions, attachments, scheduling
    // ------------------------------------------------------------------

    /// Add a custom header. Name and value must be non-blank; both are
    /// stored trimmed, last write wins per name.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, MailError> {
        let name = trim_to_none(name)
            .ok_or_else(|| MailError::InvalidArgument("Missing header name!".to_string()))?;
        let value = trim_to_none(value)
            .ok_or_else(|| MailError::InvalidArgument("Missing header value!".to_string()))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add a map of custom headers.
    pub fn header_map(mut self, headers: &HashMap<String, String>) -> Result<Self, MailError> {
        for (name, value) in headers {
            self = self.header(name, value)?;
        }
        Ok(self)
    }

    /// Exclude an address from delivery.
    ///
    /// The address stays in the recipient maps; at build time any recipient
    /// matching an excluded address is filtered out of the snapshot.
    /// The stored value is trimmed but not lowercased. Duplicates no-op.
    pub fn exclude(mut self, email: &str) -> Result<Self, MailError> {
        let email = check_email_address(email, "excluded")?;
        if !self.excluded.iter().any(|e| *e == email) {
            self.excluded.push(email);
        }
        Ok(self)
    }

    /// Add an attachment from string content. All three parts must be
    /// non-blank; the content is stored as UTF-8 bytes.
    pub fn attachment(
        mut self,
        content: &str,
        file_name: &str,
        mime_type: &str,
    ) -> Result<Self, MailError> {
        let content = trim_to_none(content)
            .ok_or_else(|| MailError::InvalidArgument("Missing attachment content!".to_string()))?;
        let file_name = trim_to_none(file_name).ok_or_else(|| {
            MailError::InvalidArgument("Missing attachment file name!".to_string())
        })?;
        let mime_type = trim_to_none(mime_type).ok_or_else(|| {
            MailError::InvalidArgument("Missing attachment mime type!".to_string())
        })?;

        self.attachments
            .push(Attachment::new(mime_type, content.into_bytes(), file_name));
        Ok(self)
    }

    /// Append prebuilt attachments as-is. Entries are the caller's
    /// responsibility; no per-item validation is performed.
    pub fn attach_all(mut self, list: Vec<Attachment>) -> Self {
        self.attachments.extend(list);
        self
    }

    /// Request delivery at a future time.
    ///
    /// Stored only when strictly in the future at call time; a past or
    /// present timestamp clears any previously stored value. Back-ends that
    /// cannot honor the hint ignore it.
    pub fn send_at(mut self, at: DateTime<Utc>) -> Self {
        self.send_at = if at > Utc::now() { Some(at) } else { None };
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Sender email, if set.
    pub fn from_email(&self) -> Option<&str> {
        self.from_email.as_deref()
    }

    /// Sender display name, if set.
    pub fn sender_name(&self) -> Option<&str> {
        self.from_name.as_deref()
    }

    /// Raw recipient map for a kind, exclusions not applied.
    pub fn recipients(&self, kind: RecipientKind) -> &Recipients {
        match kind {
            RecipientKind::To => &self.to,
            RecipientKind::Cc => &self.cc,
            RecipientKind::Bcc => &self.bcc,
        }
    }

    /// TO recipients with excluded addresses filtered out.
    pub fn to_emails(&self) -> Recipients {
        self.filtered(RecipientKind::To)
    }

    /// CC recipients with excluded addresses filtered out.
    pub fn cc_emails(&self) -> Recipients {
        self.filtered(RecipientKind::Cc)
    }

    /// BCC recipients with excluded addresses filtered out.
    pub fn bcc_emails(&self) -> Recipients {
        self.filtered(RecipientKind::Bcc)
    }

    fn filtered(&self, kind: RecipientKind) -> Recipients {
        let mut out = Recipients::default();
        for (email, name) in self.recipients(kind).iter() {
            if !self.is_excluded(email) {
                out.insert(email.to_string(), name.map(str::to_string));
            }
        }
        out
    }

    /// Whether an address is on the exclusion list (exact match against the
    /// stored, trimmed value).
    pub fn is_excluded(&self, email: &str) -> bool {
        self.excluded.iter().any(|e| e == email)
    }

    /// Excluded addresses in insertion order.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Subject, if set.
    pub fn get_subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Plain text content, if set.
    pub fn get_content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// HTML content, if set.
    pub fn get_html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Custom headers.
    pub fn get_headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Attachments in insertion order.
    pub fn get_attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Requested delivery time, if a future one was stored.
    pub fn get_send_at(&self) -> Option<DateTime<Utc>> {
        self.send_at
    }

    // ------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------

    /// Validate the accumulated state and produce an immutable [`Mail`]
    /// snapshot.
    ///
    /// Fails with [`MailError::MissingData`] when no recipients were ever
    /// added, the TO list is empty or entirely excluded, or the sender,
    /// subject or content is missing.
    pub fn build(&self) -> Result<Mail, MailError> {
        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(MailError::MissingData("No email address given!".to_string()));
        }
        if self.to.is_empty() {
            return Err(MailError::MissingData(
                "Missing to email address(es)!".to_string(),
            ));
        }

        let to = self.filtered_addresses(RecipientKind::To);
        if to.is_empty() {
            return Err(MailError::MissingData(
                "All to email address(es) are excluded!".to_string(),
            ));
        }

        let from_email = self
            .from_email
            .as_deref()
            .and_then(trim_to_none)
            .ok_or_else(|| MailError::MissingData("Missing from email address!".to_string()))?;

        let subject = self
            .subject
            .as_deref()
            .and_then(trim_to_none)
            .ok_or_else(|| MailError::MissingData("Missing email subject!".to_string()))?;

        let content = self.content.as_deref().and_then(trim_to_none);
        let html = self.html.as_deref().and_then(trim_to_none);
        if content.is_none() && html.is_none() {
            return Err(MailError::MissingData("Missing email content!".to_string()));
        }

        Ok(Mail {
            from: Address {
                email: from_email,
                name: self.from_name.clone(),
            },
            to,
            cc: self.filtered_addresses(RecipientKind::Cc),
            bcc: self.filtered_addresses(RecipientKind::Bcc),
            subject,
            content,
            html,
            headers: self.headers.clone(),
            attachments: self.attachments.clone(),
            send_at: self.send_at,
        })
    }

    fn filtered_addresses(&self, kind: RecipientKind) -> Vec<Address> {
        self.recipients(kind)
            .iter()
            .filter(|(email, _)| !self.is_excluded(email))
            .map(|(email, name)| Address {
                email: email.to_string(),
                name: name.map(str::to_string),
            })
            .collect()
    }
}

/// A validated, immutable snapshot of a [`MailMessage`].
///
/// Recipient lists are already exclusion-filtered and keep their insertion
/// order; all text fields are trimmed and non-empty where required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    from: Address,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    subject: String,
    content: Option<String>,
    html: Option<String>,
    headers: HashMap<String, String>,
    attachments: Vec<Attachment>,
    send_at: Option<DateTime<Utc>>,
}

impl Mail {
    /// Sender address. The display name is kept exactly as stored;
    /// renderers that require one fall back to the address itself.
    pub fn from(&self) -> &Address {
        &self.from
    }

    /// Filtered recipients for a kind, in insertion order.
    pub fn recipients(&self, kind: RecipientKind) -> &[Address] {
        match kind {
            RecipientKind::To => &self.to,
            RecipientKind::Cc => &self.cc,
            RecipientKind::Bcc => &self.bcc,
        }
    }

    /// Recipients of a kind joined for display-only formats: each entry
    /// renders as `Name <address>`, or the bare address when it has no
    /// distinct name, joined by `", "`. `None` when the filtered list is
    /// empty.
    pub fn joined(&self, kind: RecipientKind) -> Option<String> {
        let list = self.recipients(kind);
        if list.is_empty() {
            return None;
        }
        Some(
            list.iter()
                .map(Address::formatted)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Subject line.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Plain text content, if set.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// HTML content, if set.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Custom headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Attachments in insertion order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Requested delivery time, if any.
    pub fn send_at(&self) -> Option<DateTime<Utc>> {
        self.send_at
    }
}
