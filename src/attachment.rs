//! Mail attachments.

use serde::{Deserialize, Serialize};

/// A mail attachment: a mime type, raw bytes, and a file name.
///
/// Immutable once constructed. Attachments only travel over the SMTP/MIME
/// path; the HTTP API back-ends do not carry them.
///
/// # Examples
///
/// ```
/// use courriel::Attachment;
///
/// let report = Attachment::new("application/pdf", b"PDF content".to_vec(), "report.pdf");
///
/// // Content type guessed from the filename extension
/// let logo = Attachment::from_bytes("logo.png", vec![0x89, 0x50, 0x4E, 0x47]);
/// assert_eq!(logo.content_type(), "image/png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    content_type: String,
    data: Vec<u8>,
    filename: String,
}

impl Attachment {
    /// Create a new attachment from an explicit mime type, raw bytes and a
    /// file name.
    pub fn new(
        content_type: impl Into<String>,
        data: Vec<u8>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            data,
            filename: filename.into(),
        }
    }

    /// Create a new attachment from raw bytes, guessing the content type
    /// from the filename extension.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();

        Self {
            content_type,
            data,
            filename,
        }
    }

    /// MIME content type (e.g., "application/pdf", "image/png").
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw attachment bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Attachment file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
