//! MIME rendering of a [`Mail`] snapshot for the SMTP path.

use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::address::Address;
use crate::error::MailError;
use crate::message::{Mail, RecipientKind};

/// Render a validated snapshot into a MIME message ready for the SMTP
/// transport.
///
/// Body layout:
/// - no attachments and exactly one of text/html set: a single-part body
///   with the matching `text/plain` or `text/html` content type;
/// - otherwise a flat `multipart/mixed` with parts in fidelity-ascending
///   order: text, then html, then attachments in insertion order.
///
/// Any error from the MIME library is wrapped into
/// [`MailError::BuildFailed`].
pub fn render(mail: &Mail) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(mailbox(mail.from())?)
        .subject(mail.subject());

    for to in mail.recipients(RecipientKind::To) {
        builder = builder.to(mailbox(to)?);
    }
    for cc in mail.recipients(RecipientKind::Cc) {
        builder = builder.cc(mailbox(cc)?);
    }
    for bcc in mail.recipients(RecipientKind::Bcc) {
        builder = builder.bcc(mailbox(bcc)?);
    }

    let mut message = match (mail.attachments().is_empty(), mail.content(), mail.html()) {
        // single-part fast path: no attachments, exactly one body
        (true, Some(text), None) => builder
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())?,
        (true, None, Some(html)) => builder
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?,
        _ => {
            // fidelity-ascending: text, then html, then attachments
            let mut parts: Vec<SinglePart> = Vec::new();

            if let Some(text) = mail.content() {
                parts.push(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text.to_string()),
                );
            }
            if let Some(html) = mail.html() {
                parts.push(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.to_string()),
                );
            }
            for attachment in mail.attachments() {
                let content_type: ContentType =
                    attachment.content_type().parse().map_err(|_| {
                        MailError::BuildFailed(format!(
                            "invalid attachment content type '{}'",
                            attachment.content_type()
                        ))
                    })?;
                parts.push(
                    MimeAttachment::new(attachment.filename().to_string())
                        .body(attachment.data().to_vec(), content_type),
                );
            }

            let mut multipart: Option<MultiPart> = None;
            for part in parts {
                multipart = Some(match multipart {
                    None => MultiPart::mixed().singlepart(part),
                    Some(existing) => existing.singlepart(part),
                });
            }
            let multipart = multipart
                .ok_or_else(|| MailError::MissingData("Missing email content!".to_string()))?;
            builder.multipart(multipart)?
        }
    };

    for (name, value) in mail.headers() {
        let header_name = HeaderName::new_from_ascii(name.clone()).map_err(|_| {
            MailError::BuildFailed(format!("invalid header name '{}'", name))
        })?;
        message
            .headers_mut()
            .insert_raw(HeaderValue::new(header_name, value.clone()));
    }

    Ok(message)
}

/// Convert an [`Address`] to a lettre mailbox, defaulting the display name
/// to the address itself and converting IDN domains to ASCII.
fn mailbox(addr: &Address) -> Result<Mailbox, MailError> {
    let email = addr.to_ascii()?.parse()?;
    Ok(Mailbox::new(Some(addr.display_name().to_string()), email))
}
