//! SMTP adapter tests.
//!
//! Delivery itself needs a live relay; these tests cover construction, the
//! fail-fast validation path, and failure normalization when no server is
//! listening.

use courriel::providers::{SmtpMailer, TlsMode};
use courriel::{MailError, MailMessage, MailService};

fn valid_message() -> MailMessage {
    MailMessage::new()
        .from("tony.stark@example.com")
        .unwrap()
        .to("steve.rogers@example.com")
        .unwrap()
        .subject("Hello, Avengers!")
        .content("Hello")
}

#[test]
fn builder_constructs_all_tls_modes() {
    let _ = SmtpMailer::new("smtp.example.com", 587)
        .credentials("user", "pass")
        .build();
    let _ = SmtpMailer::new("smtp.example.com", 465)
        .tls(TlsMode::Tls)
        .build();
    let _ = SmtpMailer::new("localhost", 25).no_tls().build();
    let _ = SmtpMailer::localhost();
}

#[tokio::test]
async fn incomplete_message_fails_before_connecting() {
    let mailer = SmtpMailer::new("smtp.example.com", 587).build();

    let message = MailMessage::new()
        .to("steve.rogers@example.com")
        .unwrap()
        .subject("Hello")
        .content("Hi");

    let err = mailer.send(message).await.unwrap_err();
    assert!(matches!(err, MailError::MissingData(_)));
    assert_eq!(err.to_string(), "Missing from email address!");
}

#[tokio::test]
async fn connection_refused_becomes_a_failed_result() {
    // nothing listens on port 1
    let mailer = SmtpMailer::new("127.0.0.1", 1).no_tls().build();

    let result = mailer.send(valid_message()).await.unwrap();
    assert!(!result.is_successful());
}

#[test]
fn provider_name_returns_smtp() {
    let mailer = SmtpMailer::localhost();
    assert_eq!(mailer.provider_name(), "smtp");
}
