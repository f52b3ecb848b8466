//! SendGrid adapter tests.

use chrono::{Duration, Utc};
use courriel::providers::SendGridMailer;
use courriel::{Address, MailError, MailMessage, MailService};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn mailer(server: &MockServer) -> SendGridMailer {
    SendGridMailer::new("SG.test-api-key", Address::new("fallback@example.com"))
        .unwrap()
        .base_url(server.uri())
}

fn valid_message() -> MailMessage {
    MailMessage::new()
        .from("tony.stark@example.com")
        .unwrap()
        .to("steve.rogers@example.com")
        .unwrap()
        .subject("Hello, Avengers!")
        .content("Hello")
}

fn success_response() -> ResponseTemplate {
    ResponseTemplate::new(202).insert_header("X-Message-Id", "123-xyz")
}

// ============================================================================
// Basic Delivery Tests
// ============================================================================

#[tokio::test]
async fn successful_delivery_returns_ok_with_message_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(header("Authorization", "Bearer SG.test-api-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "personalizations": [{"to": [{"email": "steve.rogers@example.com"}]}],
            "from": {"email": "tony.stark@example.com"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/plain", "value": "Hello"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(result.is_successful());
    assert_eq!(result.message(), Some("123-xyz"));
}

#[tokio::test]
async fn missing_message_id_header_still_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(result.is_successful());
    assert_eq!(result.message(), None);
}

#[tokio::test]
async fn text_wins_over_html_for_the_single_content_block() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(body_json(json!({
            "personalizations": [{"to": [{"email": "steve.rogers@example.com"}]}],
            "from": {"email": "tony.stark@example.com"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/plain", "value": "Hello"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = valid_message().html("<h1>Hello</h1>");
    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn html_only_sends_html_content_block() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(body_json(json!({
            "personalizations": [{"to": [{"email": "steve.rogers@example.com"}]}],
            "from": {"email": "tony.stark@example.com"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/html", "value": "<h1>Hello</h1>"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = MailMessage::new()
        .from("tony.stark@example.com")
        .unwrap()
        .to("steve.rogers@example.com")
        .unwrap()
        .subject("Hello, Avengers!")
        .html("<h1>Hello</h1>");

    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn recipients_carry_names_and_kinds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(body_json(json!({
            "personalizations": [{
                "to": [{"email": "steve.rogers@example.com", "name": "Steve Rogers"}],
                "cc": [{"email": "hulk.smash@example.com"}],
                "bcc": [{"email": "thor.odinson@example.com", "name": "Thor"}]
            }],
            "from": {"email": "tony.stark@example.com", "name": "T Stark"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/plain", "value": "Hello"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = MailMessage::new()
        .from(("T Stark", "tony.stark@example.com"))
        .unwrap()
        .to(("Steve Rogers", "steve.rogers@example.com"))
        .unwrap()
        .cc("hulk.smash@example.com")
        .unwrap()
        .bcc(("Thor", "thor.odinson@example.com"))
        .unwrap()
        .subject("Hello, Avengers!")
        .content("Hello");

    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn excluded_recipients_never_reach_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(body_json(json!({
            "personalizations": [{"to": [{"email": "kept@example.com"}]}],
            "from": {"email": "tony.stark@example.com"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/plain", "value": "Hello"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = MailMessage::new()
        .from("tony.stark@example.com")
        .unwrap()
        .to("kept@example.com")
        .unwrap()
        .to("gone@example.com")
        .unwrap()
        .cc("gone2@example.com")
        .unwrap()
        .exclude("gone@example.com")
        .unwrap()
        .exclude("gone2@example.com")
        .unwrap()
        .subject("Hello, Avengers!")
        .content("Hello");

    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn send_at_is_forwarded_as_epoch_seconds() {
    let server = MockServer::start().await;
    let at = Utc::now() + Duration::hours(6);

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(body_json(json!({
            "personalizations": [{
                "to": [{"email": "steve.rogers@example.com"}],
                "send_at": at.timestamp()
            }],
            "from": {"email": "tony.stark@example.com"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/plain", "value": "Hello"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = valid_message().send_at(at);
    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

// ============================================================================
// Default Sender Tests
// ============================================================================

#[tokio::test]
async fn configured_sender_fills_in_when_from_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(body_json(json!({
            "personalizations": [{"to": [{"email": "steve.rogers@example.com"}]}],
            "from": {"email": "fallback@example.com"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/plain", "value": "Hello"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = MailMessage::new()
        .to("steve.rogers@example.com")
        .unwrap()
        .subject("Hello, Avengers!")
        .content("Hello");

    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn explicit_sender_is_not_clobbered() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .and(body_json(json!({
            "personalizations": [{"to": [{"email": "steve.rogers@example.com"}]}],
            "from": {"email": "tony.stark@example.com"},
            "subject": "Hello, Avengers!",
            "content": [{"type": "text/plain", "value": "Hello"}]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(result.is_successful());
}

// ============================================================================
// Error Response Tests
// ============================================================================

#[tokio::test]
async fn rejected_request_becomes_a_failed_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"errors":[{"message":"error message explained"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(!result.is_successful());
    assert!(result.message().unwrap().contains("error message explained"));
}

#[tokio::test]
async fn server_error_becomes_a_failed_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .respond_with(ResponseTemplate::new(500).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(!result.is_successful());
}

#[tokio::test]
async fn unreachable_server_becomes_a_failed_result() {
    let mailer = SendGridMailer::new("SG.test-api-key", Address::new("fallback@example.com"))
        .unwrap()
        .base_url("http://127.0.0.1:1");

    let result = mailer.send(valid_message()).await.unwrap();
    assert!(!result.is_successful());
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn api_key_looking_content_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(success_response())
        .expect(0)
        .mount(&server)
        .await;

    let message = valid_message().content("here is a secret: SG.abc-123.def_456 oops");
    let err = mailer(&server).send(message).await.unwrap_err();
    assert!(matches!(err, MailError::InvalidArgument(_)));

    // same filter applies to the html body
    let message = MailMessage::new()
        .from("tony.stark@example.com")
        .unwrap()
        .to("steve.rogers@example.com")
        .unwrap()
        .subject("Hello")
        .html("<p>SG.abc.def</p>");
    let err = mailer(&server).send(message).await.unwrap_err();
    assert!(matches!(err, MailError::InvalidArgument(_)));
}

#[tokio::test]
async fn structurally_incomplete_messages_fail_fast() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(success_response())
        .expect(0)
        .mount(&server)
        .await;

    // no recipients at all
    let message = MailMessage::new().subject("Hello").content("Hi");
    let err = mailer(&server).send(message).await.unwrap_err();
    assert!(matches!(err, MailError::MissingData(_)));

    // recipients but no subject
    let message = MailMessage::new()
        .from("tony.stark@example.com")
        .unwrap()
        .to("steve.rogers@example.com")
        .unwrap()
        .content("Hi");
    let err = mailer(&server).send(message).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing email subject!");
}

// ============================================================================
// Provider Name Test
// ============================================================================

#[test]
fn provider_name_returns_sendgrid() {
    let mailer =
        SendGridMailer::new("SG.test-api-key", Address::new("fallback@example.com")).unwrap();
    assert_eq!(mailer.provider_name(), "sendgrid");
}
