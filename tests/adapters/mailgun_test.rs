//! Mailgun adapter tests.

use chrono::{Duration, Utc};
use courriel::providers::MailgunMailer;
use courriel::{Address, MailError, MailMessage, MailService};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

/// Matches a form-urlencoded body containing every expected pair and none of
/// the forbidden keys.
struct FormBody {
    pairs: Vec<(&'static str, String)>,
    absent: Vec<&'static str>,
}

impl FormBody {
    fn with(pairs: Vec<(&'static str, &str)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect(),
            absent: Vec::new(),
        }
    }

    fn without(mut self, keys: Vec<&'static str>) -> Self {
        self.absent = keys;
        self
    }
}

impl Match for FormBody {
    fn matches(&self, request: &Request) -> bool {
        let parsed: Vec<(String, String)> = match serde_urlencoded::from_bytes(&request.body) {
            Ok(pairs) => pairs,
            Err(_) => return false,
        };

        self.pairs
            .iter()
            .all(|(key, value)| parsed.iter().any(|(k, v)| k == key && v == value))
            && self
                .absent
                .iter()
                .all(|key| !parsed.iter().any(|(k, _)| k == key))
    }
}

fn mailer(server: &MockServer) -> MailgunMailer {
    MailgunMailer::new(
        "fake-api-key",
        "avengers.com",
        Address::new("fallback@avengers.com"),
    )
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
    ResponseTemplate::new(200).set_body_json(json!({
        "message": "Queued. Thank you.",
        "id": "<20111114174239.25659.5817@samples.mailgun.org>"
    }))
}

// ============================================================================
// Basic Delivery Tests
// ============================================================================

#[tokio::test]
async fn successful_delivery_returns_message_id() {
    let server = MockServer::start().await;

    // Mailgun uses Basic auth with "api:key" format
    let expected_auth = format!(
        "Basic {}",
        base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            "api:fake-api-key"
        )
    );

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .and(header("Authorization", expected_auth.as_str()))
        .and(header(
            "Content-Type",
            "application/x-www-form-urlencoded",
        ))
        .and(FormBody::with(vec![
            ("from", "tony.stark@example.com"),
            ("to", "steve.rogers@example.com"),
            ("subject", "Hello, Avengers!"),
            ("text", "Hello"),
        ]))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(result.is_successful());
    assert_eq!(
        result.message(),
        Some("<20111114174239.25659.5817@samples.mailgun.org>")
    );
}

#[tokio::test]
async fn all_fields_render_into_the_form_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .and(FormBody::with(vec![
            ("from", "T Stark <tony.stark@example.com>"),
            (
                "to",
                "Steve Rogers <steve.rogers@example.com>, wasp.avengers@example.com",
            ),
            ("cc", "Bruce Banner <hulk.smash@example.com>"),
            ("bcc", "hawk.eye@example.com"),
            ("subject", "Hello, Avengers!"),
            ("text", "Hello"),
            ("html", "<h1>Hello</h1>"),
        ]))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = MailMessage::new()
        .from(("T Stark", "tony.stark@example.com"))
        .unwrap()
        .to(("Steve Rogers", "steve.rogers@example.com"))
        .unwrap()
        .to("wasp.avengers@example.com")
        .unwrap()
        .cc(("Bruce Banner", "hulk.smash@example.com"))
        .unwrap()
        .bcc("hawk.eye@example.com")
        .unwrap()
        .subject("Hello, Avengers!")
        .content("Hello")
        .html("<h1>Hello</h1>");

    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn excluded_recipients_are_dropped_from_the_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .and(
            FormBody::with(vec![("to", "kept@example.com")]).without(vec!["cc", "bcc"]),
        )
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

// ============================================================================
// Delivery Time Tests
// ============================================================================

#[tokio::test]
async fn near_future_send_at_becomes_deliverytime() {
    let server = MockServer::start().await;
    let at = Utc::now() + Duration::hours(6);

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .and(FormBody::with(vec![(
            "o:deliverytime",
            at.to_rfc2822().as_str(),
        )]))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = valid_message().send_at(at);
    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn send_at_beyond_the_window_is_not_forwarded() {
    let server = MockServer::start().await;
    let at = Utc::now() + Duration::hours(100);

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .and(FormBody::with(vec![("to", "steve.rogers@example.com")])
            .without(vec!["o:deliverytime"]))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let message = valid_message().send_at(at);
    let result = mailer(&server).send(message).await.unwrap();
    assert!(result.is_successful());
}

// ============================================================================
// Response Handling Tests
// ============================================================================

#[tokio::test]
async fn unparseable_success_body_degrades_to_ok_without_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(result.is_successful());
    assert_eq!(result.message(), None);
}

#[tokio::test]
async fn non_200_response_becomes_a_failed_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let result = mailer(&server).send(valid_message()).await.unwrap();
    assert!(!result.is_successful());
    assert_eq!(result.status(), 400);
    assert_eq!(result.message(), None);
}

#[tokio::test]
async fn unreachable_server_becomes_a_failed_result() {
    let mailer = MailgunMailer::new(
        "fake-api-key",
        "avengers.com",
        Address::new("fallback@avengers.com"),
    )
    .unwrap()
    .base_url("http://127.0.0.1:1");

    let result = mailer.send(valid_message()).await.unwrap();
    assert!(!result.is_successful());
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn incomplete_message_fails_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(success_response())
        .expect(0)
        .mount(&server)
        .await;

    let message = MailMessage::new()
        .from("tony.stark@example.com")
        .unwrap()
        .subject("Hello")
        .content("Hi");
    let err = mailer(&server).send(message).await.unwrap_err();
    assert!(matches!(err, MailError::MissingData(_)));
}

#[tokio::test]
async fn default_sender_applies_when_from_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/avengers.com/messages"))
        .and(FormBody::with(vec![("from", "fallback@avengers.com")]))
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

// ============================================================================
// Provider Name Test
// ============================================================================

#[test]
fn provider_name_returns_mailgun() {
    let mailer = MailgunMailer::new(
        "fake-api-key",
        "avengers.com",
        Address::new("fallback@avengers.com"),
    )
    .unwrap();
    assert_eq!(mailer.provider_name(), "mailgun");
}
