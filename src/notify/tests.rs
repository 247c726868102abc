//! Tests for notification channels

use super::*;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_brevo_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .and(header("api-key", "brevo-key"))
        .and(body_partial_json(serde_json::json!({
            "sender": {"email": "alerts@example.com", "name": "Listing Watch"},
            "to": [{"email": "a@example.com"}, {"email": "b@example.com"}],
            "subject": "New Internship Listings - Label",
            "textContent": "body"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"messageId": "<id>"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = BrevoNotifier::with_base_url(
        mock_server.uri(),
        "brevo-key",
        "alerts@example.com",
        Some("Listing Watch".to_string()),
    )
    .unwrap();

    notifier
        .send(
            &["a@example.com".to_string(), "b@example.com".to_string()],
            "New Internship Listings - Label",
            "body",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_brevo_rejected_request_is_delivery_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Key not found"))
        .mount(&mock_server)
        .await;

    let notifier =
        BrevoNotifier::with_base_url(mock_server.uri(), "bad", "alerts@example.com", None)
            .unwrap();

    let err = notifier
        .send(&["a@example.com".to_string()], "s", "b")
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Api(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_brevo_server_error_is_sent_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier =
        BrevoNotifier::with_base_url(mock_server.uri(), "brevo-key", "alerts@example.com", None)
            .unwrap();

    let err = notifier
        .send(&["a@example.com".to_string()], "s", "b")
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Api(_)));
    mock_server.verify().await;
}

#[tokio::test]
async fn test_log_notifier_always_succeeds() {
    let notifier = LogNotifier;
    notifier
        .send(&["a@example.com".to_string()], "subject", "body")
        .await
        .unwrap();
    assert_eq!(notifier.channel_name(), "log");
}

#[test]
fn test_delivery_mode_serde() {
    let mode: DeliveryMode = serde_yaml::from_str("batch").unwrap();
    assert_eq!(mode, DeliveryMode::Batch);

    let mode: DeliveryMode = serde_yaml::from_str("per_recipient").unwrap();
    assert_eq!(mode, DeliveryMode::PerRecipient);

    assert_eq!(DeliveryMode::default(), DeliveryMode::PerRecipient);
}
