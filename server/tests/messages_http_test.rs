//! HTTP Integration Tests for the producer endpoints
//!
//! Covers validation envelopes, templated payloads, address normalization,
//! number checks and queue introspection.
//!
//! Run with: `cargo test --test messages_http_test -- --nocapture`

mod helpers;

use axum::body::Body;
use axum::http::Method;
use helpers::{RecordingSession, TestApp};
use serde_json::json;
use wa_gateway::templates;

// ============================================================================
// Templated sends
// ============================================================================

#[tokio::test]
async fn test_send_otp_queues_templated_message() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/send-otp", json!({ "number": "08123456789", "otp": "123456" }))
        .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "status": "success", "message": "OTP queued for sending" })
    );

    app.drain().await;
    assert_eq!(
        app.session.sent(),
        vec![("628123456789@c.us".to_string(), templates::otp("123456"))]
    );
}

#[tokio::test]
async fn test_send_otp_accepts_numeric_code() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/send-otp", json!({ "number": 8123456789_u64, "otp": 123456 }))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");

    app.drain().await;
    // A numeric number has no leading zero to rewrite.
    assert_eq!(
        app.session.sent(),
        vec![("8123456789@c.us".to_string(), templates::otp("123456"))]
    );
}

#[tokio::test]
async fn test_send_reset_password_uses_camel_case_link() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/send-reset-password",
            json!({ "number": "0812", "resetLink": "https://example.test/r/abc" }),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "Reset password link queued for sending");

    app.drain().await;
    assert_eq!(
        app.session.sent(),
        vec![(
            "62812@c.us".to_string(),
            templates::reset_password("https://example.test/r/abc")
        )]
    );
}

#[tokio::test]
async fn test_send_notification_prefixes_message() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/send-notification",
            json!({ "number": "08111", "message": "Pesanan dikirim" }),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "Notification queued for sending");

    app.drain().await;
    assert_eq!(
        app.session.sent(),
        vec![("628111@c.us".to_string(), "Notifikasi: Pesanan dikirim".to_string())]
    );
}

#[tokio::test]
async fn test_send_message_passes_text_through() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/send-message",
            json!({ "number": "6281234", "message": "raw text" }),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "Message queued for sending");

    app.drain().await;
    // Numbers without a leading zero are used as-is.
    assert_eq!(
        app.session.sent(),
        vec![("6281234@c.us".to_string(), "raw text".to_string())]
    );
}

#[tokio::test]
async fn test_sends_are_delivered_in_request_order() {
    let app = TestApp::new();

    for i in 0..5 {
        let (status, _) = app
            .post_json(
                "/api/send-message",
                json!({ "number": "0811", "message": format!("msg-{i}") }),
            )
            .await;
        assert_eq!(status, 200);
    }

    app.drain().await;
    let payloads: Vec<String> = app.session.sent().into_iter().map(|(_, p)| p).collect();
    assert_eq!(payloads, vec!["msg-0", "msg-1", "msg-2", "msg-3", "msg-4"]);
}

#[tokio::test]
async fn test_delivery_failure_does_not_affect_response() {
    let app = TestApp::new();
    app.session.set_offline(true);

    let (status, body) = app
        .post_json("/api/send-message", json!({ "number": "0811", "message": "hi" }))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");

    app.drain().await;
    assert!(app.session.sent().is_empty());
    assert_eq!(app.queue.stats().failed(), 1);
    assert_eq!(app.queue.stats().sent(), 0);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_fields_return_error_envelope() {
    let app = TestApp::new();

    let cases = [
        ("/api/send-otp", json!({ "number": "0812" }), "Number and OTP required"),
        ("/api/send-otp", json!({ "otp": "1234" }), "Number and OTP required"),
        (
            "/api/send-reset-password",
            json!({ "number": "0812", "reset_link": "https://x" }),
            "Number and reset link required",
        ),
        (
            "/api/send-notification",
            json!({ "message": "hello" }),
            "Number and message required",
        ),
        ("/api/send-message", json!({}), "Number and message required"),
    ];

    for (uri, payload, message) in cases {
        let (status, body) = app.post_json(uri, payload).await;
        assert_eq!(status, 400, "{uri}");
        assert_eq!(body, json!({ "status": "error", "message": message }), "{uri}");
    }

    assert_eq!(app.queue.stats().enqueued(), 0);
}

#[tokio::test]
async fn test_empty_strings_count_as_missing() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/send-otp", json!({ "number": "", "otp": "1234" }))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["message"], "Number and OTP required");
    assert_eq!(app.queue.pending(), 0);
}

#[tokio::test]
async fn test_null_field_counts_as_missing() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/send-message", json!({ "number": "0812", "message": null }))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["message"], "Number and message required");
}

#[tokio::test]
async fn test_body_without_json_content_type_reports_missing_fields() {
    let app = TestApp::new();

    let req = TestApp::request(Method::POST, "/api/send-otp")
        .body(Body::from(r#"{"number":"0812","otp":"1234"}"#))
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(
        helpers::body_to_json(resp).await,
        json!({ "status": "error", "message": "Number and OTP required" })
    );
    assert_eq!(app.queue.stats().enqueued(), 0);
}

#[tokio::test]
async fn test_empty_json_body_reports_missing_fields() {
    let app = TestApp::new();

    let req = TestApp::request(Method::POST, "/api/send-reset-password")
        .header("Content-Type", "application/json")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(
        helpers::body_to_json(resp).await,
        json!({ "status": "error", "message": "Number and reset link required" })
    );
}

#[tokio::test]
async fn test_malformed_json_returns_error_envelope() {
    let app = TestApp::new();

    let req = TestApp::request(Method::POST, "/api/send-message")
        .header("Content-Type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let resp = app.oneshot(req).await;

    assert_eq!(resp.status(), 400);
    let body = helpers::body_to_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
    assert_eq!(app.queue.stats().enqueued(), 0);
}

// ============================================================================
// Number checks
// ============================================================================

#[tokio::test]
async fn test_check_number_registered() {
    let app = TestApp::with_session(RecordingSession::with_registered(&["628123@c.us"]));

    let (status, body) = app.get_json("/api/check-number/08123").await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "status": "success", "registered": true, "number": "08123" })
    );
}

#[tokio::test]
async fn test_check_number_unregistered() {
    let app = TestApp::with_session(RecordingSession::with_registered(&["628123@c.us"]));

    let (status, body) = app.get_json("/api/check-number/0899").await;

    assert_eq!(status, 200);
    assert_eq!(body["registered"], false);
    assert_eq!(body["number"], "0899");
}

#[tokio::test]
async fn test_check_number_session_error_returns_500() {
    let app = TestApp::new();
    app.session.set_offline(true);

    let (status, body) = app.get_json("/api/check-number/08123").await;

    assert_eq!(status, 500);
    assert_eq!(body["status"], "error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("session not ready"));
}

#[tokio::test]
async fn test_check_number_does_not_touch_queue() {
    let app = TestApp::new();

    let (status, _) = app.get_json("/api/check-number/08123").await;

    assert_eq!(status, 200);
    assert_eq!(app.queue.stats().enqueued(), 0);
    assert!(app.session.sent().is_empty());
}

// ============================================================================
// System endpoints
// ============================================================================

#[tokio::test]
async fn test_queue_status_reports_counters() {
    let app = TestApp::new();

    app.post_json("/api/send-message", json!({ "number": "0811", "message": "a" }))
        .await;
    app.post_json("/api/send-message", json!({ "number": "0811", "message": "b" }))
        .await;
    app.drain().await;

    let (status, body) = app.get_json("/api/queue").await;

    assert_eq!(status, 200);
    assert_eq!(body["pending"], 0);
    assert_eq!(body["draining"], false);
    assert_eq!(body["enqueued"], 2);
    assert_eq!(body["sent"], 2);
    assert_eq!(body["failed"], 0);
    assert!(body["last_attempt_at"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app.get_json("/health").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["subscribers"], 0);
    assert_eq!(body["queue_pending"], 0);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();

    let (status, body) = app.get_json("/api-docs/openapi.json").await;

    assert_eq!(status, 200);
    assert!(body["paths"]["/api/send-otp"].is_object());
    assert!(body["paths"]["/api/check-number/{number}"].is_object());
}
