//! Webhook client behaviour against a local stub workflow.
//!
//! Each test binds an Axum router to an ephemeral port and points a
//! `WebhookClient` at one of its routes.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use mergesense_core::config::WebhookConfig;
use mergesense_core::errors::WebhookError;
use mergesense_core::response::{ResolutionStatus, ResponseNormalizer};
use mergesense_core::webhook::{WebhookClient, WebhookRequest};

// ===========================================================================
// Helpers
// ===========================================================================

fn stub_router() -> Router {
    Router::new()
        .route(
            "/json",
            post(|Json(body): Json<Value>| async move {
                Json(json!([{
                    "mergedCode": format!("merged {}", body["fileName"].as_str().unwrap_or("")),
                    "confidence": 0.92,
                    "explanation": "Combined both sides"
                }]))
            }),
        )
        .route(
            "/echo-auth",
            post(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                Json(json!({ "mergedCode": auth, "confidence": 1.0 }))
            }),
        )
        .route("/text", post(|| async { "plain merged text" }))
        .route(
            "/html",
            post(|| async { "<html><body><h1>502 Bad Gateway</h1></body></html>" }),
        )
        .route("/json-string", post(|| async { Json(json!("plain merged text")) }))
        .route("/empty", post(|| async { StatusCode::OK }))
        .route("/unauthorized", post(|| async { StatusCode::UNAUTHORIZED }))
        .route("/forbidden", post(|| async { StatusCode::FORBIDDEN }))
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "workflow crashed") }),
        )
        .route("/teapot", post(|| async { StatusCode::IM_A_TEAPOT }))
        .route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(2000)).await;
                "late"
            }),
        )
}

async fn spawn_stub() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub_router()).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(url: String, api_key: Option<&str>, timeout_ms: u64) -> WebhookClient {
    let config = WebhookConfig {
        url,
        api_key: api_key.map(str::to_string),
        timeout_ms,
        ..WebhookConfig::default()
    };
    WebhookClient::new(&config).unwrap()
}

fn request() -> WebhookRequest {
    WebhookRequest::new(
        "app.ts",
        "<<<<<<< HEAD\na\n=======\nb\n>>>>>>> feature",
    )
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn resolves_json_reply() {
    let base = spawn_stub().await;
    let client = client(format!("{}/json", base), None, 5000);

    let result = client
        .resolve("app.ts", "conflict", &ResponseNormalizer::default())
        .await
        .unwrap();
    assert_eq!(result.status, ResolutionStatus::Success);
    assert_eq!(result.merged_code, "merged app.ts");
    assert_eq!(result.explanation, "Combined both sides");
    assert_eq!(result.file_name.as_deref(), Some("app.ts"));
}

#[tokio::test]
async fn sends_bearer_key_when_configured() {
    let base = spawn_stub().await;

    let with_key = client(format!("{}/echo-auth", base), Some(" sk-test "), 5000);
    let body = with_key.send(&request()).await.unwrap();
    assert_eq!(body["mergedCode"], "Bearer sk-test");

    let blank_key = client(format!("{}/echo-auth", base), Some("  "), 5000);
    let body = blank_key.send(&request()).await.unwrap();
    assert_eq!(body["mergedCode"], "none");
}

#[tokio::test]
async fn non_json_reply_is_rejected() {
    let base = spawn_stub().await;

    let text = client(format!("{}/text", base), None, 5000);
    let err = text.send(&request()).await.unwrap_err();
    assert!(matches!(err, WebhookError::InvalidBody { .. }));

    let html = client(format!("{}/html", base), None, 5000);
    let err = html
        .resolve("app.ts", "conflict", &ResponseNormalizer::default())
        .await
        .unwrap_err();
    match err {
        WebhookError::InvalidBody { body, .. } => assert!(body.contains("502 Bad Gateway")),
        other => panic!("expected InvalidBody, got {other:?}"),
    }
}

#[tokio::test]
async fn json_string_reply_is_text_payload() {
    let base = spawn_stub().await;
    let client = client(format!("{}/json-string", base), None, 5000);

    assert_eq!(client.send(&request()).await.unwrap(), json!("plain merged text"));
    let result = client
        .resolve("app.ts", "conflict", &ResponseNormalizer::default())
        .await
        .unwrap();
    assert_eq!(result.status, ResolutionStatus::Success);
    assert_eq!(result.merged_code, "plain merged text");
}

#[tokio::test]
async fn empty_reply_is_ai_failure() {
    let base = spawn_stub().await;
    let client = client(format!("{}/empty", base), None, 5000);

    assert_eq!(client.send(&request()).await.unwrap(), Value::Null);
    let result = client
        .resolve("app.ts", "conflict", &ResponseNormalizer::default())
        .await
        .unwrap();
    assert_eq!(result.status, ResolutionStatus::AiFailed);
}

#[tokio::test]
async fn auth_failures_are_classified() {
    let base = spawn_stub().await;
    for (path, code) in [("unauthorized", 401), ("forbidden", 403)] {
        let err = client(format!("{}/{}", base, path), Some("k"), 5000)
            .send(&request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, WebhookError::AuthenticationFailed { status } if status == code),
            "{path}: {err}"
        );
    }
}

#[tokio::test]
async fn missing_route_is_not_found() {
    let base = spawn_stub().await;
    let err = client(format!("{}/nope", base), None, 5000)
        .send(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::NotFound { ref url } if url.ends_with("/nope")));
}

#[tokio::test]
async fn server_errors_carry_body() {
    let base = spawn_stub().await;
    let err = client(format!("{}/broken", base), None, 5000)
        .send(&request())
        .await
        .unwrap_err();
    match err {
        WebhookError::ServerError { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "workflow crashed");
        }
        other => panic!("expected ServerError, got {other:?}"),
    }

    let err = client(format!("{}/teapot", base), None, 5000)
        .send(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::UnexpectedStatus { status: 418, .. }));
}

#[tokio::test]
async fn slow_workflow_times_out() {
    let base = spawn_stub().await;
    let err = client(format!("{}/slow", base), None, 100)
        .send(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::Timeout { timeout_ms: 100 }), "{err}");
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{}/hook", addr), None, 5000)
        .send(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::Unreachable { .. }), "{err}");
    assert!(err.to_string().contains("service is running"));
}
