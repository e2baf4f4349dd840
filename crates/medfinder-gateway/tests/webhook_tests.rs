// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode};
use tower::ServiceExt;

use medfinder_core::{INBOUND_QUEUE, InboundMessage, MessageKind, Provider};
use medfinder_gateway::{GatewayState, router};
use medfinder_test_utils::MockQueue;
use medfinder_whatsapp::signature::{
    META_SIGNATURE_HEADER, SIGNATURE_HEADER, TWILIO_SIGNATURE_HEADER, sign_sha256, sign_twilio,
};
use medfinder_whatsapp::{GenericWebhook, InboundWebhook, MetaWebhook, TwilioWebhook};

const PATH: &str = "/webhook/whatsapp";
const APP_SECRET: &str = "meta-app-secret";

fn app(webhook: Arc<dyn InboundWebhook>, queue: Arc<MockQueue>) -> Router {
    let state = GatewayState::new(
        webhook,
        queue,
        Some("verify-me".into()),
        Some("https://pharmacy.example.com".into()),
    );
    router(PATH, state)
}

fn meta_app(queue: Arc<MockQueue>) -> Router {
    app(Arc::new(MetaWebhook::new(APP_SECRET.into())), queue)
}

fn meta_text_body() -> Vec<u8> {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "value": {
                    "contacts": [{"profile": {"name": "Amal"}}],
                    "messages": [{
                        "id": "wamid.ABC",
                        "from": "201001234567",
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": "هل يتوفر بنادول"}
                    }]
                }
            }]
        }]
    })
    .to_string()
    .into_bytes()
}

fn post(body: Vec<u8>, signature: Option<(&str, String)>) -> Request<Body> {
    let mut builder = Request::post(PATH).header("content-type", "application/json");
    if let Some((name, value)) = signature {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn verification_echoes_challenge() {
    let response = meta_app(Arc::new(MockQueue::default()))
        .oneshot(
            Request::get(format!(
                "{PATH}?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"1158201444");
}

#[tokio::test]
async fn verification_with_wrong_token_is_forbidden() {
    let response = meta_app(Arc::new(MockQueue::default()))
        .oneshot(
            Request::get(format!(
                "{PATH}?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn signed_meta_message_is_queued() {
    let queue = Arc::new(MockQueue::default());
    let body = meta_text_body();
    let signature = sign_sha256(APP_SECRET.as_bytes(), &body);

    let response = meta_app(queue.clone())
        .oneshot(post(body, Some((META_SIGNATURE_HEADER, signature))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    insta::assert_json_snapshot!(json_body(response).await, @r#"
    {
      "status": "queued"
    }
    "#);

    let entries = queue.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].queue_name, INBOUND_QUEUE);
    let message: InboundMessage = serde_json::from_str(&entries[0].payload).unwrap();
    assert_eq!(message.message_id, "wamid.ABC");
    assert_eq!(message.kind, MessageKind::Text);
    assert_eq!(message.provider, Provider::Meta);
    assert_eq!(message.sender_display_name.as_deref(), Some("Amal"));
}

#[tokio::test]
async fn missing_signature_is_rejected_before_queueing() {
    let queue = Arc::new(MockQueue::default());
    let response = meta_app(queue.clone())
        .oneshot(post(meta_text_body(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn mismatched_signature_is_rejected_before_queueing() {
    let queue = Arc::new(MockQueue::default());
    let signature = sign_sha256(b"some-other-secret", &meta_text_body());
    let response = meta_app(queue.clone())
        .oneshot(post(meta_text_body(), Some((META_SIGNATURE_HEADER, signature))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn status_callback_is_ignored() {
    let queue = Arc::new(MockQueue::default());
    let body = serde_json::json!({
        "entry": [{"changes": [{"value": {"statuses": [{"id": "wamid.X", "status": "read"}]}}]}]
    })
    .to_string()
    .into_bytes();
    let signature = sign_sha256(APP_SECRET.as_bytes(), &body);

    let response = meta_app(queue.clone())
        .oneshot(post(body, Some((META_SIGNATURE_HEADER, signature))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ignored");
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn garbage_body_is_ignored() {
    let queue = Arc::new(MockQueue::default());
    let body = b"not json".to_vec();
    let signature = sign_sha256(APP_SECRET.as_bytes(), &body);
    let response = meta_app(queue.clone())
        .oneshot(post(body, Some((META_SIGNATURE_HEADER, signature))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ignored");
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn queue_failure_is_a_server_error() {
    let queue = Arc::new(MockQueue::default());
    queue.set_reject_enqueue(true);
    let body = meta_text_body();
    let signature = sign_sha256(APP_SECRET.as_bytes(), &body);
    let response = meta_app(queue)
        .oneshot(post(body, Some((META_SIGNATURE_HEADER, signature))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn twilio_signature_covers_public_url_and_form() {
    let queue = Arc::new(MockQueue::default());
    let token = "twilio-token";
    let fields = vec![
        ("Body".to_string(), "panadol".to_string()),
        ("From".to_string(), "whatsapp:+201001234567".to_string()),
        ("MessageSid".to_string(), "SM123".to_string()),
    ];
    let url = format!("https://pharmacy.example.com{PATH}");
    let signature = sign_twilio(token, &url, &fields);
    let body = "MessageSid=SM123&From=whatsapp%3A%2B201001234567&Body=panadol";

    let response = app(Arc::new(TwilioWebhook::new(token.into())), queue.clone())
        .oneshot(
            Request::post(PATH)
                .header("content-type", "application/x-www-form-urlencoded")
                .header(TWILIO_SIGNATURE_HEADER, signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entries = queue.entries().await;
    assert_eq!(entries.len(), 1);
    let message: InboundMessage = serde_json::from_str(&entries[0].payload).unwrap();
    assert_eq!(message.provider, Provider::Twilio);
    assert_eq!(message.text.as_deref(), Some("panadol"));
}

#[tokio::test]
async fn generic_webhook_checks_shared_secret() {
    let queue = Arc::new(MockQueue::default());
    let body = br#"{"id":"g-1","from":"201001234567","type":"text","text":"brufen"}"#.to_vec();
    let app = app(Arc::new(GenericWebhook::new(Some("shh".into()))), queue.clone());

    let unsigned = app.clone().oneshot(post(body.clone(), None)).await.unwrap();
    assert_eq!(unsigned.status(), StatusCode::FORBIDDEN);

    let signature = sign_sha256(b"shh", &body);
    let signed = app
        .oneshot(post(body, Some((SIGNATURE_HEADER, signature))))
        .await
        .unwrap();
    assert_eq!(signed.status(), StatusCode::OK);
    assert_eq!(queue.len().await, 1);
}

#[tokio::test]
async fn health_reports_ok() {
    let response = meta_app(Arc::new(MockQueue::default()))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["uptime_secs"].is_u64());
}
