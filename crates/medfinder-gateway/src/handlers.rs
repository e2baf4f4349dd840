// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP handlers for the webhook path and `/health`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use medfinder_core::INBOUND_QUEUE;
use medfinder_whatsapp::{WebhookRequest, verify_subscription};

use crate::server::GatewayState;

/// Query parameters of the subscription handshake.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Body of every webhook POST response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// GET {webhook_path}: echo the challenge when the verify token matches.
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match verify_subscription(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
        state.verify_token.as_deref(),
    ) {
        Some(challenge) => {
            info!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            warn!(mode = ?params.mode, "webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST {webhook_path}: verify, normalize, and queue one inbound message.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let provider = state.webhook.provider();
    let request = WebhookRequest {
        url: signed_url(state.public_url.as_deref(), &uri, &headers),
        headers,
        body: body.to_vec(),
    };

    if !state.webhook.verify(&request) {
        warn!(%provider, "webhook signature rejected");
        metrics::counter!("medfinder_webhook_requests_total", "result" => "rejected").increment(1);
        return StatusCode::FORBIDDEN.into_response();
    }

    let message = match state.webhook.parse(&request) {
        Ok(Some(message)) => message,
        Ok(None) => {
            debug!(%provider, "webhook carried no user message");
            return respond(StatusCode::OK, "ignored");
        }
        Err(e) => {
            warn!(%provider, error = %e, "unreadable webhook payload");
            return respond(StatusCode::OK, "ignored");
        }
    };

    let payload = match serde_json::to_string(&message) {
        Ok(payload) => payload,
        Err(e) => {
            error!(message_id = %message.message_id, error = %e, "failed to encode message");
            return respond(StatusCode::INTERNAL_SERVER_ERROR, "error");
        }
    };

    match state.queue.enqueue(INBOUND_QUEUE, &payload).await {
        Ok(entry_id) => {
            info!(
                %provider,
                message_id = %message.message_id,
                kind = %message.kind,
                entry_id,
                "message queued"
            );
            metrics::counter!("medfinder_webhook_requests_total", "result" => "queued")
                .increment(1);
            respond(StatusCode::OK, "queued")
        }
        Err(e) => {
            error!(message_id = %message.message_id, error = %e, "failed to queue message");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "error")
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

fn respond(status: StatusCode, label: &'static str) -> Response {
    (status, Json(WebhookResponse { status: label })).into_response()
}

/// The absolute URL the provider called, as it signed it.
///
/// Prefers the configured public base URL; otherwise rebuilds it from the
/// forwarded scheme and the `Host` header.
pub fn signed_url(public_url: Option<&str>, uri: &Uri, headers: &HeaderMap) -> String {
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
    if let Some(base) = public_url.filter(|b| !b.trim().is_empty()) {
        return format!("{}{path}", base.trim_end_matches('/'));
    }
    let value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let scheme = value("x-forwarded-proto").unwrap_or("http");
    let host = value(header::HOST.as_str()).unwrap_or("localhost");
    format!("{scheme}://{host}{path}")
}
