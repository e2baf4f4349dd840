// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router construction and the listener loop.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use medfinder_config::model::GatewayConfig;
use medfinder_core::{MedfinderError, QueueAdapter};
use medfinder_whatsapp::InboundWebhook;

use crate::handlers;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub webhook: Arc<dyn InboundWebhook>,
    pub queue: Arc<dyn QueueAdapter>,
    /// Token the verification GET must present.
    pub verify_token: Option<String>,
    /// Externally visible base URL, used to rebuild the URL a provider signed.
    pub public_url: Option<String>,
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(
        webhook: Arc<dyn InboundWebhook>,
        queue: Arc<dyn QueueAdapter>,
        verify_token: Option<String>,
        public_url: Option<String>,
    ) -> Self {
        Self {
            webhook,
            queue,
            verify_token,
            public_url,
            start_time: Instant::now(),
        }
    }
}

/// All routes with tracing applied.
pub fn router(webhook_path: &str, state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            webhook_path,
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until `cancel` fires.
pub async fn serve(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), MedfinderError> {
    let app = router(&config.webhook_path, state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MedfinderError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    info!(%addr, webhook_path = %config.webhook_path, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| MedfinderError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}
