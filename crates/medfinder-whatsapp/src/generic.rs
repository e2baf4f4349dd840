// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic JSON relay transport.
//!
//! Outbound messages are POSTed as JSON to `generic.outbound_url`, signed
//! with `X-Signature-256` when a shared secret is configured. Media is a
//! plain unauthenticated GET.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use medfinder_config::model::GenericConfig;
use medfinder_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, MedfinderError, MessageId,
    PluginAdapter,
};

use crate::signature::{SIGNATURE_HEADER, sign_sha256};
use crate::{media_bytes, provider_json, transport_error};

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Outbound<'a> {
    Text {
        to: &'a str,
        text: &'a str,
    },
    Image {
        to: &'a str,
        image_url: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<&'a str>,
    },
}

pub struct GenericChannel {
    client: reqwest::Client,
    config: GenericConfig,
}

impl GenericChannel {
    pub fn new(config: GenericConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    async fn relay(&self, message: &Outbound<'_>) -> Result<MessageId, MedfinderError> {
        let url = self
            .config
            .outbound_url
            .as_deref()
            .ok_or_else(|| MedfinderError::channel("generic.outbound_url is not configured"))?;
        let body = serde_json::to_vec(message)
            .map_err(|e| MedfinderError::Internal(format!("outbound payload: {e}")))?;

        let mut request = self
            .client
            .post(url)
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(secret) = self.config.shared_secret.as_deref() {
            request = request.header(SIGNATURE_HEADER, sign_sha256(secret.as_bytes(), &body));
        }
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error("relay send", e))?;
        let reply = provider_json("relay send", response).await?;
        let id = reply
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(MessageId(id))
    }
}

#[async_trait]
impl PluginAdapter for GenericChannel {
    fn name(&self) -> &str {
        "generic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        if self.config.outbound_url.is_none() {
            return Ok(HealthStatus::Degraded(
                "generic.outbound_url is not configured; replies cannot be sent".into(),
            ));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChannelAdapter for GenericChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_buttons: false,
            supports_images: true,
            max_buttons: 0,
            max_message_length: None,
        }
    }

    async fn download_media(&self, media_ref: &str) -> Result<Vec<u8>, MedfinderError> {
        let response = self
            .client
            .get(media_ref)
            .send()
            .await
            .map_err(|e| transport_error("media download", e))?;
        media_bytes(response).await
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, MedfinderError> {
        self.relay(&Outbound::Text { to, text: body }).await
    }

    async fn send_image(
        &self,
        to: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, MedfinderError> {
        self.relay(&Outbound::Image {
            to,
            image_url,
            caption,
        })
        .await
    }
}
