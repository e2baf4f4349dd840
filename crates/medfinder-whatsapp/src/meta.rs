// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meta WhatsApp Cloud API transport.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use medfinder_config::model::MetaConfig;
use medfinder_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, MedfinderError, MessageId,
    PluginAdapter, ReplyButton,
};

use crate::{media_bytes, provider_json, required, transport_error};

/// Interactive messages accept at most this many reply buttons.
pub const MAX_BUTTONS: usize = 3;

/// Cloud API reply-button titles are limited to 20 characters.
const MAX_BUTTON_TITLE: usize = 20;

pub struct MetaChannel {
    client: reqwest::Client,
    api_base: String,
    phone_number_id: String,
    access_token: String,
}

impl MetaChannel {
    /// Requires `meta.phone_number_id` and `meta.access_token`.
    pub fn new(config: MetaConfig, client: reqwest::Client) -> Result<Self, MedfinderError> {
        let phone_number_id = required(&config.phone_number_id, "meta.phone_number_id")?.to_string();
        let access_token = required(&config.access_token, "meta.access_token")?.to_string();
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            phone_number_id,
            access_token,
        })
    }

    async fn post_message(&self, payload: Value) -> Result<MessageId, MedfinderError> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("meta send", e))?;
        let body = provider_json("meta send", response).await?;
        let id = body
            .pointer("/messages/0/id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!(message_id = %id, "meta message accepted");
        Ok(MessageId(id))
    }
}

fn envelope(to: &str, kind: &str, content: Value) -> Value {
    let mut payload = json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": kind,
    });
    payload[kind] = content;
    payload
}

fn button_payload(body: &str, buttons: &[ReplyButton]) -> Value {
    let buttons: Vec<Value> = buttons
        .iter()
        .take(MAX_BUTTONS)
        .map(|button| {
            json!({
                "type": "reply",
                "reply": {
                    "id": button.id,
                    "title": button.title.chars().take(MAX_BUTTON_TITLE).collect::<String>(),
                }
            })
        })
        .collect();
    json!({
        "type": "button",
        "body": { "text": body },
        "action": { "buttons": buttons },
    })
}

#[async_trait]
impl PluginAdapter for MetaChannel {
    fn name(&self) -> &str {
        "meta"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        let url = format!("{}/{}", self.api_base, self.phone_number_id);
        match self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => Ok(HealthStatus::Unhealthy(format!(
                "Cloud API returned {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Cloud API unreachable: {e}"
            ))),
        }
    }
}

#[async_trait]
impl ChannelAdapter for MetaChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_buttons: true,
            supports_images: true,
            max_buttons: MAX_BUTTONS,
            max_message_length: Some(4096),
        }
    }

    /// Resolves the media id to a short-lived URL, then fetches it.
    async fn download_media(&self, media_ref: &str) -> Result<Vec<u8>, MedfinderError> {
        let response = self
            .client
            .get(format!("{}/{}", self.api_base, media_ref))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport_error("meta media lookup", e))?;
        let meta = provider_json("meta media lookup", response).await?;
        let url = meta
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| MedfinderError::channel(format!("media {media_ref} has no url")))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport_error("media download", e))?;
        let bytes = media_bytes(response).await?;
        debug!(media_id = media_ref, size = bytes.len(), "downloaded meta media");
        Ok(bytes)
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, MedfinderError> {
        self.post_message(envelope(
            to,
            "text",
            json!({ "preview_url": false, "body": body }),
        ))
        .await
    }

    async fn send_image(
        &self,
        to: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, MedfinderError> {
        let mut image = json!({ "link": image_url });
        if let Some(caption) = caption {
            image["caption"] = json!(caption);
        }
        self.post_message(envelope(to, "image", image)).await
    }

    async fn send_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[ReplyButton],
    ) -> Result<MessageId, MedfinderError> {
        self.post_message(envelope(to, "interactive", button_payload(body, buttons)))
            .await
    }
}
