// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio Programmable Messaging transport for WhatsApp senders.
//!
//! Twilio has no reply buttons on this path, so [`ChannelAdapter::send_buttons`]
//! keeps the trait's numbered-text rendering.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use medfinder_config::model::TwilioConfig;
use medfinder_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, MedfinderError, MessageId,
    PluginAdapter,
};

use crate::{media_bytes, provider_json, required, transport_error};

const WHATSAPP_PREFIX: &str = "whatsapp:";

pub struct TwilioChannel {
    client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

/// Address a phone number on the WhatsApp channel.
fn whatsapp_address(number: &str) -> String {
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{number}")
    }
}

impl TwilioChannel {
    /// Requires `twilio.account_sid`, `twilio.auth_token` and `twilio.from_number`.
    pub fn new(config: TwilioConfig, client: reqwest::Client) -> Result<Self, MedfinderError> {
        Ok(Self {
            account_sid: required(&config.account_sid, "twilio.account_sid")?.to_string(),
            auth_token: required(&config.auth_token, "twilio.auth_token")?.to_string(),
            from_number: required(&config.from_number, "twilio.from_number")?.to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.api_base, self.account_sid)
    }

    async fn create_message(&self, form: &[(&str, String)]) -> Result<MessageId, MedfinderError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| transport_error("twilio send", e))?;
        let body = provider_json("twilio send", response).await?;
        let sid = body
            .get("sid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!(sid = %sid, "twilio message accepted");
        Ok(MessageId(sid))
    }
}

#[async_trait]
impl PluginAdapter for TwilioChannel {
    fn name(&self) -> &str {
        "twilio"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        let url = format!("{}/Accounts/{}.json", self.api_base, self.account_sid);
        match self
            .client
            .get(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => Ok(HealthStatus::Unhealthy(format!(
                "Twilio returned {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Twilio unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl ChannelAdapter for TwilioChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_buttons: false,
            supports_images: true,
            max_buttons: 0,
            max_message_length: Some(1600),
        }
    }

    /// Media URLs are fetched directly with account credentials.
    async fn download_media(&self, media_ref: &str) -> Result<Vec<u8>, MedfinderError> {
        let response = self
            .client
            .get(media_ref)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| transport_error("media download", e))?;
        media_bytes(response).await
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, MedfinderError> {
        self.create_message(&[
            ("From", whatsapp_address(&self.from_number)),
            ("To", whatsapp_address(to)),
            ("Body", body.to_string()),
        ])
        .await
    }

    async fn send_image(
        &self,
        to: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, MedfinderError> {
        self.create_message(&[
            ("From", whatsapp_address(&self.from_number)),
            ("To", whatsapp_address(to)),
            ("Body", caption.unwrap_or_default().to_string()),
            ("MediaUrl", image_url.to_string()),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfinder_core::ReplyButton;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(server: &MockServer) -> TwilioChannel {
        TwilioChannel::new(
            TwilioConfig {
                api_base: server.uri(),
                account_sid: Some("AC123".into()),
                auth_token: Some("secret".into()),
                from_number: Some("+14155238886".into()),
            },
            reqwest::Client::new(),
        )
        .unwrap()
    }

    fn created() -> ResponseTemplate {
        ResponseTemplate::new(201).set_body_json(serde_json::json!({ "sid": "SM42" }))
    }

    fn form(body: &[u8]) -> Vec<(String, String)> {
        serde_urlencoded::from_bytes(body).unwrap()
    }

    #[test]
    fn addresses_get_the_whatsapp_prefix_once() {
        assert_eq!(whatsapp_address("+2010"), "whatsapp:+2010");
        assert_eq!(whatsapp_address("whatsapp:+2010"), "whatsapp:+2010");
    }

    #[tokio::test]
    async fn text_is_posted_as_a_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Accounts/AC123/Messages.json"))
            .and(header_exists("authorization"))
            .respond_with(created())
            .expect(1)
            .mount(&server)
            .await;

        let id = channel(&server)
            .send_text("+201001234567", "مرحبا")
            .await
            .unwrap();
        assert_eq!(id, MessageId("SM42".into()));

        let requests = server.received_requests().await.unwrap();
        let fields = form(&requests[0].body);
        assert!(fields.contains(&("From".into(), "whatsapp:+14155238886".into())));
        assert!(fields.contains(&("To".into(), "whatsapp:+201001234567".into())));
        assert!(fields.contains(&("Body".into(), "مرحبا".into())));
    }

    #[tokio::test]
    async fn image_carries_media_url_and_caption() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("MediaUrl="))
            .respond_with(created())
            .expect(1)
            .mount(&server)
            .await;

        channel(&server)
            .send_image("+2010", "https://maps.example.com/m.png", Some("map"))
            .await
            .unwrap();
        let requests = server.received_requests().await.unwrap();
        let fields = form(&requests[0].body);
        assert!(fields.contains(&("MediaUrl".into(), "https://maps.example.com/m.png".into())));
        assert!(fields.contains(&("Body".into(), "map".into())));
    }

    #[tokio::test]
    async fn buttons_degrade_to_numbered_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(created())
            .expect(1)
            .mount(&server)
            .await;

        let channel = channel(&server);
        assert!(!channel.capabilities().supports_buttons);
        channel
            .send_buttons(
                "+2010",
                "choose",
                &[
                    ReplyButton {
                        id: "call_1".into(),
                        title: "Call".into(),
                    },
                    ReplyButton {
                        id: "order_1".into(),
                        title: "Order".into(),
                    },
                ],
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let fields = form(&requests[0].body);
        assert!(fields.contains(&("Body".into(), "choose\n\n1. Call\n2. Order".into())));
    }

    #[tokio::test]
    async fn media_is_fetched_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Media/ME1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"OggS".to_vec()))
            .mount(&server)
            .await;

        let bytes = channel(&server)
            .download_media(&format!("{}/Media/ME1", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"OggS");
    }
}
