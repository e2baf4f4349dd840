// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` serves registered media bytes and captures every outbound
//! message for assertion in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use medfinder_core::traits::numbered_options;
use medfinder_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, MedfinderError, MessageId,
    PluginAdapter, ReplyButton,
};

/// One captured outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        to: String,
        body: String,
    },
    Image {
        to: String,
        url: String,
        caption: Option<String>,
    },
    Buttons {
        to: String,
        body: String,
        buttons: Vec<ReplyButton>,
    },
}

impl Sent {
    pub fn to(&self) -> &str {
        match self {
            Sent::Text { to, .. } | Sent::Image { to, .. } | Sent::Buttons { to, .. } => to,
        }
    }

    /// Text body, if this was a text send.
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// A mock messaging channel for testing.
pub struct MockChannel {
    capabilities: ChannelCapabilities,
    media: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    sent: Arc<Mutex<Vec<Sent>>>,
    fail_images: bool,
    downloads: AtomicUsize,
}

impl MockChannel {
    /// A channel with full Meta-style capabilities (images and three buttons).
    pub fn new() -> Self {
        Self::with_capabilities(ChannelCapabilities {
            supports_buttons: true,
            supports_images: true,
            max_buttons: 3,
            max_message_length: Some(4096),
        })
    }

    /// A text-only channel, like Twilio or the generic transport.
    pub fn text_only() -> Self {
        Self::with_capabilities(ChannelCapabilities {
            supports_buttons: false,
            supports_images: false,
            max_buttons: 0,
            max_message_length: Some(1600),
        })
    }

    pub fn with_capabilities(capabilities: ChannelCapabilities) -> Self {
        Self {
            capabilities,
            media: Arc::new(Mutex::new(HashMap::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_images: false,
            downloads: AtomicUsize::new(0),
        }
    }

    /// Make every `send_image` call fail, to exercise partial-send handling.
    pub fn failing_images(mut self) -> Self {
        self.fail_images = true;
        self
    }

    /// Register bytes returned by `download_media(media_ref)`.
    pub async fn add_media(&self, media_ref: &str, bytes: &[u8]) {
        self.media
            .lock()
            .await
            .insert(media_ref.to_string(), bytes.to_vec());
    }

    /// All messages sent so far, in order.
    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    async fn record(&self, sent: Sent) -> MessageId {
        self.sent.lock().await.push(sent);
        MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4()))
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        self.capabilities.clone()
    }

    async fn download_media(&self, media_ref: &str) -> Result<Vec<u8>, MedfinderError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.media
            .lock()
            .await
            .get(media_ref)
            .cloned()
            .ok_or_else(|| MedfinderError::channel(format!("unknown media {media_ref}")))
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, MedfinderError> {
        if !self.capabilities.fits(body) {
            return Err(MedfinderError::channel("message body too long"));
        }
        Ok(self
            .record(Sent::Text {
                to: to.to_string(),
                body: body.to_string(),
            })
            .await)
    }

    async fn send_image(
        &self,
        to: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, MedfinderError> {
        if self.fail_images {
            return Err(MedfinderError::channel("image rejected"));
        }
        Ok(self
            .record(Sent::Image {
                to: to.to_string(),
                url: image_url.to_string(),
                caption: caption.map(str::to_string),
            })
            .await)
    }

    async fn send_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[ReplyButton],
    ) -> Result<MessageId, MedfinderError> {
        if !self.capabilities.supports_buttons {
            return self.send_text(to, &numbered_options(body, buttons)).await;
        }
        Ok(self
            .record(Sent::Buttons {
                to: to.to_string(),
                body: body.to_string(),
                buttons: buttons.to_vec(),
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_sends_in_order() {
        let channel = MockChannel::new();
        channel.send_text("201", "hello").await.unwrap();
        channel
            .send_image("201", "https://maps.example/x.png", Some("map"))
            .await
            .unwrap();

        let sent = channel.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text(), Some("hello"));
        assert!(matches!(&sent[1], Sent::Image { caption: Some(c), .. } if c == "map"));
        assert_eq!(sent[1].to(), "201");
    }

    #[tokio::test]
    async fn text_only_channel_degrades_buttons() {
        let channel = MockChannel::text_only();
        let buttons = [ReplyButton {
            id: "call_1".into(),
            title: "Call".into(),
        }];
        channel.send_buttons("201", "Next?", &buttons).await.unwrap();
        assert_eq!(channel.sent().await[0].text(), Some("Next?\n\n1. Call"));
    }

    #[tokio::test]
    async fn rejects_text_over_the_length_limit() {
        let channel = MockChannel::text_only();
        assert!(channel.send_text("201", &"ا".repeat(1601)).await.is_err());
        assert!(channel.send_text("201", &"ا".repeat(1600)).await.is_ok());
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn serves_registered_media_only() {
        let channel = MockChannel::new();
        channel.add_media("media-1", b"bytes").await;
        assert_eq!(channel.download_media("media-1").await.unwrap(), b"bytes");
        assert!(channel.download_media("media-2").await.is_err());
        assert_eq!(channel.download_count(), 2);
    }
}
