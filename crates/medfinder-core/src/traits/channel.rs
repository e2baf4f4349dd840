// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging provider integrations (Meta, Twilio, ...).

use std::fmt::Write as _;

use async_trait::async_trait;

use crate::error::MedfinderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, MessageId, ReplyButton};

/// Capability interface over one messaging provider family.
///
/// One implementation exists per provider; the active one is chosen once at
/// startup. Implementations must be safe to share across concurrent jobs.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Fetches the raw bytes of an inbound media attachment.
    async fn download_media(&self, media_ref: &str) -> Result<Vec<u8>, MedfinderError>;

    /// Sends a plain text message.
    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, MedfinderError>;

    /// Sends an image by public URL with an optional caption.
    async fn send_image(
        &self,
        to: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, MedfinderError>;

    /// Sends an interactive button message.
    ///
    /// Channels without button support fall back to a numbered text list.
    async fn send_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[ReplyButton],
    ) -> Result<MessageId, MedfinderError> {
        self.send_text(to, &numbered_options(body, buttons)).await
    }
}

/// Render buttons as a numbered plain-text list appended to `body`.
pub fn numbered_options(body: &str, buttons: &[ReplyButton]) -> String {
    let mut text = body.trim_end().to_string();
    text.push('\n');
    for (index, button) in buttons.iter().enumerate() {
        let _ = write!(text, "\n{}. {}", index + 1, button.title);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_options_appends_each_title() {
        let buttons = vec![
            ReplyButton {
                id: "directions_4".into(),
                title: "Directions".into(),
            },
            ReplyButton {
                id: "call_4".into(),
                title: "Call".into(),
            },
        ];
        let text = numbered_options("What next?\n", &buttons);
        assert_eq!(text, "What next?\n\n1. Directions\n2. Call");
    }
}
