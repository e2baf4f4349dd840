// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp provider integration for Medfinder.
//!
//! One [`ChannelAdapter`] per provider family (Meta Cloud API, Twilio, and a
//! generic JSON relay) plus the matching [`InboundWebhook`] that verifies and
//! parses that provider's callbacks. The active pair is chosen once at
//! startup by [`channel_for`] and [`webhook_for`].

pub mod generic;
pub mod meta;
pub mod signature;
pub mod twilio;
pub mod webhook;

use std::sync::Arc;

use medfinder_config::MedfinderConfig;
use medfinder_core::{ChannelAdapter, MedfinderError, Provider};

pub use generic::GenericChannel;
pub use meta::MetaChannel;
pub use twilio::TwilioChannel;
pub use webhook::{
    GenericWebhook, InboundWebhook, MetaWebhook, TwilioWebhook, WebhookRequest,
    verify_subscription, webhook_for,
};

/// Build the outbound transport for the configured provider.
pub fn channel_for(
    config: &MedfinderConfig,
    client: reqwest::Client,
) -> Result<Arc<dyn ChannelAdapter>, MedfinderError> {
    Ok(match config.whatsapp.provider {
        Provider::Meta => Arc::new(MetaChannel::new(config.meta.clone(), client)?),
        Provider::Twilio => Arc::new(TwilioChannel::new(config.twilio.clone(), client)?),
        Provider::Generic => Arc::new(GenericChannel::new(config.generic.clone(), client)),
    })
}

/// Wrap a transport error for a provider call.
pub(crate) fn transport_error(action: &str, e: reqwest::Error) -> MedfinderError {
    MedfinderError::Channel {
        message: format!("{action} failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Read a provider response, turning non-success statuses into channel errors.
pub(crate) async fn provider_json(
    action: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value, MedfinderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MedfinderError::channel(format!(
            "{action} rejected with {status}: {body}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| transport_error(action, e))
}

/// Read a media body, turning non-success statuses into channel errors.
pub(crate) async fn media_bytes(response: reqwest::Response) -> Result<Vec<u8>, MedfinderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(MedfinderError::channel(format!(
            "media download returned {status}"
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error("media download", e))?;
    Ok(bytes.to_vec())
}

/// A credential that must be present and non-blank.
pub(crate) fn required<'a>(
    value: &'a Option<String>,
    key: &str,
) -> Result<&'a str, MedfinderError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MedfinderError::Config(format!("{key} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfinder_core::PluginAdapter;

    #[test]
    fn channel_follows_configured_provider() {
        let mut config = MedfinderConfig::default();
        config.whatsapp.provider = Provider::Generic;
        let channel = channel_for(&config, reqwest::Client::new()).unwrap();
        assert_eq!(channel.name(), "generic");

        config.whatsapp.provider = Provider::Meta;
        assert!(channel_for(&config, reqwest::Client::new()).is_err());

        config.meta.phone_number_id = Some("1234".into());
        config.meta.access_token = Some("token".into());
        let channel = channel_for(&config, reqwest::Client::new()).unwrap();
        assert_eq!(channel.name(), "meta");
    }

    #[test]
    fn blank_credentials_are_missing() {
        assert!(required(&Some("  ".into()), "meta.access_token").is_err());
        assert_eq!(required(&Some("x".into()), "k").unwrap(), "x");
        let err = required(&None, "twilio.auth_token").unwrap_err();
        assert!(err.to_string().contains("twilio.auth_token"));
    }
}
