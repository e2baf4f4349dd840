// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook verification and parsing.
//!
//! Each provider family gets one [`InboundWebhook`]. The gateway calls
//! [`InboundWebhook::verify`] on the raw request first and only parses (and
//! queues) requests that pass. Parsing yields `Ok(None)` for callbacks that
//! carry no user message, such as delivery receipts.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use medfinder_config::MedfinderConfig;
use medfinder_core::{InboundMessage, MedfinderError, MessageKind, Provider};

use crate::signature::{
    META_SIGNATURE_HEADER, SIGNATURE_HEADER, TWILIO_SIGNATURE_HEADER, verify_sha256,
    verify_twilio,
};

/// The parts of an inbound HTTP request a webhook needs.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Public URL the provider called, including the query string.
    pub url: String,
    pub headers: http::HeaderMap,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub trait InboundWebhook: Send + Sync {
    fn provider(&self) -> Provider;

    /// Whether the request carries a valid signature.
    fn verify(&self, request: &WebhookRequest) -> bool;

    /// Normalize the payload. `Err` means the body could not be read at all.
    fn parse(&self, request: &WebhookRequest) -> Result<Option<InboundMessage>, MedfinderError>;
}

/// Answer a subscription handshake.
///
/// Returns the challenge to echo when `mode` is `subscribe` and `token`
/// matches the configured verify token; `None` means 403.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected: Option<&str>,
) -> Option<String> {
    let expected = expected.filter(|t| !t.is_empty())?;
    (mode == Some("subscribe") && token == Some(expected))
        .then(|| challenge.unwrap_or_default().to_string())
}

/// Build the webhook for the configured provider.
///
/// Fails when the provider's signing secret is missing, except for the
/// generic provider with `generic.allow_unsigned`.
pub fn webhook_for(config: &MedfinderConfig) -> Result<Arc<dyn InboundWebhook>, MedfinderError> {
    let secret = |value: &Option<String>, key: &str| {
        value
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                MedfinderError::Config(format!(
                    "{key} is required to verify webhook signatures"
                ))
            })
    };
    Ok(match config.whatsapp.provider {
        Provider::Meta => Arc::new(MetaWebhook::new(secret(
            &config.meta.app_secret,
            "meta.app_secret",
        )?)),
        Provider::Twilio => Arc::new(TwilioWebhook::new(secret(
            &config.twilio.auth_token,
            "twilio.auth_token",
        )?)),
        Provider::Generic => {
            let shared_secret = config
                .generic
                .shared_secret
                .clone()
                .filter(|s| !s.trim().is_empty());
            if shared_secret.is_none() && !config.generic.allow_unsigned {
                return Err(MedfinderError::Config(
                    "generic.shared_secret is required unless generic.allow_unsigned is set"
                        .into(),
                ));
            }
            Arc::new(GenericWebhook::new(shared_secret))
        }
    })
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn invalid(provider: &str, e: impl std::fmt::Display) -> MedfinderError {
    MedfinderError::InvalidPayload(format!("{provider} webhook: {e}"))
}

// --- Meta -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MetaPayload {
    #[serde(default)]
    entry: Vec<MetaEntry>,
}

#[derive(Debug, Deserialize)]
struct MetaEntry {
    #[serde(default)]
    changes: Vec<MetaChange>,
}

#[derive(Debug, Deserialize)]
struct MetaChange {
    value: MetaValue,
}

#[derive(Debug, Deserialize)]
struct MetaValue {
    #[serde(default)]
    messages: Vec<MetaMessage>,
    #[serde(default)]
    contacts: Vec<MetaContact>,
}

#[derive(Debug, Deserialize)]
struct MetaContact {
    profile: Option<MetaProfile>,
}

#[derive(Debug, Deserialize)]
struct MetaProfile {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaMessage {
    id: String,
    from: String,
    timestamp: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    text: Option<MetaText>,
    image: Option<MetaMedia>,
    audio: Option<MetaMedia>,
    voice: Option<MetaMedia>,
    document: Option<MetaMedia>,
    location: Option<MetaLocation>,
}

#[derive(Debug, Deserialize)]
struct MetaText {
    body: String,
}

#[derive(Debug, Deserialize)]
struct MetaMedia {
    id: String,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaLocation {
    latitude: f64,
    longitude: f64,
}

/// Meta Cloud API webhooks, signed with the app secret.
pub struct MetaWebhook {
    app_secret: String,
}

impl MetaWebhook {
    pub fn new(app_secret: String) -> Self {
        Self { app_secret }
    }
}

impl InboundWebhook for MetaWebhook {
    fn provider(&self) -> Provider {
        Provider::Meta
    }

    fn verify(&self, request: &WebhookRequest) -> bool {
        request
            .header(META_SIGNATURE_HEADER)
            .is_some_and(|sig| verify_sha256(self.app_secret.as_bytes(), &request.body, sig))
    }

    fn parse(&self, request: &WebhookRequest) -> Result<Option<InboundMessage>, MedfinderError> {
        let payload: MetaPayload =
            serde_json::from_slice(&request.body).map_err(|e| invalid("meta", e))?;
        let Some(value) = payload
            .entry
            .into_iter()
            .next()
            .and_then(|entry| entry.changes.into_iter().next())
            .map(|change| change.value)
        else {
            return Ok(None);
        };
        let Some(message) = value.messages.into_iter().next() else {
            debug!("meta callback without messages ignored");
            return Ok(None);
        };
        let display_name = value
            .contacts
            .into_iter()
            .next()
            .and_then(|c| c.profile)
            .and_then(|p| p.name);

        let media = message
            .image
            .or(message.audio)
            .or(message.voice)
            .or(message.document);
        Ok(Some(InboundMessage {
            message_id: message.id,
            from: message.from,
            timestamp: message
                .timestamp
                .and_then(|t| t.parse().ok())
                .unwrap_or_else(now),
            kind: MessageKind::from_wire(&message.kind),
            text: message.text.map(|t| t.body),
            media_ref: media.as_ref().map(|m| m.id.clone()),
            mime_type: media.and_then(|m| m.mime_type),
            latitude: message.location.as_ref().map(|l| l.latitude),
            longitude: message.location.as_ref().map(|l| l.longitude),
            provider: Provider::Meta,
            sender_display_name: display_name,
        }))
    }
}

// --- Twilio ---------------------------------------------------------------

/// Twilio form-encoded webhooks, signed with the account auth token.
pub struct TwilioWebhook {
    auth_token: String,
}

impl TwilioWebhook {
    pub fn new(auth_token: String) -> Self {
        Self { auth_token }
    }
}

fn form_fields(body: &[u8]) -> Result<Vec<(String, String)>, MedfinderError> {
    serde_urlencoded::from_bytes(body).map_err(|e| invalid("twilio", e))
}

fn field<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

/// Infer the message kind from Twilio's media and location fields.
fn twilio_kind(fields: &[(String, String)]) -> MessageKind {
    if field(fields, "MediaUrl0").is_some() {
        let mime = field(fields, "MediaContentType0").unwrap_or_default();
        return if mime.starts_with("image/") {
            MessageKind::Image
        } else if mime.starts_with("audio/") {
            MessageKind::Audio
        } else if mime.contains("pdf") || mime.contains("document") {
            MessageKind::Document
        } else {
            MessageKind::Unsupported
        };
    }
    if field(fields, "Latitude").is_some() && field(fields, "Longitude").is_some() {
        return MessageKind::Location;
    }
    MessageKind::Text
}

impl InboundWebhook for TwilioWebhook {
    fn provider(&self) -> Provider {
        Provider::Twilio
    }

    fn verify(&self, request: &WebhookRequest) -> bool {
        let Some(signature) = request.header(TWILIO_SIGNATURE_HEADER) else {
            return false;
        };
        let Ok(fields) = form_fields(&request.body) else {
            return false;
        };
        verify_twilio(&self.auth_token, &request.url, &fields, signature)
    }

    fn parse(&self, request: &WebhookRequest) -> Result<Option<InboundMessage>, MedfinderError> {
        let fields = form_fields(&request.body)?;
        let Some(from) = field(&fields, "From") else {
            return Ok(None);
        };
        let coordinate = |key| field(&fields, key).and_then(|v| v.parse::<f64>().ok());

        Ok(Some(InboundMessage {
            message_id: field(&fields, "MessageSid")
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            from: from.trim_start_matches("whatsapp:").to_string(),
            timestamp: now(),
            kind: twilio_kind(&fields),
            text: field(&fields, "Body").map(str::to_string),
            media_ref: field(&fields, "MediaUrl0").map(str::to_string),
            mime_type: field(&fields, "MediaContentType0").map(str::to_string),
            latitude: coordinate("Latitude"),
            longitude: coordinate("Longitude"),
            provider: Provider::Twilio,
            sender_display_name: field(&fields, "ProfileName").map(str::to_string),
        }))
    }
}

// --- Generic --------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenericPayload {
    id: Option<String>,
    from: Option<String>,
    timestamp: Option<i64>,
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    text: Option<String>,
    body: Option<String>,
    media_url: Option<String>,
    mime_type: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Flat JSON webhooks from a relay, optionally signed with a shared secret.
pub struct GenericWebhook {
    shared_secret: Option<String>,
}

impl GenericWebhook {
    /// `None` accepts unsigned requests.
    pub fn new(shared_secret: Option<String>) -> Self {
        Self { shared_secret }
    }
}

impl InboundWebhook for GenericWebhook {
    fn provider(&self) -> Provider {
        Provider::Generic
    }

    fn verify(&self, request: &WebhookRequest) -> bool {
        match &self.shared_secret {
            Some(secret) => request
                .header(SIGNATURE_HEADER)
                .is_some_and(|sig| verify_sha256(secret.as_bytes(), &request.body, sig)),
            None => true,
        }
    }

    fn parse(&self, request: &WebhookRequest) -> Result<Option<InboundMessage>, MedfinderError> {
        let payload: GenericPayload =
            serde_json::from_slice(&request.body).map_err(|e| invalid("generic", e))?;
        let Some(from) = payload.from.filter(|f| !f.trim().is_empty()) else {
            return Ok(None);
        };
        Ok(Some(InboundMessage {
            message_id: payload
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            from,
            timestamp: payload.timestamp.unwrap_or_else(now),
            kind: payload
                .kind
                .as_deref()
                .map_or(MessageKind::Text, MessageKind::from_wire),
            text: payload.text.or(payload.body),
            media_ref: payload.media_url,
            mime_type: payload.mime_type,
            latitude: payload.latitude,
            longitude: payload.longitude,
            provider: Provider::Generic,
            sender_display_name: payload.name,
        }))
    }
}
