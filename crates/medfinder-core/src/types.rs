// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Medfinder pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier assigned by a messaging provider to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator an adapter stands in for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Ocr,
    Speech,
    Catalog,
    Maps,
    Queue,
    LocationStore,
}

/// Messaging provider family. Selected once at startup from configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    #[default]
    Meta,
    Twilio,
    Generic,
}

/// Content type of an inbound message; drives the extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
    Document,
    Location,
    /// Anything else the provider can deliver (stickers, contacts, reactions...).
    #[serde(other)]
    Unsupported,
}

impl MessageKind {
    /// Map a provider's wire-level type string onto a kind.
    ///
    /// Voice notes arrive as `voice` on some providers and are treated as audio.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "audio" | "voice" => Self::Audio,
            "document" => Self::Document,
            "location" => Self::Location,
            _ => Self::Unsupported,
        }
    }
}

/// Geographic position reported by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Canonical inbound message, normalized from any provider's webhook payload.
///
/// This is the only input to the pipeline and is never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    /// Sender phone number or provider-specific identifier (no `whatsapp:` prefix).
    pub from: String,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: Option<String>,
    /// Provider media id (Meta) or media URL (Twilio, generic).
    pub media_ref: Option<String>,
    pub mime_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub provider: Provider,
    pub sender_display_name: Option<String>,
}

impl InboundMessage {
    /// The user's coordinates, if both halves were present on this message.
    pub fn location(&self) -> Option<UserLocation> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(UserLocation {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// One in-stock medicine at one branch, joined with branch and pharmacy metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub medicine_id: i64,
    pub medicine_name: String,
    pub scientific_name: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub branch_id: i64,
    pub branch_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub opening_hours: Option<String>,
    pub closing_hours: Option<String>,
    pub pharmacy_id: i64,
    pub pharmacy_name: String,
}

/// A catalog entry annotated with its distance from the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub entry: CatalogEntry,
    pub distance_km: f64,
    pub eta_minutes: u32,
}

/// An interactive reply button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    /// Identifier echoed back by the provider when the user taps the button.
    pub id: String,
    pub title: String,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCapabilities {
    pub supports_buttons: bool,
    pub supports_images: bool,
    pub max_buttons: usize,
    /// Longest text body accepted, in UTF-16 code units.
    pub max_message_length: Option<usize>,
}

impl ChannelCapabilities {
    /// Whether `body` is within `max_message_length`.
    pub fn fits(&self, body: &str) -> bool {
        self.max_message_length
            .is_none_or(|max| body.encode_utf16().count() <= max)
    }
}

/// One successful element of a driving distance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// A durable work-queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// What happened to a queue entry after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// Returned to the queue; will run again after the backoff.
    Retrying { attempts: i32 },
    /// Retry budget exhausted; the entry is parked as failed.
    Exhausted { attempts: i32 },
}
