// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for inbound messages and catalog rows.

use medfinder_core::{CatalogEntry, InboundMessage, MessageKind, Provider};

pub const SENDER: &str = "201001234567";

/// A text message from [`SENDER`], optionally carrying a location.
pub fn text_message(text: &str, location: Option<(f64, f64)>) -> InboundMessage {
    InboundMessage {
        message_id: format!("wamid.{}", uuid::Uuid::new_v4()),
        from: SENDER.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        kind: MessageKind::Text,
        text: Some(text.to_string()),
        media_ref: None,
        mime_type: None,
        latitude: location.map(|(lat, _)| lat),
        longitude: location.map(|(_, lng)| lng),
        provider: Provider::Meta,
        sender_display_name: Some("Test User".to_string()),
    }
}

/// A media message of `kind` referencing `media_ref`.
pub fn media_message(
    kind: MessageKind,
    media_ref: &str,
    mime_type: &str,
    location: Option<(f64, f64)>,
) -> InboundMessage {
    InboundMessage {
        kind,
        text: None,
        media_ref: Some(media_ref.to_string()),
        mime_type: Some(mime_type.to_string()),
        ..text_message("", location)
    }
}

/// A location share with no text.
pub fn location_message(latitude: f64, longitude: f64) -> InboundMessage {
    InboundMessage {
        kind: MessageKind::Location,
        text: None,
        ..text_message("", Some((latitude, longitude)))
    }
}

/// A stocked catalog row; `id` doubles as the medicine and branch id.
pub fn entry(id: i64, name: &str, quantity: i64, at: (f64, f64)) -> CatalogEntry {
    CatalogEntry {
        medicine_id: id,
        medicine_name: name.to_string(),
        scientific_name: None,
        price: 25.5,
        quantity,
        branch_id: id,
        branch_name: format!("Branch {id}"),
        address: Some(format!("{id} Tahrir St")),
        phone: Some(format!("02-555-{id:04}")),
        latitude: at.0,
        longitude: at.1,
        opening_hours: Some("09:00".to_string()),
        closing_hours: Some("23:00".to_string()),
        pharmacy_id: id,
        pharmacy_name: format!("Pharmacy {id}"),
    }
}
