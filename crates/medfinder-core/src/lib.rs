// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Medfinder pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Medfinder workspace. Every external
//! collaborator (messaging provider, OCR, speech, catalog, maps, queue) is
//! reached through a trait defined here.

pub mod error;
pub mod fallback;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MedfinderError;
pub use fallback::{Attempt, FallbackChain, Resolved, Strategy};
pub use types::{
    AdapterType, CatalogEntry, ChannelCapabilities, HealthStatus, InboundMessage, MessageId,
    MessageKind, Provider, QueueEntry, RankedResult, ReplyButton, RetryDisposition, RouteLeg,
    UserLocation,
};

pub use traits::{
    CatalogAdapter, ChannelAdapter, DistanceMatrixAdapter, INBOUND_QUEUE, LocationStore,
    OcrAdapter, PluginAdapter, QueueAdapter, SpeechAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medfinder_error_has_all_variants() {
        let _config = MedfinderError::Config("test".into());
        let _storage = MedfinderError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = MedfinderError::channel("test");
        let _service = MedfinderError::service("vision", "test");
        let _payload = MedfinderError::InvalidPayload("test".into());
        let _timeout = MedfinderError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = MedfinderError::Internal("test".into());
    }

    #[test]
    fn external_service_error_names_the_service() {
        let err = MedfinderError::service("distance-matrix", "status REQUEST_DENIED");
        assert_eq!(err.to_string(), "distance-matrix error: status REQUEST_DENIED");
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Channel,
            AdapterType::Ocr,
            AdapterType::Speech,
            AdapterType::Catalog,
            AdapterType::Maps,
            AdapterType::Queue,
            AdapterType::LocationStore,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_ocr_adapter<T: OcrAdapter>() {}
        fn _assert_speech_adapter<T: SpeechAdapter>() {}
        fn _assert_catalog_adapter<T: CatalogAdapter>() {}
        fn _assert_matrix_adapter<T: DistanceMatrixAdapter>() {}
        fn _assert_queue_adapter<T: QueueAdapter>() {}
        fn _assert_location_store<T: LocationStore>() {}
    }
}
