// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Medfinder pipeline.
//!
//! `MedfinderError` covers infrastructure failures only. Expected business
//! outcomes (nothing extracted, no stock nearby, location missing) are modelled
//! as values by the pipeline and never travel through this type.

use thiserror::Error;

/// The primary error type used across all Medfinder adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MedfinderError {
    /// Configuration errors (invalid TOML, missing credentials, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging channel errors (media download, send failure, rejected payload).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Errors from an external service (OCR, speech, mapping).
    #[error("{service} error: {message}")]
    ExternalService {
        service: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An inbound payload could not be interpreted.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MedfinderError {
    /// Shorthand for an [`MedfinderError::ExternalService`] without a source.
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`MedfinderError::Channel`] without a source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }
}
