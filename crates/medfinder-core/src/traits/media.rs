// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OCR and speech-to-text engine traits.

use async_trait::async_trait;

use crate::error::MedfinderError;
use crate::traits::adapter::PluginAdapter;

/// Extracts text from an image or scanned document.
#[async_trait]
pub trait OcrAdapter: PluginAdapter {
    /// Returns the recognized text, or `None` when the engine found nothing.
    async fn recognize(&self, image: &[u8]) -> Result<Option<String>, MedfinderError>;
}

/// Transcribes a voice note.
#[async_trait]
pub trait SpeechAdapter: PluginAdapter {
    /// Returns the transcript, or `None` when the engine heard nothing usable.
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: Option<&str>,
    ) -> Result<Option<String>, MedfinderError>;
}
