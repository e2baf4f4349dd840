// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text extraction for the Medfinder pipeline.
//!
//! [`ModalityExtractor`] turns any inbound message into plain text: text
//! messages pass through, images and documents go through an OCR chain, and
//! voice notes through a speech-to-text chain. Engines are adapters behind
//! [`OcrAdapter`](medfinder_core::OcrAdapter) and
//! [`SpeechAdapter`](medfinder_core::SpeechAdapter).

pub mod extractor;
pub mod google_speech;
pub mod tesseract;
pub mod vision;
pub mod whisper;

pub use extractor::{AudioClip, ExtractedText, Extraction, ModalityExtractor};
pub use google_speech::GoogleSpeechStt;
pub use tesseract::TesseractOcr;
pub use vision::GoogleVisionOcr;
pub use whisper::WhisperStt;

use medfinder_core::MedfinderError;

/// Wrap a transport error for an external engine.
pub(crate) fn request_error(service: &str, e: reqwest::Error) -> MedfinderError {
    MedfinderError::ExternalService {
        service: service.to_string(),
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Read a JSON body, turning non-success statuses into errors that carry the body.
pub(crate) async fn json_body(
    service: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value, MedfinderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MedfinderError::service(
            service,
            format!("API returned {status}: {body}"),
        ));
    }
    response.json().await.map_err(|e| MedfinderError::ExternalService {
        service: service.to_string(),
        message: format!("failed to parse API response: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Trimmed text, or `None` when nothing but whitespace remains.
pub(crate) fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
