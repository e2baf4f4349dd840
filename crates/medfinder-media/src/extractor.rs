// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-modality text extraction.
//!
//! Extraction never fails: every download, engine, or decoding problem is
//! logged and reported as [`Extraction::NotFound`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use medfinder_config::MedfinderConfig;
use medfinder_core::{
    Attempt, ChannelAdapter, FallbackChain, InboundMessage, MessageKind, OcrAdapter,
    PluginAdapter, SpeechAdapter, Strategy,
};

use crate::{GoogleSpeechStt, GoogleVisionOcr, TesseractOcr, WhisperStt};

/// Audio bytes plus the MIME type the provider reported.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Text recovered from a message, with the engine that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub engine: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(ExtractedText),
    /// A location share with nothing to read.
    LocationOnly,
    NotFound,
}

struct OcrEngine(Arc<dyn OcrAdapter>);

#[async_trait]
impl Strategy<[u8], String> for OcrEngine {
    fn label(&self) -> &str {
        self.0.name()
    }

    async fn attempt(&self, image: &[u8]) -> Attempt<String> {
        match self.0.recognize(image).await {
            Ok(Some(text)) if !text.trim().is_empty() => Attempt::Hit(text),
            Ok(_) => Attempt::Miss,
            Err(e) => Attempt::Failed(e),
        }
    }
}

struct SpeechEngine(Arc<dyn SpeechAdapter>);

#[async_trait]
impl Strategy<AudioClip, String> for SpeechEngine {
    fn label(&self) -> &str {
        self.0.name()
    }

    async fn attempt(&self, clip: &AudioClip) -> Attempt<String> {
        match self.0.transcribe(&clip.bytes, clip.mime_type.as_deref()).await {
            Ok(Some(text)) if !text.trim().is_empty() => Attempt::Hit(text),
            Ok(_) => Attempt::Miss,
            Err(e) => Attempt::Failed(e),
        }
    }
}

/// Turns an [`InboundMessage`] of any supported kind into plain text.
pub struct ModalityExtractor {
    channel: Arc<dyn ChannelAdapter>,
    ocr: FallbackChain<[u8], String>,
    speech: FallbackChain<AudioClip, String>,
    engines: Vec<Arc<dyn PluginAdapter>>,
}

impl ModalityExtractor {
    pub fn new(channel: Arc<dyn ChannelAdapter>) -> Self {
        Self {
            channel,
            ocr: FallbackChain::new("ocr"),
            speech: FallbackChain::new("speech"),
            engines: Vec::new(),
        }
    }

    /// Appends an OCR engine; engines are tried in the order added.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrAdapter>) -> Self {
        self.engines.push(engine.clone());
        self.ocr.push(Arc::new(OcrEngine(engine)));
        self
    }

    /// Appends a speech engine; engines are tried in the order added.
    pub fn with_speech(mut self, engine: Arc<dyn SpeechAdapter>) -> Self {
        self.engines.push(engine.clone());
        self.speech.push(Arc::new(SpeechEngine(engine)));
        self
    }

    /// Build the engine chains from configuration.
    ///
    /// OCR: cloud vision (when keyed), then tesseract (when enabled).
    /// Speech: Whisper (when keyed), then cloud speech (when keyed).
    pub fn from_config(
        config: &MedfinderConfig,
        client: reqwest::Client,
        channel: Arc<dyn ChannelAdapter>,
    ) -> Self {
        let mut extractor = Self::new(channel);
        if let Some(key) = &config.ocr.vision_api_key {
            extractor = extractor.with_ocr(Arc::new(GoogleVisionOcr::new(
                client.clone(),
                config.ocr.vision_endpoint.clone(),
                key.clone(),
            )));
        }
        if config.ocr.tesseract_enabled {
            extractor = extractor.with_ocr(Arc::new(TesseractOcr::new(
                config.ocr.tesseract_binary.clone(),
                config.ocr.tesseract_languages.clone(),
                Duration::from_secs(config.http.request_timeout_secs),
            )));
        }
        if let Some(key) = &config.speech.whisper_api_key {
            extractor = extractor.with_speech(Arc::new(WhisperStt::new(
                client.clone(),
                config.speech.whisper_endpoint.clone(),
                key.clone(),
                config.speech.whisper_model.clone(),
                config.speech.language.clone(),
            )));
        }
        if let Some(key) = &config.speech.google_api_key {
            extractor = extractor.with_speech(Arc::new(GoogleSpeechStt::new(
                client,
                config.speech.google_endpoint.clone(),
                key.clone(),
                config.speech.locale.clone(),
                config.speech.alternative_locales.clone(),
                config.speech.sample_rate_hertz,
            )));
        }
        extractor
    }

    pub fn ocr_engines(&self) -> Vec<&str> {
        self.ocr.labels()
    }

    pub fn speech_engines(&self) -> Vec<&str> {
        self.speech.labels()
    }

    /// Every configured OCR and speech engine, for health checks.
    pub fn engines(&self) -> &[Arc<dyn PluginAdapter>] {
        &self.engines
    }

    /// Text for one message.
    ///
    /// Text messages pass through with surrounding whitespace trimmed, and a
    /// blank body is `NotFound`. Images and documents go through the OCR
    /// chain, audio through the speech chain.
    pub async fn extract(&self, message: &InboundMessage) -> Extraction {
        match message.kind {
            MessageKind::Text => match message.text.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => Extraction::Text(ExtractedText {
                    text: text.to_string(),
                    engine: "passthrough".into(),
                }),
                _ => Extraction::NotFound,
            },
            MessageKind::Image | MessageKind::Document => {
                let Some(image) = self.download(message).await else {
                    return Extraction::NotFound;
                };
                resolve(self.ocr.run(image.as_slice()).await, &message.message_id)
            }
            MessageKind::Audio => {
                let Some(bytes) = self.download(message).await else {
                    return Extraction::NotFound;
                };
                let clip = AudioClip {
                    bytes,
                    mime_type: message.mime_type.clone(),
                };
                resolve(self.speech.run(&clip).await, &message.message_id)
            }
            MessageKind::Location => Extraction::LocationOnly,
            MessageKind::Unsupported => {
                debug!(message_id = %message.message_id, "unsupported message kind");
                Extraction::NotFound
            }
        }
    }

    async fn download(&self, message: &InboundMessage) -> Option<Vec<u8>> {
        let Some(media_ref) = message.media_ref.as_deref() else {
            warn!(message_id = %message.message_id, kind = %message.kind, "media message without media reference");
            return None;
        };
        match self.channel.download_media(media_ref).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                warn!(message_id = %message.message_id, "downloaded media is empty");
                None
            }
            Err(e) => {
                warn!(message_id = %message.message_id, error = %e, "media download failed");
                None
            }
        }
    }
}

fn resolve(
    outcome: Result<Option<medfinder_core::Resolved<String>>, medfinder_core::MedfinderError>,
    message_id: &str,
) -> Extraction {
    match outcome {
        Ok(Some(resolved)) => Extraction::Text(ExtractedText {
            text: resolved.value.trim().to_string(),
            engine: resolved.strategy,
        }),
        Ok(None) => {
            debug!(message_id, "no engine produced text");
            Extraction::NotFound
        }
        Err(e) => {
            warn!(message_id, error = %e, "extraction aborted");
            Extraction::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfinder_test_utils::fixtures::{location_message, media_message, text_message};
    use medfinder_test_utils::{MockChannel, MockOcr, MockStt, Scripted};

    fn channel() -> Arc<MockChannel> {
        Arc::new(MockChannel::new())
    }

    fn text_of(extraction: Extraction) -> ExtractedText {
        match extraction {
            Extraction::Text(text) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_passes_through_trimmed() {
        let extractor = ModalityExtractor::new(channel());
        let found = text_of(extractor.extract(&text_message("  بنادول  ", None)).await);
        assert_eq!(found.text, "بنادول");
        assert_eq!(found.engine, "passthrough");

        assert_eq!(
            extractor.extract(&text_message("   ", None)).await,
            Extraction::NotFound
        );
    }

    #[tokio::test]
    async fn image_falls_through_to_the_next_ocr_engine() {
        let channel = channel();
        channel.add_media("media-1", b"jpeg").await;
        let broken = Arc::new(MockOcr::named("cloud", Scripted::Error));
        let local = Arc::new(MockOcr::named("local", Scripted::Text("Cataflam 50".into())));
        let extractor = ModalityExtractor::new(channel.clone())
            .with_ocr(broken.clone())
            .with_ocr(local.clone());

        let message = media_message(MessageKind::Image, "media-1", "image/jpeg", None);
        let found = text_of(extractor.extract(&message).await);
        assert_eq!(found.text, "Cataflam 50");
        assert_eq!(found.engine, "local");
        assert_eq!(broken.calls(), 1);
        assert_eq!(local.calls(), 1);
    }

    #[tokio::test]
    async fn empty_ocr_result_tries_next_engine() {
        let channel = channel();
        channel.add_media("doc-1", b"%PDF").await;
        let extractor = ModalityExtractor::new(channel)
            .with_ocr(Arc::new(MockOcr::named("cloud", Scripted::Text("  ".into()))))
            .with_ocr(Arc::new(MockOcr::named("local", Scripted::Nothing)));

        let message = media_message(MessageKind::Document, "doc-1", "application/pdf", None);
        assert_eq!(extractor.extract(&message).await, Extraction::NotFound);
    }

    #[tokio::test]
    async fn failed_download_skips_engines() {
        let ocr = Arc::new(MockOcr::new(Scripted::Text("never".into())));
        let extractor = ModalityExtractor::new(channel()).with_ocr(ocr.clone());

        let message = media_message(MessageKind::Image, "missing", "image/jpeg", None);
        assert_eq!(extractor.extract(&message).await, Extraction::NotFound);
        assert_eq!(ocr.calls(), 0);
    }

    #[tokio::test]
    async fn media_without_reference_is_not_found() {
        let channel = channel();
        let extractor = ModalityExtractor::new(channel.clone())
            .with_ocr(Arc::new(MockOcr::new(Scripted::Text("x".into()))));
        let mut message = media_message(MessageKind::Image, "m", "image/jpeg", None);
        message.media_ref = None;
        assert_eq!(extractor.extract(&message).await, Extraction::NotFound);
        assert_eq!(channel.download_count(), 0);
    }

    #[tokio::test]
    async fn audio_uses_the_speech_chain() {
        let channel = channel();
        channel.add_media("voice-1", b"OggS").await;
        let ocr = Arc::new(MockOcr::new(Scripted::Text("wrong chain".into())));
        let extractor = ModalityExtractor::new(channel)
            .with_ocr(ocr.clone())
            .with_speech(Arc::new(MockStt::named("whisper", Scripted::Nothing)))
            .with_speech(Arc::new(MockStt::named(
                "google-speech",
                Scripted::Text("عايز فولتارين".into()),
            )));

        let message = media_message(MessageKind::Audio, "voice-1", "audio/ogg", None);
        let found = text_of(extractor.extract(&message).await);
        assert_eq!(found.text, "عايز فولتارين");
        assert_eq!(found.engine, "google-speech");
        assert_eq!(ocr.calls(), 0);
    }

    #[tokio::test]
    async fn no_configured_engine_is_not_found() {
        let channel = channel();
        channel.add_media("voice-1", b"OggS").await;
        let extractor = ModalityExtractor::new(channel);
        let message = media_message(MessageKind::Audio, "voice-1", "audio/ogg", None);
        assert_eq!(extractor.extract(&message).await, Extraction::NotFound);
    }

    #[tokio::test]
    async fn location_and_unsupported_kinds() {
        let extractor = ModalityExtractor::new(channel());
        assert_eq!(
            extractor.extract(&location_message(30.0, 31.0)).await,
            Extraction::LocationOnly
        );

        let mut sticker = text_message("ignored", None);
        sticker.kind = MessageKind::Unsupported;
        assert_eq!(extractor.extract(&sticker).await, Extraction::NotFound);
    }

    #[test]
    fn engines_follow_configuration_order() {
        let mut config = MedfinderConfig::default();
        config.ocr.vision_api_key = Some("vision".into());
        config.speech.whisper_api_key = Some("sk".into());
        config.speech.google_api_key = Some("speech".into());
        let extractor = ModalityExtractor::from_config(&config, reqwest::Client::new(), channel());
        assert_eq!(extractor.ocr_engines(), vec!["google-vision", "tesseract"]);
        assert_eq!(extractor.speech_engines(), vec!["whisper", "google-speech"]);
        assert_eq!(extractor.engines().len(), 4);

        let mut bare = MedfinderConfig::default();
        bare.ocr.tesseract_enabled = false;
        let extractor = ModalityExtractor::from_config(&bare, reqwest::Client::new(), channel());
        assert!(extractor.ocr_engines().is_empty());
        assert!(extractor.speech_engines().is_empty());
    }
}
