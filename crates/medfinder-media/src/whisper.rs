// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whisper-compatible transcription API (multipart upload, bearer auth).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use medfinder_core::{AdapterType, HealthStatus, MedfinderError, PluginAdapter, SpeechAdapter};

use crate::{json_body, non_blank, request_error};

const SERVICE: &str = "whisper";

/// Voice notes arrive as Opus in an Ogg container unless the provider says otherwise.
const DEFAULT_AUDIO_MIME: &str = "audio/ogg";

#[derive(Debug, Clone)]
pub struct WhisperStt {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    language: String,
}

impl WhisperStt {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        model: String,
        language: String,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            model,
            language,
        }
    }
}

#[async_trait]
impl PluginAdapter for WhisperStt {
    fn name(&self) -> &str {
        "whisper"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        if self.api_key.is_empty() {
            return Ok(HealthStatus::Unhealthy("whisper API key is empty".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SpeechAdapter for WhisperStt {
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: Option<&str>,
    ) -> Result<Option<String>, MedfinderError> {
        // Providers append codec parameters ("audio/ogg; codecs=opus").
        let mime = mime_type
            .and_then(|m| m.split(';').next())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_AUDIO_MIME);
        let file = Part::bytes(audio.to_vec())
            .file_name("audio.ogg")
            .mime_str(mime)
            .map_err(|e| request_error(SERVICE, e))?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_error(SERVICE, e))?;
        let value = json_body(SERVICE, response).await?;

        let text = non_blank(value.get("text").and_then(|v| v.as_str()));
        debug!(found = text.is_some(), bytes = audio.len(), "whisper transcription finished");
        Ok(text)
    }
}
