// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud speech recognition (`speech:recognize`) with inline base64 audio.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use tracing::debug;

use medfinder_core::{AdapterType, HealthStatus, MedfinderError, PluginAdapter, SpeechAdapter};

use crate::{json_body, non_blank, request_error};

const SERVICE: &str = "google-speech";

#[derive(Debug, Clone)]
pub struct GoogleSpeechStt {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    locale: String,
    alternative_locales: Vec<String>,
    sample_rate_hertz: u32,
}

impl GoogleSpeechStt {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        locale: String,
        alternative_locales: Vec<String>,
        sample_rate_hertz: u32,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            locale,
            alternative_locales,
            sample_rate_hertz,
        }
    }
}

#[async_trait]
impl PluginAdapter for GoogleSpeechStt {
    fn name(&self) -> &str {
        "google-speech"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        if self.api_key.is_empty() {
            return Ok(HealthStatus::Unhealthy("speech API key is empty".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SpeechAdapter for GoogleSpeechStt {
    async fn transcribe(
        &self,
        audio: &[u8],
        _mime_type: Option<&str>,
    ) -> Result<Option<String>, MedfinderError> {
        let body = json!({
            "config": {
                "encoding": "OGG_OPUS",
                "sampleRateHertz": self.sample_rate_hertz,
                "languageCode": self.locale,
                "alternativeLanguageCodes": self.alternative_locales,
            },
            "audio": { "content": STANDARD.encode(audio) },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(SERVICE, e))?;
        let value = json_body(SERVICE, response).await?;

        let text = non_blank(
            value
                .pointer("/results/0/alternatives/0/transcript")
                .and_then(|v| v.as_str()),
        );
        debug!(found = text.is_some(), "speech recognition finished");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine(server: &MockServer) -> GoogleSpeechStt {
        GoogleSpeechStt::new(
            reqwest::Client::new(),
            format!("{}/v1/speech:recognize", server.uri()),
            "speech-key".into(),
            "ar-SA".into(),
            vec!["en-US".into()],
            16_000,
        )
    }

    #[tokio::test]
    async fn sends_locale_hints_and_reads_first_alternative() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "speech-key"))
            .and(body_partial_json(json!({
                "config": {
                    "encoding": "OGG_OPUS",
                    "sampleRateHertz": 16000,
                    "languageCode": "ar-SA",
                    "alternativeLanguageCodes": ["en-US"]
                },
                "audio": { "content": STANDARD.encode(b"OggS") }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "alternatives": [
                    { "transcript": "هل يتوفر كونجستال", "confidence": 0.91 },
                    { "transcript": "هل يتوفر كونجستا" }
                ]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = engine(&server).transcribe(b"OggS", None).await.unwrap();
        assert_eq!(text.as_deref(), Some("هل يتوفر كونجستال"));
    }

    #[tokio::test]
    async fn no_results_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        assert!(engine(&server).transcribe(b"OggS", None).await.unwrap().is_none());
    }
}
