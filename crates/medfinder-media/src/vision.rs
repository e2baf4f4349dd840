// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud vision text detection.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use tracing::debug;

use medfinder_core::{AdapterType, HealthStatus, MedfinderError, OcrAdapter, PluginAdapter};

use crate::{json_body, non_blank, request_error};

const SERVICE: &str = "vision";

/// OCR through the `images:annotate` TEXT_DETECTION feature.
///
/// Only the first (full-text) annotation is used.
#[derive(Debug, Clone)]
pub struct GoogleVisionOcr {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleVisionOcr {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl PluginAdapter for GoogleVisionOcr {
    fn name(&self) -> &str {
        "google-vision"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Ocr
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        if self.api_key.is_empty() {
            return Ok(HealthStatus::Unhealthy("vision API key is empty".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl OcrAdapter for GoogleVisionOcr {
    async fn recognize(&self, image: &[u8]) -> Result<Option<String>, MedfinderError> {
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "TEXT_DETECTION", "maxResults": 1 }],
            }]
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
                .pointer("/responses/0/textAnnotations/0/description")
                .and_then(|v| v.as_str()),
        );
        debug!(found = text.is_some(), bytes = image.len(), "vision text detection finished");
        Ok(text)
    }
}
