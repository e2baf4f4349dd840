// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local OCR through the `tesseract` command-line binary.
//!
//! The image is written to a named temporary file that is removed when the
//! guard drops, whether recognition succeeded, failed, or timed out.

use std::io::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use medfinder_core::{AdapterType, HealthStatus, MedfinderError, OcrAdapter, PluginAdapter};

use crate::non_blank;

const SERVICE: &str = "tesseract";

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    languages: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(binary: String, languages: String, timeout: Duration) -> Self {
        Self {
            binary,
            languages,
            timeout,
        }
    }

    fn failure(message: impl Into<String>, source: std::io::Error) -> MedfinderError {
        MedfinderError::ExternalService {
            service: SERVICE.to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[async_trait]
impl PluginAdapter for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Ocr
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        match Command::new(&self.binary).arg("--version").output().await {
            Ok(output) if output.status.success() => Ok(HealthStatus::Healthy),
            Ok(output) => Ok(HealthStatus::Unhealthy(format!(
                "{} --version exited with {}",
                self.binary, output.status
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "cannot run {}: {e}",
                self.binary
            ))),
        }
    }
}

#[async_trait]
impl OcrAdapter for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> Result<Option<String>, MedfinderError> {
        let mut file = tempfile::Builder::new()
            .prefix("medfinder-ocr-")
            .tempfile()
            .map_err(|e| Self::failure("failed to create temporary image", e))?;
        file.write_all(image)
            .and_then(|()| file.flush())
            .map_err(|e| Self::failure("failed to write temporary image", e))?;

        let run = Command::new(&self.binary)
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| MedfinderError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| Self::failure(format!("failed to run {}", self.binary), e))?;

        if !output.status.success() {
            return Err(MedfinderError::service(
                SERVICE,
                format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let text = non_blank(Some(&String::from_utf8_lossy(&output.stdout)));
        debug!(found = text.is_some(), "tesseract finished");
        Ok(text)
    }
}
