// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted OCR and speech engines.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use medfinder_core::{
    AdapterType, HealthStatus, MedfinderError, OcrAdapter, PluginAdapter, SpeechAdapter,
};

/// What a scripted engine answers on every call.
#[derive(Debug, Clone)]
pub enum Scripted {
    Text(String),
    Nothing,
    Error,
}

impl Scripted {
    fn answer(&self, service: &str) -> Result<Option<String>, MedfinderError> {
        match self {
            Scripted::Text(text) => Ok(Some(text.clone())),
            Scripted::Nothing => Ok(None),
            Scripted::Error => Err(MedfinderError::service(service, "scripted failure")),
        }
    }
}

macro_rules! scripted_engine {
    ($name:ident, $label:literal, $kind:expr) => {
        pub struct $name {
            name: String,
            script: Scripted,
            calls: AtomicUsize,
        }

        impl $name {
            pub fn new(script: Scripted) -> Self {
                Self::named($label, script)
            }

            pub fn named(name: &str, script: Scripted) -> Self {
                Self {
                    name: name.to_string(),
                    script,
                    calls: AtomicUsize::new(0),
                }
            }

            pub fn calls(&self) -> usize {
                self.calls.load(Ordering::SeqCst)
            }
        }

        #[async_trait]
        impl PluginAdapter for $name {
            fn name(&self) -> &str {
                &self.name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
                Ok(HealthStatus::Healthy)
            }
        }
    };
}

scripted_engine!(MockOcr, "mock-ocr", AdapterType::Ocr);
scripted_engine!(MockStt, "mock-stt", AdapterType::Speech);

#[async_trait]
impl OcrAdapter for MockOcr {
    async fn recognize(&self, _image: &[u8]) -> Result<Option<String>, MedfinderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.answer(&self.name)
    }
}

#[async_trait]
impl SpeechAdapter for MockStt {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _mime_type: Option<&str>,
    ) -> Result<Option<String>, MedfinderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.answer(&self.name)
    }
}
