// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Medfinder pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages. The whole
//! tree is built once at process start and handed to each component
//! constructor; nothing reads configuration at call time.

use std::fmt;

use medfinder_core::Provider;
use serde::{Deserialize, Serialize};

/// Top-level Medfinder configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MedfinderConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Webhook HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messaging provider selection.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Meta WhatsApp Cloud API credentials.
    #[serde(default)]
    pub meta: MetaConfig,

    /// Twilio WhatsApp credentials.
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Generic JSON webhook provider settings.
    #[serde(default)]
    pub generic: GenericConfig,

    /// OCR engines.
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Speech-to-text engines.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Mapping API settings.
    #[serde(default)]
    pub maps: MapsConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Queue worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Optional last-known-location memory.
    #[serde(default)]
    pub location: LocationConfig,

    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() { "[redacted]" } else { "None" }
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Webhook HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible base URL (scheme and host) of this server.
    ///
    /// Twilio signs the public URL it called, which differs from the local
    /// address behind a reverse proxy.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Path serving both the verification GET and the message POST.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            webhook_path: default_webhook_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/webhook/whatsapp".to_string()
}

/// Messaging provider selection.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Which provider family delivers and sends messages.
    #[serde(default)]
    pub provider: Provider,

    /// Token echoed during webhook verification handshakes.
    #[serde(default)]
    pub verify_token: Option<String>,
}

impl fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("provider", &self.provider)
            .field("verify_token", &redact(&self.verify_token))
            .finish()
    }
}

/// Meta WhatsApp Cloud API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetaConfig {
    /// Graph API base URL including version.
    #[serde(default = "default_meta_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub phone_number_id: Option<String>,

    #[serde(default)]
    pub access_token: Option<String>,

    /// App secret used to verify `X-Hub-Signature-256`.
    #[serde(default)]
    pub app_secret: Option<String>,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            api_base: default_meta_api_base(),
            phone_number_id: None,
            access_token: None,
            app_secret: None,
        }
    }
}

impl fmt::Debug for MetaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaConfig")
            .field("api_base", &self.api_base)
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &redact(&self.access_token))
            .field("app_secret", &redact(&self.app_secret))
            .finish()
    }
}

fn default_meta_api_base() -> String {
    "https://graph.facebook.com/v17.0".to_string()
}

/// Twilio WhatsApp configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub account_sid: Option<String>,

    /// Auth token; also the key for `X-Twilio-Signature`.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender number without the `whatsapp:` prefix.
    #[serde(default)]
    pub from_number: Option<String>,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            api_base: default_twilio_api_base(),
            account_sid: None,
            auth_token: None,
            from_number: None,
        }
    }
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("api_base", &self.api_base)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &redact(&self.auth_token))
            .field("from_number", &self.from_number)
            .finish()
    }
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

/// Generic JSON provider configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenericConfig {
    /// Endpoint receiving outbound messages as JSON.
    #[serde(default)]
    pub outbound_url: Option<String>,

    /// Shared secret for `X-Signature-256` (HMAC-SHA256 of the body).
    #[serde(default)]
    pub shared_secret: Option<String>,

    /// Accept unsigned webhooks. Intended for local development only.
    #[serde(default)]
    pub allow_unsigned: bool,
}

impl fmt::Debug for GenericConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericConfig")
            .field("outbound_url", &self.outbound_url)
            .field("shared_secret", &redact(&self.shared_secret))
            .field("allow_unsigned", &self.allow_unsigned)
            .finish()
    }
}

/// OCR engine configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OcrConfig {
    /// Cloud Vision API key. Enables the cloud engine when set.
    #[serde(default)]
    pub vision_api_key: Option<String>,

    #[serde(default = "default_vision_endpoint")]
    pub vision_endpoint: String,

    /// Run the local tesseract binary after the cloud engine (or alone).
    #[serde(default = "default_true")]
    pub tesseract_enabled: bool,

    #[serde(default = "default_tesseract_binary")]
    pub tesseract_binary: String,

    #[serde(default = "default_tesseract_languages")]
    pub tesseract_languages: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            vision_api_key: None,
            vision_endpoint: default_vision_endpoint(),
            tesseract_enabled: true,
            tesseract_binary: default_tesseract_binary(),
            tesseract_languages: default_tesseract_languages(),
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("vision_api_key", &redact(&self.vision_api_key))
            .field("vision_endpoint", &self.vision_endpoint)
            .field("tesseract_enabled", &self.tesseract_enabled)
            .field("tesseract_binary", &self.tesseract_binary)
            .field("tesseract_languages", &self.tesseract_languages)
            .finish()
    }
}

fn default_vision_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}

fn default_tesseract_binary() -> String {
    "tesseract".to_string()
}

fn default_tesseract_languages() -> String {
    "ara+eng".to_string()
}

fn default_true() -> bool {
    true
}

/// Speech-to-text configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// Key for the Whisper-compatible transcription API (primary engine).
    #[serde(default)]
    pub whisper_api_key: Option<String>,

    #[serde(default = "default_whisper_endpoint")]
    pub whisper_endpoint: String,

    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    /// Primary language hint for the transcription API.
    #[serde(default = "default_language")]
    pub language: String,

    /// Key for the cloud speech recognition API (fallback engine).
    #[serde(default)]
    pub google_api_key: Option<String>,

    #[serde(default = "default_google_speech_endpoint")]
    pub google_endpoint: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_alternative_locales")]
    pub alternative_locales: Vec<String>,

    #[serde(default = "default_sample_rate")]
    pub sample_rate_hertz: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            whisper_api_key: None,
            whisper_endpoint: default_whisper_endpoint(),
            whisper_model: default_whisper_model(),
            language: default_language(),
            google_api_key: None,
            google_endpoint: default_google_speech_endpoint(),
            locale: default_locale(),
            alternative_locales: default_alternative_locales(),
            sample_rate_hertz: default_sample_rate(),
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("whisper_api_key", &redact(&self.whisper_api_key))
            .field("whisper_endpoint", &self.whisper_endpoint)
            .field("whisper_model", &self.whisper_model)
            .field("language", &self.language)
            .field("google_api_key", &redact(&self.google_api_key))
            .field("google_endpoint", &self.google_endpoint)
            .field("locale", &self.locale)
            .field("alternative_locales", &self.alternative_locales)
            .field("sample_rate_hertz", &self.sample_rate_hertz)
            .finish()
    }
}

fn default_whisper_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_language() -> String {
    "ar".to_string()
}

fn default_google_speech_endpoint() -> String {
    "https://speech.googleapis.com/v1/speech:recognize".to_string()
}

fn default_locale() -> String {
    "ar-SA".to_string()
}

fn default_alternative_locales() -> Vec<String> {
    vec!["en-US".to_string()]
}

fn default_sample_rate() -> u32 {
    16_000
}

/// Mapping API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MapsConfig {
    /// Maps API key. Enables routed distances and the static map image.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_distance_matrix_endpoint")]
    pub distance_matrix_endpoint: String,

    #[serde(default = "default_static_map_endpoint")]
    pub static_map_endpoint: String,

    /// Static map dimensions as `WIDTHxHEIGHT`.
    #[serde(default = "default_static_map_size")]
    pub static_map_size: String,

    /// Flat urban speed used for geometric ETA estimates.
    #[serde(default = "default_average_speed")]
    pub average_speed_kmh: f64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            distance_matrix_endpoint: default_distance_matrix_endpoint(),
            static_map_endpoint: default_static_map_endpoint(),
            static_map_size: default_static_map_size(),
            average_speed_kmh: default_average_speed(),
        }
    }
}

impl fmt::Debug for MapsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapsConfig")
            .field("api_key", &redact(&self.api_key))
            .field("distance_matrix_endpoint", &self.distance_matrix_endpoint)
            .field("static_map_endpoint", &self.static_map_endpoint)
            .field("static_map_size", &self.static_map_size)
            .field("average_speed_kmh", &self.average_speed_kmh)
            .finish()
    }
}

fn default_distance_matrix_endpoint() -> String {
    "https://maps.googleapis.com/maps/api/distancematrix/json".to_string()
}

fn default_static_map_endpoint() -> String {
    "https://maps.googleapis.com/maps/api/staticmap".to_string()
}

fn default_static_map_size() -> String {
    "600x400".to_string()
}

fn default_average_speed() -> f64 {
    30.0
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding the catalog and the queue.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("medfinder").join("medfinder.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("medfinder.db"))
        .to_string_lossy()
        .into_owned()
}

/// Queue worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Number of concurrent worker loops.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per message before it is parked as failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    /// Hard wall-clock limit for one pipeline run.
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// Sleep between polls when the queue is empty.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before a failed message becomes eligible again.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            job_timeout_secs: default_job_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_max_attempts() -> i32 {
    3
}

fn default_job_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_retry_backoff_secs() -> u64 {
    10
}

/// Last-known-location memory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocationConfig {
    /// Remember each user's last shared location and reuse it when a later
    /// message carries none. Off by default.
    #[serde(default)]
    pub remember_last: bool,
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout for every external call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}
