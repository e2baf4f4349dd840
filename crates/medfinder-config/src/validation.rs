// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.
//! Credential presence is deliberately not checked here: which credentials are
//! required depends on the provider and engines in use, and that is decided
//! when the service is wired together.

use crate::diagnostic::ConfigError;
use crate::model::MedfinderConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or every collected error (does not fail fast).
pub fn validate_config(config: &MedfinderConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        invalid(format!(
            "service.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.service.log_level
        ));
    }

    if config.gateway.host.trim().is_empty() {
        invalid("gateway.host must not be empty".to_string());
    }
    if config.gateway.port == 0 {
        invalid("gateway.port must be non-zero".to_string());
    }
    if !config.gateway.webhook_path.starts_with('/') {
        invalid(format!(
            "gateway.webhook_path must start with `/`, got `{}`",
            config.gateway.webhook_path
        ));
    }
    if let Some(url) = &config.gateway.public_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        invalid(format!("gateway.public_url must be an http(s) URL, got `{url}`"));
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    if config.worker.concurrency == 0 {
        invalid("worker.concurrency must be at least 1".to_string());
    }
    if config.worker.max_attempts < 1 {
        invalid(format!(
            "worker.max_attempts must be at least 1, got {}",
            config.worker.max_attempts
        ));
    }
    if config.worker.job_timeout_secs == 0 {
        invalid("worker.job_timeout_secs must be at least 1".to_string());
    }

    if !(config.maps.average_speed_kmh.is_finite() && config.maps.average_speed_kmh > 0.0) {
        invalid(format!(
            "maps.average_speed_kmh must be positive, got {}",
            config.maps.average_speed_kmh
        ));
    }
    if parse_map_size(&config.maps.static_map_size).is_none() {
        invalid(format!(
            "maps.static_map_size must look like `600x400`, got `{}`",
            config.maps.static_map_size
        ));
    }

    if config.http.request_timeout_secs == 0 {
        invalid("http.request_timeout_secs must be at least 1".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Parse a `WIDTHxHEIGHT` size string.
pub fn parse_map_size(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.split_once('x')?;
    let (w, h) = (w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?);
    (w > 0 && h > 0).then_some((w, h))
}
