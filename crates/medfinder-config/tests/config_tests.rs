// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Medfinder configuration system.

use figment::Jail;
use medfinder_config::diagnostic::ConfigError;
use medfinder_config::{load_and_validate_str, load_config, load_config_from_str};
use medfinder_core::Provider;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[service]
log_level = "debug"

[gateway]
host = "0.0.0.0"
port = 9000
public_url = "https://pharmacy.example.com"

[whatsapp]
provider = "twilio"
verify_token = "verify-me"

[twilio]
account_sid = "AC123"
auth_token = "secret"
from_number = "+14155238886"

[ocr]
vision_api_key = "vision-key"
tesseract_enabled = false

[speech]
whisper_api_key = "sk-test"
alternative_locales = ["en-US", "fr-FR"]

[maps]
api_key = "maps-key"
static_map_size = "800x600"

[worker]
concurrency = 2
max_attempts = 5

[location]
remember_last = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.whatsapp.provider, Provider::Twilio);
    assert_eq!(config.whatsapp.verify_token.as_deref(), Some("verify-me"));
    assert_eq!(config.twilio.account_sid.as_deref(), Some("AC123"));
    assert_eq!(config.ocr.vision_api_key.as_deref(), Some("vision-key"));
    assert!(!config.ocr.tesseract_enabled);
    assert_eq!(config.speech.alternative_locales, vec!["en-US", "fr-FR"]);
    assert_eq!(config.maps.static_map_size, "800x600");
    assert_eq!(config.worker.max_attempts, 5);
    assert!(config.location.remember_last);
    // Untouched sections keep their defaults.
    assert_eq!(config.meta.api_base, "https://graph.facebook.com/v17.0");
    assert_eq!(config.worker.job_timeout_secs, 120);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert_eq!(config.whatsapp.provider, Provider::Meta);
    assert_eq!(config.gateway.port, 8080);
}

#[test]
fn unknown_provider_is_rejected() {
    let err = load_config_from_str("[whatsapp]\nprovider = \"telegram\"\n")
        .expect_err("unknown provider must fail");
    assert!(format!("{err}").contains("telegram"));
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let errors = load_and_validate_str("[maps]\napi_kye = \"x\"\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "api_kye");
            assert_eq!(suggestion.as_deref(), Some("api_key"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_validation_runs_after_parsing() {
    let errors = load_and_validate_str("[worker]\nconcurrency = 0\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn env_vars_override_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "medfinder.toml",
            r#"
[meta]
access_token = "from-file"

[worker]
max_attempts = 2
"#,
        )?;
        jail.set_env("MEDFINDER_META_ACCESS_TOKEN", "from-env");
        jail.set_env("MEDFINDER_WORKER_MAX_ATTEMPTS", "7");
        jail.set_env("MEDFINDER_WHATSAPP_PROVIDER", "generic");

        let config = load_config()?;
        assert_eq!(config.meta.access_token.as_deref(), Some("from-env"));
        assert_eq!(config.worker.max_attempts, 7);
        assert_eq!(config.whatsapp.provider, Provider::Generic);
        Ok(())
    });
}
