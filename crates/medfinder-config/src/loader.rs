// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./medfinder.toml` > `~/.config/medfinder/medfinder.toml`
//! > `/etc/medfinder/medfinder.toml` with environment variable overrides via the
//! `MEDFINDER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MedfinderConfig;

/// Top-level section names, used to map `MEDFINDER_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: &[&str] = &[
    "service", "gateway", "whatsapp", "meta", "twilio", "generic", "ocr", "speech", "maps",
    "storage", "worker", "location", "http",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/medfinder/medfinder.toml` (system-wide)
/// 3. `~/.config/medfinder/medfinder.toml` (user XDG config)
/// 4. `./medfinder.toml` (local directory)
/// 5. `MEDFINDER_*` environment variables
pub fn load_config() -> Result<MedfinderConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MedfinderConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MedfinderConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MedfinderConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MedfinderConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MedfinderConfig::default()))
        .merge(Toml::file("/etc/medfinder/medfinder.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("medfinder/medfinder.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("medfinder.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MEDFINDER_META_ACCESS_TOKEN` must map to `meta.access_token`,
/// not `meta.access.token`.
fn env_provider() -> Env {
    Env::prefixed("MEDFINDER_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(*section).and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_onto_sections() {
        assert_eq!(map_env_key("meta_access_token"), "meta.access_token");
        assert_eq!(map_env_key("maps_api_key"), "maps.api_key");
        assert_eq!(map_env_key("worker_max_attempts"), "worker.max_attempts");
        assert_eq!(map_env_key("speech_whisper_api_key"), "speech.whisper_api_key");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("unrelated_key"), "unrelated_key");
    }
}
