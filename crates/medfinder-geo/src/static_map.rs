// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static map image URLs for search results.

use medfinder_config::model::MapsConfig;
use medfinder_core::UserLocation;

/// Builds a roadmap image with the user in blue and results in red.
#[derive(Debug, Clone)]
pub struct StaticMap {
    endpoint: String,
    size: String,
    api_key: Option<String>,
}

impl StaticMap {
    pub fn new(endpoint: String, size: String, api_key: Option<String>) -> Self {
        Self {
            endpoint,
            size,
            api_key,
        }
    }

    pub fn from_config(config: &MapsConfig) -> Self {
        Self::new(
            config.static_map_endpoint.clone(),
            config.static_map_size.clone(),
            config.api_key.clone().filter(|key| !key.trim().is_empty()),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Map URL with one `U` marker for `user` and markers `1..=n` for `places`.
    ///
    /// `None` without an API key or when the endpoint is not a valid URL.
    pub fn url(&self, user: UserLocation, places: &[UserLocation]) -> Option<String> {
        let key = self.api_key.as_deref()?;
        let mut params = vec![
            ("size".to_string(), self.size.clone()),
            ("maptype".to_string(), "roadmap".to_string()),
            (
                "markers".to_string(),
                format!("color:blue|label:U|{},{}", user.latitude, user.longitude),
            ),
        ];
        params.extend(places.iter().enumerate().map(|(i, place)| {
            (
                "markers".to_string(),
                format!(
                    "color:red|label:{}|{},{}",
                    i + 1,
                    place.latitude,
                    place.longitude
                ),
            )
        }));
        params.push(("key".to_string(), key.to_string()));

        match reqwest::Url::parse_with_params(&self.endpoint, &params) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "invalid static map endpoint");
                None
            }
        }
    }
}
