// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Driving distance matrix client.
//!
//! One origin, many destinations, `mode=driving`. Destinations are sent in
//! batches of [`MAX_DESTINATIONS`]. Any transport failure or non-`OK` batch
//! status fails the whole call; a non-`OK` element becomes `None`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use medfinder_core::{
    AdapterType, DistanceMatrixAdapter, HealthStatus, MedfinderError, PluginAdapter, RouteLeg,
    UserLocation,
};

const SERVICE: &str = "distance-matrix";

/// Destinations accepted per request.
pub const MAX_DESTINATIONS: usize = 25;

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<Measure>,
    duration: Option<Measure>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    value: f64,
}

impl MatrixElement {
    fn leg(&self) -> Option<RouteLeg> {
        if self.status != "OK" {
            return None;
        }
        Some(RouteLeg {
            distance_meters: self.distance.as_ref()?.value,
            duration_seconds: self.duration.as_ref()?.value,
        })
    }
}

fn coordinate(point: &UserLocation) -> String {
    format!("{},{}", point.latitude, point.longitude)
}

#[derive(Debug, Clone)]
pub struct GoogleDistanceMatrix {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
}

impl GoogleDistanceMatrix {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            language: "ar".to_string(),
        }
    }

    async fn batch(
        &self,
        origin: &str,
        destinations: &[UserLocation],
    ) -> Result<Vec<Option<RouteLeg>>, MedfinderError> {
        let destinations = destinations
            .iter()
            .map(coordinate)
            .collect::<Vec<_>>()
            .join("|");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origins", origin),
                ("destinations", destinations.as_str()),
                ("mode", "driving"),
                ("language", self.language.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MedfinderError::ExternalService {
                service: SERVICE.to_string(),
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MedfinderError::service(SERVICE, format!("API returned {status}")));
        }
        let body: MatrixResponse =
            response
                .json()
                .await
                .map_err(|e| MedfinderError::ExternalService {
                    service: SERVICE.to_string(),
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                })?;

        if body.status != "OK" {
            return Err(MedfinderError::service(
                SERVICE,
                match body.error_message {
                    Some(detail) => format!("status {}: {detail}", body.status),
                    None => format!("status {}", body.status),
                },
            ));
        }

        let elements = body
            .rows
            .into_iter()
            .next()
            .map(|row| row.elements)
            .unwrap_or_default();
        Ok(elements.iter().map(MatrixElement::leg).collect())
    }
}

#[async_trait]
impl PluginAdapter for GoogleDistanceMatrix {
    fn name(&self) -> &str {
        "google-distance-matrix"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Maps
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        if self.api_key.is_empty() {
            return Ok(HealthStatus::Unhealthy("maps API key is empty".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl DistanceMatrixAdapter for GoogleDistanceMatrix {
    async fn driving_matrix(
        &self,
        origin: UserLocation,
        destinations: &[UserLocation],
    ) -> Result<Vec<Option<RouteLeg>>, MedfinderError> {
        let origin = coordinate(&origin);
        let mut legs = Vec::with_capacity(destinations.len());
        for chunk in destinations.chunks(MAX_DESTINATIONS) {
            let mut batch = self.batch(&origin, chunk).await?;
            // Missing trailing elements are unroutable, not an error.
            batch.resize(chunk.len(), None);
            legs.extend(batch);
        }
        debug!(
            destinations = destinations.len(),
            routed = legs.iter().filter(|l| l.is_some()).count(),
            "distance matrix resolved"
        );
        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GoogleDistanceMatrix {
        GoogleDistanceMatrix::new(
            reqwest::Client::new(),
            format!("{}/maps/api/distancematrix/json", server.uri()),
            "maps-key".into(),
        )
    }

    fn at(latitude: f64, longitude: f64) -> UserLocation {
        UserLocation {
            latitude,
            longitude,
        }
    }

    #[tokio::test]
    async fn sends_one_batch_and_maps_elements() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/distancematrix/json"))
            .and(query_param("origins", "30.05,31.23"))
            .and(query_param("destinations", "30.06,31.24|29.96,31.26"))
            .and(query_param("mode", "driving"))
            .and(query_param("language", "ar"))
            .and(query_param("key", "maps-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "rows": [{ "elements": [
                    { "status": "OK", "distance": { "value": 2345 }, "duration": { "value": 420 } },
                    { "status": "ZERO_RESULTS" }
                ]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let legs = client(&server)
            .driving_matrix(at(30.05, 31.23), &[at(30.06, 31.24), at(29.96, 31.26)])
            .await
            .unwrap();
        assert_eq!(
            legs,
            vec![
                Some(RouteLeg {
                    distance_meters: 2345.0,
                    duration_seconds: 420.0
                }),
                None
            ]
        );
    }

    #[tokio::test]
    async fn non_ok_batch_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid.",
                "rows": []
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .driving_matrix(at(30.0, 31.0), &[at(30.1, 31.1)])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("REQUEST_DENIED"));
    }

    #[tokio::test]
    async fn http_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        assert!(
            client(&server)
                .driving_matrix(at(30.0, 31.0), &[at(30.1, 31.1)])
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn large_requests_are_batched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "rows": [{ "elements": [
                    { "status": "OK", "distance": { "value": 1000 }, "duration": { "value": 60 } }
                ]}]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let destinations: Vec<UserLocation> =
            (0..30).map(|i| at(30.0 + f64::from(i) / 100.0, 31.0)).collect();
        let legs = client(&server)
            .driving_matrix(at(30.0, 31.0), &destinations)
            .await
            .unwrap();
        assert_eq!(legs.len(), 30);
        assert!(legs[0].is_some());
        assert!(legs[1].is_none());
        assert!(legs[25].is_some());
    }
}
