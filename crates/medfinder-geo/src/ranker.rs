// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Distance annotation and nearest-first ordering.
//!
//! Routed driving distances are preferred when a matrix backend is
//! configured. The fallback to great-circle distance happens at two levels:
//! the whole batch (transport failure, bad status, malformed response) and
//! the single element (unroutable destination). Ranking itself never fails.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use medfinder_config::MedfinderConfig;
use medfinder_core::{
    Attempt, CatalogEntry, DistanceMatrixAdapter, FallbackChain, MedfinderError, RankedResult,
    Strategy, UserLocation,
};

use crate::haversine::{eta_minutes, haversine_km, round2};
use crate::matrix::GoogleDistanceMatrix;

/// Origin plus destinations, in catalog order.
#[derive(Debug)]
struct RankRequest {
    origin: UserLocation,
    destinations: Vec<UserLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Measure {
    distance_km: f64,
    eta_minutes: u32,
}

fn geometric(origin: UserLocation, destination: UserLocation, speed_kmh: f64) -> Measure {
    let raw = haversine_km(origin, destination);
    Measure {
        distance_km: round2(raw),
        eta_minutes: eta_minutes(raw, speed_kmh),
    }
}

struct RoutedDistance {
    matrix: Arc<dyn DistanceMatrixAdapter>,
    speed_kmh: f64,
}

#[async_trait]
impl Strategy<RankRequest, Vec<Measure>> for RoutedDistance {
    fn label(&self) -> &str {
        "routed"
    }

    async fn attempt(&self, request: &RankRequest) -> Attempt<Vec<Measure>> {
        let legs = match self
            .matrix
            .driving_matrix(request.origin, &request.destinations)
            .await
        {
            Ok(legs) => legs,
            Err(e) => {
                metrics::counter!("medfinder_distance_fallback_total", "reason" => "batch")
                    .increment(1);
                return Attempt::Failed(e);
            }
        };
        if legs.len() != request.destinations.len() {
            metrics::counter!("medfinder_distance_fallback_total", "reason" => "batch")
                .increment(1);
            return Attempt::Failed(MedfinderError::service(
                "distance-matrix",
                format!(
                    "expected {} elements, got {}",
                    request.destinations.len(),
                    legs.len()
                ),
            ));
        }

        let measures = legs
            .into_iter()
            .zip(&request.destinations)
            .map(|(leg, destination)| match leg {
                Some(leg) => Measure {
                    distance_km: round2(leg.distance_meters / 1000.0),
                    eta_minutes: (leg.duration_seconds / 60.0).round().max(0.0) as u32,
                },
                None => {
                    metrics::counter!("medfinder_distance_fallback_total", "reason" => "element")
                        .increment(1);
                    geometric(request.origin, *destination, self.speed_kmh)
                }
            })
            .collect();
        Attempt::Hit(measures)
    }
}

struct GeometricDistance {
    speed_kmh: f64,
}

impl GeometricDistance {
    fn measure(&self, request: &RankRequest) -> Vec<Measure> {
        request
            .destinations
            .iter()
            .map(|destination| geometric(request.origin, *destination, self.speed_kmh))
            .collect()
    }
}

#[async_trait]
impl Strategy<RankRequest, Vec<Measure>> for GeometricDistance {
    fn label(&self) -> &str {
        "geometric"
    }

    async fn attempt(&self, request: &RankRequest) -> Attempt<Vec<Measure>> {
        Attempt::Hit(self.measure(request))
    }
}

/// Annotates catalog entries with distance and ETA, nearest first.
pub struct DistanceRanker {
    chain: FallbackChain<RankRequest, Vec<Measure>>,
    geometric: Arc<GeometricDistance>,
    matrix: Option<Arc<dyn DistanceMatrixAdapter>>,
}

impl DistanceRanker {
    /// A ranker using `matrix` when present, great-circle distance otherwise.
    pub fn new(speed_kmh: f64, matrix: Option<Arc<dyn DistanceMatrixAdapter>>) -> Self {
        let geometric = Arc::new(GeometricDistance { speed_kmh });
        let mut chain = FallbackChain::new("distance");
        if let Some(matrix) = &matrix {
            chain.push(Arc::new(RoutedDistance {
                matrix: matrix.clone(),
                speed_kmh,
            }));
        }
        chain.push(geometric.clone());
        Self {
            chain,
            geometric,
            matrix,
        }
    }

    /// Routed distances only when a maps API key is configured.
    pub fn from_config(config: &MedfinderConfig, client: reqwest::Client) -> Self {
        let maps = &config.maps;
        let matrix = maps
            .api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                Arc::new(GoogleDistanceMatrix::new(
                    client,
                    maps.distance_matrix_endpoint.clone(),
                    key.clone(),
                )) as Arc<dyn DistanceMatrixAdapter>
            });
        Self::new(maps.average_speed_kmh, matrix)
    }

    /// The distance-matrix service, when routed distances are enabled.
    pub fn matrix(&self) -> Option<&Arc<dyn DistanceMatrixAdapter>> {
        self.matrix.as_ref()
    }

    /// Strategy labels in attempt order.
    pub fn strategies(&self) -> Vec<&str> {
        self.chain.labels()
    }

    /// Ranks `entries` by distance from `origin`, ascending.
    ///
    /// Entries at equal distance keep their catalog order.
    pub async fn rank(&self, entries: Vec<CatalogEntry>, origin: UserLocation) -> Vec<RankedResult> {
        if entries.is_empty() {
            return Vec::new();
        }

        let request = RankRequest {
            origin,
            destinations: entries
                .iter()
                .map(|entry| UserLocation {
                    latitude: entry.latitude,
                    longitude: entry.longitude,
                })
                .collect(),
        };
        let (strategy, measures) = match self.chain.run(&request).await {
            Ok(Some(resolved)) => (resolved.strategy, resolved.value),
            _ => ("geometric".to_string(), self.geometric.measure(&request)),
        };

        let mut ranked: Vec<RankedResult> = entries
            .into_iter()
            .zip(measures)
            .map(|(entry, measure)| RankedResult {
                entry,
                distance_km: measure.distance_km,
                eta_minutes: measure.eta_minutes,
            })
            .collect();
        ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        debug!(results = ranked.len(), strategy = %strategy, "results ranked");
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfinder_core::RouteLeg;
    use medfinder_test_utils::MockMatrix;
    use medfinder_test_utils::fixtures::entry;
    use proptest::prelude::*;

    const ORIGIN: UserLocation = UserLocation {
        latitude: 30.0594,
        longitude: 31.3260,
    };

    fn leg(distance_meters: f64, duration_seconds: f64) -> Option<RouteLeg> {
        Some(RouteLeg {
            distance_meters,
            duration_seconds,
        })
    }

    fn ids(ranked: &[RankedResult]) -> Vec<i64> {
        ranked.iter().map(|r| r.entry.medicine_id).collect()
    }

    #[tokio::test]
    async fn geometric_ranking_sorts_nearest_first() {
        let ranker = DistanceRanker::new(30.0, None);
        let entries = vec![
            entry(1, "panadol", 5, (29.9602, 31.2631)),
            entry(2, "panadol", 5, (30.0600, 31.3270)),
        ];
        let ranked = ranker.rank(entries, ORIGIN).await;
        assert_eq!(ids(&ranked), vec![2, 1]);
        assert_eq!(ranked[1].distance_km, 12.58);
        assert_eq!(ranked[1].eta_minutes, 26);
        assert_eq!(ranker.strategies(), vec!["geometric"]);
    }

    #[tokio::test]
    async fn routed_distances_replace_geometric_ones() {
        let matrix = Arc::new(MockMatrix::with_legs(vec![
            leg(2340.0, 420.0),
            leg(15_000.0, 1_500.0),
        ]));
        let ranker = DistanceRanker::new(30.0, Some(matrix.clone()));
        let entries = vec![
            entry(1, "panadol", 5, (30.0600, 31.3270)),
            entry(2, "panadol", 5, (29.9602, 31.2631)),
        ];
        let ranked = ranker.rank(entries, ORIGIN).await;
        assert_eq!(matrix.calls(), 1);
        assert_eq!(ranked[0].distance_km, 2.34);
        assert_eq!(ranked[0].eta_minutes, 7);
        assert_eq!(ranked[1].distance_km, 15.0);
        assert_eq!(ranked[1].eta_minutes, 25);
        assert_eq!(ranker.strategies(), vec!["routed", "geometric"]);
        assert!(ranker.matrix().is_some());
    }

    #[tokio::test]
    async fn routed_order_can_differ_from_straight_line() {
        // Entry 1 is closer as the crow flies but further by road.
        let matrix = Arc::new(MockMatrix::with_legs(vec![
            leg(9_000.0, 900.0),
            leg(4_000.0, 480.0),
        ]));
        let ranker = DistanceRanker::new(30.0, Some(matrix));
        let entries = vec![
            entry(1, "panadol", 5, (30.0600, 31.3270)),
            entry(2, "panadol", 5, (30.0700, 31.3400)),
        ];
        assert_eq!(ids(&ranker.rank(entries, ORIGIN).await), vec![2, 1]);
    }

    #[tokio::test]
    async fn unroutable_element_falls_back_alone() {
        let matrix = Arc::new(MockMatrix::with_legs(vec![leg(2340.0, 420.0), None]));
        let ranker = DistanceRanker::new(30.0, Some(matrix));
        let entries = vec![
            entry(1, "panadol", 5, (30.0600, 31.3270)),
            entry(2, "panadol", 5, (29.9602, 31.2631)),
        ];
        let ranked = ranker.rank(entries, ORIGIN).await;
        assert_eq!(ranked[0].distance_km, 2.34);
        assert_eq!(ranked[1].distance_km, 12.58);
        assert_eq!(ranked[1].eta_minutes, 26);
    }

    #[tokio::test]
    async fn matrix_failure_matches_geometric_ranking() {
        let entries = vec![
            entry(1, "panadol", 5, (29.9602, 31.2631)),
            entry(2, "panadol", 5, (30.0600, 31.3270)),
            entry(3, "panadol", 5, (30.1000, 31.4000)),
        ];
        let failing = Arc::new(MockMatrix::failing());
        let with_failing = DistanceRanker::new(30.0, Some(failing.clone()))
            .rank(entries.clone(), ORIGIN)
            .await;
        let plain = DistanceRanker::new(30.0, None).rank(entries, ORIGIN).await;
        assert_eq!(failing.calls(), 1);
        assert_eq!(with_failing, plain);
    }

    #[tokio::test]
    async fn empty_input_skips_the_matrix() {
        let matrix = Arc::new(MockMatrix::with_legs(vec![]));
        let ranker = DistanceRanker::new(30.0, Some(matrix.clone()));
        assert!(ranker.rank(Vec::new(), ORIGIN).await.is_empty());
        assert_eq!(matrix.calls(), 0);
    }

    #[tokio::test]
    async fn ties_keep_catalog_order() {
        let ranker = DistanceRanker::new(30.0, None);
        let entries = vec![
            entry(7, "panadol", 9, (30.0600, 31.3270)),
            entry(3, "panadol", 2, (30.0600, 31.3270)),
        ];
        assert_eq!(ids(&ranker.rank(entries, ORIGIN).await), vec![7, 3]);
    }

    #[test]
    fn from_config_enables_matrix_only_with_key() {
        let mut config = MedfinderConfig::default();
        let ranker = DistanceRanker::from_config(&config, reqwest::Client::new());
        assert_eq!(ranker.strategies(), vec!["geometric"]);
        assert!(ranker.matrix().is_none());

        config.maps.api_key = Some("maps-key".into());
        let ranker = DistanceRanker::from_config(&config, reqwest::Client::new());
        assert_eq!(ranker.strategies(), vec!["routed", "geometric"]);
        assert!(ranker.matrix().is_some());
    }

    proptest! {
        #[test]
        fn ranking_is_sorted_and_complete(
            points in prop::collection::vec((29.5f64..30.5, 30.8f64..31.8), 0..20)
        ) {
            let entries: Vec<CatalogEntry> = points
                .iter()
                .enumerate()
                .map(|(i, at)| entry(i as i64, "panadol", 1, *at))
                .collect();
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let ranked = runtime.block_on(DistanceRanker::new(30.0, None).rank(entries, ORIGIN));

            prop_assert_eq!(ranked.len(), points.len());
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].distance_km <= pair[1].distance_km);
            }
        }
    }
}
