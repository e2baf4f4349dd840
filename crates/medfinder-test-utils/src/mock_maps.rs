// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Distance matrix double.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use medfinder_core::{
    AdapterType, DistanceMatrixAdapter, HealthStatus, MedfinderError, PluginAdapter, RouteLeg,
    UserLocation,
};

enum Behaviour {
    Legs(Vec<Option<RouteLeg>>),
    Fail,
}

pub struct MockMatrix {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl MockMatrix {
    /// Answers with `legs`, truncated or padded with `None` to the destination count.
    pub fn with_legs(legs: Vec<Option<RouteLeg>>) -> Self {
        Self {
            behaviour: Behaviour::Legs(legs),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every call, like a non-OK batch status.
    pub fn failing() -> Self {
        Self {
            behaviour: Behaviour::Fail,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockMatrix {
    fn name(&self) -> &str {
        "mock-matrix"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Maps
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl DistanceMatrixAdapter for MockMatrix {
    async fn driving_matrix(
        &self,
        _origin: UserLocation,
        destinations: &[UserLocation],
    ) -> Result<Vec<Option<RouteLeg>>, MedfinderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Fail => Err(MedfinderError::service(
                "distance-matrix",
                "status REQUEST_DENIED",
            )),
            Behaviour::Legs(legs) => {
                let mut legs = legs.clone();
                legs.resize(destinations.len(), None);
                Ok(legs)
            }
        }
    }
}
