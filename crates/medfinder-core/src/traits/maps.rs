// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External mapping API contract.

use async_trait::async_trait;

use crate::error::MedfinderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{RouteLeg, UserLocation};

/// Driving distance matrix from one origin to many destinations.
#[async_trait]
pub trait DistanceMatrixAdapter: PluginAdapter {
    /// Returns one element per destination, in order.
    ///
    /// `None` marks an element the service could not route. A transport failure
    /// or a non-OK batch status is an `Err`.
    async fn driving_matrix(
        &self,
        origin: UserLocation,
        destinations: &[UserLocation],
    ) -> Result<Vec<Option<RouteLeg>>, MedfinderError>;
}
