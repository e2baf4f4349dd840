// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional last-known-location memory.

use async_trait::async_trait;

use crate::error::MedfinderError;
use crate::types::UserLocation;

/// Remembers the last location each user shared.
///
/// Only wired in when enabled in configuration; without it the pipeline asks
/// for a location on every message that lacks one.
#[async_trait]
pub trait LocationStore: Send + Sync + 'static {
    async fn get(&self, user: &str) -> Result<Option<UserLocation>, MedfinderError>;

    async fn put(&self, user: &str, location: UserLocation) -> Result<(), MedfinderError>;
}
