// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Medfinder integration tests.
//!
//! Provides in-memory doubles for every external collaborator so pipeline
//! tests are fast, deterministic, and runnable without network access.
//!
//! # Components
//!
//! - [`MockChannel`] - captures every outbound send and serves canned media
//! - [`InMemoryCatalog`] - catalog with per-tier call counters
//! - [`MockOcr`] / [`MockStt`] - scripted engines
//! - [`MockMatrix`] - distance matrix that answers fixed legs or fails
//! - [`MockQueue`] - in-memory work queue
//! - [`fixtures`] - builders for messages and catalog rows

pub mod fixtures;
pub mod mock_catalog;
pub mod mock_channel;
pub mod mock_maps;
pub mod mock_media;
pub mod mock_queue;

pub use mock_catalog::InMemoryCatalog;
pub use mock_channel::{MockChannel, Sent};
pub use mock_maps::MockMatrix;
pub use mock_media::{MockOcr, MockStt, Scripted};
pub use mock_queue::MockQueue;
