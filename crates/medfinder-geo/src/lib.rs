// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geographic ranking for the Medfinder pipeline.
//!
//! - [`DistanceRanker`] annotates catalog entries with distance and ETA and
//!   sorts them nearest first.
//! - [`GoogleDistanceMatrix`] is the routed driving-distance backend.
//! - [`StaticMap`] builds the results map image URL.

pub mod haversine;
pub mod matrix;
pub mod ranker;
pub mod static_map;

pub use haversine::{eta_minutes, haversine_km, round2};
pub use matrix::GoogleDistanceMatrix;
pub use ranker::DistanceRanker;
pub use static_map::StaticMap;
